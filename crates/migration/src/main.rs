use clap::{Parser, Subcommand};
use sea_orm::Database;
use sea_orm_migration::prelude::*;

/// Apply or roll back the travel expense schema.
#[derive(Parser, Debug)]
#[command(name = "migration")]
struct Cli {
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./travel_expenses.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Option<MigrationCommand>,
}

#[derive(Subcommand, Debug)]
enum MigrationCommand {
    /// Apply pending migrations (default).
    Up {
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Roll back applied migrations; one step unless told otherwise.
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Drop every table and reapply all migrations.
    Fresh,
    /// Roll back everything.
    Reset,
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let db = Database::connect(&cli.database_url).await?;

    match cli.command.unwrap_or(MigrationCommand::Up { steps: None }) {
        MigrationCommand::Up { steps } => migration::Migrator::up(&db, steps).await?,
        MigrationCommand::Down { steps } => migration::Migrator::down(&db, Some(steps)).await?,
        MigrationCommand::Fresh => migration::Migrator::fresh(&db).await?,
        MigrationCommand::Reset => migration::Migrator::reset(&db).await?,
        MigrationCommand::Status => migration::Migrator::status(&db).await?,
    }

    Ok(())
}
