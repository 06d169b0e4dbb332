use std::sync::Arc;

use engine::{AllowanceRate, DiskReceiptStore, Engine};
use migration::{Migrator, MigratorTrait};
use server::{ServerConfig, TokenSigner};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "travel_expenses={level},server={level},engine={level},tower_http={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.app.database).await?;

    let rate = match &settings.allowance {
        Some(allowance) => AllowanceRate::new(allowance.rate_per_km_minor)?,
        None => AllowanceRate::default(),
    };
    let receipts = DiskReceiptStore::new(
        settings.receipts.dir.clone(),
        settings.receipts.public_path.clone(),
    );
    let engine = Engine::builder()
        .database(db)
        .allowance_rate(rate)
        .receipt_store(Arc::new(receipts))
        .build()
        .await?;

    let tokens = TokenSigner::new(
        &settings.auth.jwt_secret,
        chrono::Duration::hours(settings.auth.token_ttl_hours),
    );

    let bind = settings
        .server
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let config = ServerConfig {
        bind_addr: format!("{}:{}", bind, settings.server.port),
        receipts_dir: Some(settings.receipts.dir.into()),
        receipts_path: settings.receipts.public_path,
        ..ServerConfig::default()
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    server::run_with_listener(engine, tokens, config, listener).await?;

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}
