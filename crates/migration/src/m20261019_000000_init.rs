//! Initial schema.
//!
//! - `accounts`: employees and administrators
//! - `journeys`: logged trips with their denormalized totals
//! - `expenses`: reimbursement claims, optionally attached to a journey
//! - `invite_tokens`: single-use registration credentials
//! - `bulk_approvals`: one audit row per bulk sweep

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Email,
    PasswordHash,
    Name,
    Role,
    Status,
    IsRegistered,
    CreatedAt,
}

#[derive(Iden)]
enum Journeys {
    Table,
    Id,
    OwnerId,
    Purpose,
    Origin,
    Destination,
    TravelDate,
    DistanceKm,
    DurationMinutes,
    Status,
    TotalCostMinor,
    ExpectedAmountMinor,
    VarianceMinor,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    OwnerId,
    JourneyId,
    AmountMinor,
    Category,
    Description,
    Receipt,
    Status,
    OccurredAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum InviteTokens {
    Table,
    Id,
    Email,
    Role,
    Token,
    TempPasswordHash,
    Used,
    ExpiresAt,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum BulkApprovals {
    Table,
    Id,
    AdminId,
    VariancePercent,
    ApprovedCount,
    RejectedCount,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Accounts::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Accounts::Name).string())
                    .col(
                        ColumnDef::new(Accounts::Role)
                            .string()
                            .not_null()
                            .default("user"),
                    )
                    .col(
                        ColumnDef::new(Accounts::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Accounts::IsRegistered)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Accounts::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Journeys
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Journeys::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Journeys::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Journeys::OwnerId).string().not_null())
                    .col(ColumnDef::new(Journeys::Purpose).string().not_null())
                    .col(ColumnDef::new(Journeys::Origin).string().not_null())
                    .col(ColumnDef::new(Journeys::Destination).string().not_null())
                    .col(ColumnDef::new(Journeys::TravelDate).timestamp().not_null())
                    .col(ColumnDef::new(Journeys::DistanceKm).double().not_null())
                    .col(
                        ColumnDef::new(Journeys::DurationMinutes)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Journeys::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Journeys::TotalCostMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Journeys::ExpectedAmountMinor).big_integer())
                    .col(
                        ColumnDef::new(Journeys::VarianceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Journeys::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Journeys::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-journeys-owner_id")
                            .from(Journeys::Table, Journeys::OwnerId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journeys-owner_id-created_at")
                    .table(Journeys::Table)
                    .col(Journeys::OwnerId)
                    .col(Journeys::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Expenses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenses::OwnerId).string().not_null())
                    .col(ColumnDef::new(Expenses::JourneyId).string())
                    .col(ColumnDef::new(Expenses::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Expenses::Category).string().not_null())
                    .col(ColumnDef::new(Expenses::Description).string())
                    .col(ColumnDef::new(Expenses::Receipt).string())
                    .col(
                        ColumnDef::new(Expenses::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Expenses::OccurredAt).timestamp().not_null())
                    .col(ColumnDef::new(Expenses::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Expenses::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-owner_id")
                            .from(Expenses::Table, Expenses::OwnerId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-journey_id")
                            .from(Expenses::Table, Expenses::JourneyId)
                            .to(Journeys::Table, Journeys::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-journey_id")
                    .table(Expenses::Table)
                    .col(Expenses::JourneyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-status")
                    .table(Expenses::Table)
                    .col(Expenses::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Invite tokens
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(InviteTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InviteTokens::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InviteTokens::Email).string().not_null())
                    .col(ColumnDef::new(InviteTokens::Role).string().not_null())
                    .col(
                        ColumnDef::new(InviteTokens::Token)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(InviteTokens::TempPasswordHash)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InviteTokens::Used)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(InviteTokens::ExpiresAt).timestamp().not_null())
                    .col(ColumnDef::new(InviteTokens::CreatedBy).string().not_null())
                    .col(ColumnDef::new(InviteTokens::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-invite_tokens-email-used")
                    .table(InviteTokens::Table)
                    .col(InviteTokens::Email)
                    .col(InviteTokens::Used)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Bulk approvals
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BulkApprovals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BulkApprovals::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BulkApprovals::AdminId).string().not_null())
                    .col(
                        ColumnDef::new(BulkApprovals::VariancePercent)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BulkApprovals::ApprovedCount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BulkApprovals::RejectedCount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BulkApprovals::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BulkApprovals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(InviteTokens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Journeys::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}
