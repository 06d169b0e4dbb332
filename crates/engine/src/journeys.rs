//! The module contains `Journey`, one reimbursable trip, and its table.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyStatus {
    Pending,
    Approved,
    Completed,
    Rejected,
}

impl JourneyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }
}

impl TryFrom<&str> for JourneyStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            other => Err(EngineError::InvalidArgument(format!(
                "invalid journey status: {other}"
            ))),
        }
    }
}

/// A logged trip.
///
/// `total_cost` and `variance` are derived: the ledger rewrites them after
/// every expense mutation, so `total_cost` is always the sum of the journey's
/// expenses and `variance == total_cost - expected_amount`.
#[derive(Clone, Debug, PartialEq)]
pub struct Journey {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub purpose: String,
    pub origin: String,
    pub destination: String,
    pub travel_date: DateTime<Utc>,
    pub distance_km: f64,
    pub duration_minutes: i64,
    pub status: JourneyStatus,
    pub total_cost: Money,
    /// `None` until set by the owner or filled from the distance when the
    /// first expense is attached.
    pub expected_amount: Option<Money>,
    pub variance: Money,
    /// Expense ids in creation order.
    pub expense_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "journeys")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub purpose: String,
    pub origin: String,
    pub destination: String,
    pub travel_date: DateTimeUtc,
    pub distance_km: f64,
    pub duration_minutes: i64,
    pub status: String,
    pub total_cost_minor: i64,
    pub expected_amount_minor: Option<i64>,
    pub variance_minor: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::OwnerId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Owner,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Journey {
    pub(crate) fn from_model(model: Model, expense_ids: Vec<Uuid>) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "journey")?,
            owner_id: parse_uuid(&model.owner_id, "account")?,
            purpose: model.purpose,
            origin: model.origin,
            destination: model.destination,
            travel_date: model.travel_date,
            distance_km: model.distance_km,
            duration_minutes: model.duration_minutes,
            status: JourneyStatus::try_from(model.status.as_str())?,
            total_cost: Money::new(model.total_cost_minor),
            expected_amount: model.expected_amount_minor.map(Money::new),
            variance: Money::new(model.variance_minor),
            expense_ids,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Variance of a journey: total cost minus the expected amount (0 when unset).
pub(crate) fn journey_variance(total_cost: Money, expected_amount: Option<Money>) -> Money {
    total_cost - expected_amount.unwrap_or(Money::ZERO)
}
