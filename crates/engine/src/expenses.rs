//! The module contains `Expense`, a single reimbursement claim, and its table.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    Pending,
    Submitted,
    Approved,
    Rejected,
}

impl ExpenseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Approved and rejected expenses cannot change any more.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Statuses waiting for an administrator decision.
    pub fn awaiting_review() -> [ExpenseStatus; 2] {
        [Self::Pending, Self::Submitted]
    }
}

impl TryFrom<&str> for ExpenseStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "submitted" => Ok(Self::Submitted),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(EngineError::InvalidArgument(format!(
                "invalid expense status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Fuel,
    Food,
    Accommodation,
    Parking,
    Miscellaneous,
}

impl ExpenseCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fuel => "fuel",
            Self::Food => "food",
            Self::Accommodation => "accommodation",
            Self::Parking => "parking",
            Self::Miscellaneous => "miscellaneous",
        }
    }
}

impl TryFrom<&str> for ExpenseCategory {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "fuel" => Ok(Self::Fuel),
            "food" => Ok(Self::Food),
            "accommodation" => Ok(Self::Accommodation),
            "parking" => Ok(Self::Parking),
            "miscellaneous" | "misc" => Ok(Self::Miscellaneous),
            other => Err(EngineError::InvalidArgument(format!(
                "invalid expense category: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expense {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub journey_id: Option<Uuid>,
    pub amount: Money,
    pub category: ExpenseCategory,
    pub description: Option<String>,
    /// Opaque handle returned by the receipt store.
    pub receipt: Option<String>,
    pub status: ExpenseStatus,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub journey_id: Option<String>,
    pub amount_minor: i64,
    pub category: String,
    pub description: Option<String>,
    pub receipt: Option<String>,
    pub status: String,
    pub occurred_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::journeys::Entity",
        from = "Column::JourneyId",
        to = "super::journeys::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Journey,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::OwnerId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Owner,
}

impl Related<super::journeys::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Journey.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "expense")?,
            owner_id: parse_uuid(&model.owner_id, "account")?,
            journey_id: model
                .journey_id
                .as_deref()
                .map(|id| parse_uuid(id, "journey"))
                .transpose()?,
            amount: Money::new(model.amount_minor),
            category: ExpenseCategory::try_from(model.category.as_str())?,
            description: model.description,
            receipt: model.receipt,
            status: ExpenseStatus::try_from(model.status.as_str())?,
            occurred_at: model.occurred_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Amounts must be strictly positive.
pub(crate) fn validate_amount(amount: Money) -> ResultEngine<Money> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidArgument(
            "amount must be > 0".to_string(),
        ));
    }
    Ok(amount)
}
