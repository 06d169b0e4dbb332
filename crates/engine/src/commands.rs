//! Command structs for engine operations.
//!
//! These types group parameters for write operations on journeys, expenses
//! and registrations, keeping call sites readable and avoiding long argument
//! lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{ExpenseCategory, ExpenseStatus, Money, ReceiptUpload};

/// Create a journey.
#[derive(Clone, Debug)]
pub struct JourneyNew {
    pub purpose: String,
    pub origin: String,
    pub destination: String,
    pub travel_date: Option<DateTime<Utc>>,
    pub distance_km: f64,
    pub duration_minutes: i64,
    pub expected_amount: Option<Money>,
}

impl JourneyNew {
    #[must_use]
    pub fn new(
        purpose: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
        distance_km: f64,
        duration_minutes: i64,
    ) -> Self {
        Self {
            purpose: purpose.into(),
            origin: origin.into(),
            destination: destination.into(),
            travel_date: None,
            distance_km,
            duration_minutes,
            expected_amount: None,
        }
    }

    #[must_use]
    pub fn travel_date(mut self, travel_date: DateTime<Utc>) -> Self {
        self.travel_date = Some(travel_date);
        self
    }

    #[must_use]
    pub fn expected_amount(mut self, expected_amount: Money) -> Self {
        self.expected_amount = Some(expected_amount);
        self
    }
}

/// Partial update of a journey; `None` leaves a field untouched.
#[derive(Clone, Debug, Default)]
pub struct JourneyUpdate {
    pub purpose: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub travel_date: Option<DateTime<Utc>>,
    pub distance_km: Option<f64>,
    pub duration_minutes: Option<i64>,
    pub expected_amount: Option<Money>,
}

impl JourneyUpdate {
    pub fn is_empty(&self) -> bool {
        self.purpose.is_none()
            && self.origin.is_none()
            && self.destination.is_none()
            && self.travel_date.is_none()
            && self.distance_km.is_none()
            && self.duration_minutes.is_none()
            && self.expected_amount.is_none()
    }
}

/// Create an expense, optionally against a journey and with a receipt.
#[derive(Clone, Debug)]
pub struct ExpenseNew {
    pub journey_id: Option<Uuid>,
    pub amount: Money,
    pub category: ExpenseCategory,
    pub description: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub receipt: Option<ReceiptUpload>,
}

impl ExpenseNew {
    #[must_use]
    pub fn new(amount: Money, category: ExpenseCategory) -> Self {
        Self {
            journey_id: None,
            amount,
            category,
            description: None,
            occurred_at: None,
            receipt: None,
        }
    }

    #[must_use]
    pub fn journey(mut self, journey_id: Uuid) -> Self {
        self.journey_id = Some(journey_id);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn receipt(mut self, receipt: ReceiptUpload) -> Self {
        self.receipt = Some(receipt);
        self
    }
}

/// Partial update of an expense; the parent journey cannot change.
#[derive(Clone, Debug, Default)]
pub struct ExpenseUpdate {
    pub amount: Option<Money>,
    pub category: Option<ExpenseCategory>,
    pub description: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub receipt: Option<ReceiptUpload>,
}

/// Filters for listing one's expenses.
#[derive(Clone, Debug, Default)]
pub struct ExpenseFilter {
    pub journey_id: Option<Uuid>,
    pub status: Option<ExpenseStatus>,
}

/// Complete a registration with an invite.
#[derive(Clone, Debug)]
pub struct RegisterCmd {
    pub email: String,
    pub token: String,
    pub temp_password: String,
    pub new_password: String,
    pub name: String,
}
