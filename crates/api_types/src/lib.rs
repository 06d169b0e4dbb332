//! JSON bodies exchanged with the HTTP API.
//!
//! Field names are camelCase on the wire. Money is always an integer amount of
//! minor units (cents) in fields ending with `Minor`.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generic acknowledgement.
#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Register {
        pub email: String,
        pub token: String,
        pub temp_password: String,
        pub new_password: String,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AccountView {
        pub id: Uuid,
        pub email: String,
        pub name: Option<String>,
        /// `user`, `admin` or `super_admin`.
        pub role: String,
        /// `active` or `inactive`.
        pub status: String,
        pub is_registered: bool,
        pub created_at: DateTime<Utc>,
    }

    /// Bearer token plus the account it was issued for.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Session {
        pub token: String,
        pub account: AccountView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountStatusUpdate {
        pub active: bool,
    }
}

pub mod journey {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct JourneyNew {
        pub purpose: String,
        pub origin: String,
        pub destination: String,
        /// RFC3339 timestamp; the server uses now() when absent.
        pub travel_date: Option<DateTime<FixedOffset>>,
        pub distance_km: f64,
        pub duration_minutes: i64,
        pub expected_amount_minor: Option<i64>,
    }

    /// Partial update; absent fields are left untouched.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct JourneyUpdate {
        pub purpose: Option<String>,
        pub origin: Option<String>,
        pub destination: Option<String>,
        pub travel_date: Option<DateTime<FixedOffset>>,
        pub distance_km: Option<f64>,
        pub duration_minutes: Option<i64>,
        pub expected_amount_minor: Option<i64>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct JourneyListQuery {
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct JourneyView {
        pub id: Uuid,
        pub owner_id: Uuid,
        pub purpose: String,
        pub origin: String,
        pub destination: String,
        pub travel_date: DateTime<Utc>,
        pub distance_km: f64,
        pub duration_minutes: i64,
        pub status: String,
        pub total_cost_minor: i64,
        pub expected_amount_minor: Option<i64>,
        pub variance_minor: i64,
        pub expense_ids: Vec<Uuid>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod expense {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseListQuery {
        pub journey_id: Option<Uuid>,
        pub status: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseView {
        pub id: Uuid,
        pub owner_id: Uuid,
        pub journey_id: Option<Uuid>,
        pub amount_minor: i64,
        pub category: String,
        pub description: Option<String>,
        /// Path the receipt can be downloaded from.
        pub receipt: Option<String>,
        pub status: String,
        pub occurred_at: DateTime<Utc>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod approval {
    use super::*;

    use crate::{expense::ExpenseView, journey::JourneyView};

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PendingApproval {
        pub expense: ExpenseView,
        pub journey: Option<JourneyView>,
    }

    /// `variancePercent` may be a number or a numeric string; absent means 10.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BulkApprovalRequest {
        pub variance_percent: Option<serde_json::Value>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BulkApprovalItem {
        pub id: Uuid,
        pub journey_id: Option<Uuid>,
        pub amount_minor: i64,
        pub expected_minor: i64,
        /// Percentage, two decimals.
        pub variance: f64,
        /// `approved` or `rejected`.
        pub action: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BulkApprovalResponse {
        pub id: Uuid,
        pub variance_percent: f64,
        pub approved: usize,
        pub rejected: usize,
        pub details: Vec<BulkApprovalItem>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Reviewed {
        pub id: Uuid,
        /// `expense` or `journey`.
        pub kind: String,
        pub status: String,
    }
}

pub mod invite {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InviteNew {
        pub email: String,
        /// `user` (default) or `admin`.
        pub role: Option<String>,
    }

    /// Returned once, right after issuing: the only time the temporary
    /// password is visible.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InviteIssued {
        pub email: String,
        pub role: String,
        pub token: String,
        pub temp_password: String,
        pub expires_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InviteView {
        pub id: Uuid,
        pub email: String,
        pub role: String,
        pub token: String,
        pub used: bool,
        pub expires_at: DateTime<Utc>,
        pub created_by: Uuid,
        pub created_at: DateTime<Utc>,
    }
}

pub mod stats {
    use super::*;

    use crate::expense::ExpenseView;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UserDashboard {
        pub total_journeys: u64,
        pub total_distance: f64,
        pub total_minutes: i64,
        pub total_hours: f64,
        pub expected_amount_minor: i64,
        pub expense_total_minor: i64,
        pub pending_expenses: u64,
        pub recent_activity: Vec<ExpenseView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AdminOverview {
        pub total_journeys: u64,
        pub expense_total_minor: i64,
        pub pending_approvals: u64,
    }
}
