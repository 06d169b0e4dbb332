//! Statistics API endpoints

use api_types::stats::{AdminOverview, UserDashboard};
use axum::{Extension, Json, extract::State};
use engine::Principal;

use crate::{ServerError, server::ServerState, views::expense_view};

/// Handle requests for the caller's monthly dashboard
pub async fn dashboard(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
) -> Result<Json<UserDashboard>, ServerError> {
    let summary = state.engine.user_summary(&principal).await?;

    Ok(Json(UserDashboard {
        total_journeys: summary.journeys,
        total_distance: summary.total_distance_km,
        total_minutes: summary.total_minutes,
        total_hours: summary.total_hours,
        expected_amount_minor: summary.expected_amount.minor(),
        expense_total_minor: summary.expense_total.minor(),
        pending_expenses: summary.pending_expenses,
        recent_activity: summary
            .recent_activity
            .into_iter()
            .map(expense_view)
            .collect(),
    }))
}

pub async fn overview(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
) -> Result<Json<AdminOverview>, ServerError> {
    let overview = state.engine.admin_overview(&principal).await?;

    Ok(Json(AdminOverview {
        total_journeys: overview.total_journeys,
        expense_total_minor: overview.expense_total.minor(),
        pending_approvals: overview.pending_approvals,
    }))
}
