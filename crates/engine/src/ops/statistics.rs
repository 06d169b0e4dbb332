use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sea_orm::{PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};

use crate::{
    EngineError, Expense, ExpenseStatus, Money, Principal, ResultEngine, expenses, journeys,
};

use super::{Engine, with_tx};

/// Number of latest expenses shown on a dashboard.
const RECENT_ACTIVITY: u64 = 5;

/// Figures for the caller's journeys travelled in the current month.
#[derive(Clone, Debug, PartialEq)]
pub struct UserSummary {
    pub journeys: u64,
    pub total_distance_km: f64,
    pub total_minutes: i64,
    /// `total_minutes / 60`, two decimals.
    pub total_hours: f64,
    /// Allowance for the month's total distance.
    pub expected_amount: Money,
    pub expense_total: Money,
    pub pending_expenses: u64,
    /// Latest expenses attached to the month's journeys, newest first.
    pub recent_activity: Vec<Expense>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AdminOverview {
    pub total_journeys: u64,
    pub expense_total: Money,
    pub pending_approvals: u64,
}

/// `[first day of the month, first day of the next month)` around `now`.
fn month_bounds(now: DateTime<Utc>) -> ResultEngine<(DateTime<Utc>, DateTime<Utc>)> {
    let (year, month) = (now.year(), now.month());
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| EngineError::Internal("invalid month start".to_string()))?;
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| EngineError::Internal("invalid month end".to_string()))?;
    Ok((start.and_utc(), end.and_utc()))
}

fn sum_amounts(models: &[expenses::Model]) -> ResultEngine<Money> {
    models.iter().try_fold(Money::ZERO, |acc, m| {
        acc.checked_add(Money::new(m.amount_minor))
            .ok_or_else(|| EngineError::InvalidArgument("expense total overflows".to_string()))
    })
}

impl Engine {
    /// Monthly dashboard of the caller.
    pub async fn user_summary(&self, principal: &Principal) -> ResultEngine<UserSummary> {
        let (start, end) = month_bounds(Utc::now())?;
        let owner_id = principal.account_id.to_string();
        with_tx!(self, |db_tx| {
            let journey_models = journeys::Entity::find()
                .filter(journeys::Column::OwnerId.eq(owner_id.clone()))
                .filter(journeys::Column::TravelDate.gte(start))
                .filter(journeys::Column::TravelDate.lt(end))
                .all(&db_tx)
                .await?;

            let (total_distance_km, total_minutes) = journey_models
                .iter()
                .fold((0.0_f64, 0_i64), |acc, j| {
                    (acc.0 + j.distance_km, acc.1 + j.duration_minutes)
                });
            let journey_ids: Vec<String> = journey_models.iter().map(|j| j.id.clone()).collect();

            let expense_models = if journey_ids.is_empty() {
                Vec::new()
            } else {
                expenses::Entity::find()
                    .filter(expenses::Column::JourneyId.is_in(journey_ids))
                    .order_by_desc(expenses::Column::CreatedAt)
                    .order_by_desc(expenses::Column::Id)
                    .all(&db_tx)
                    .await?
            };
            let expense_total = sum_amounts(&expense_models)?;
            let recent_activity = expense_models
                .into_iter()
                .take(RECENT_ACTIVITY as usize)
                .map(Expense::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            let pending_expenses = expenses::Entity::find()
                .filter(expenses::Column::OwnerId.eq(owner_id.clone()))
                .filter(expenses::Column::Status.is_in(
                    ExpenseStatus::awaiting_review().map(|s| s.as_str().to_string()),
                ))
                .count(&db_tx)
                .await?;

            Ok(UserSummary {
                journeys: journey_models.len() as u64,
                total_distance_km,
                total_minutes,
                total_hours: (total_minutes as f64 / 60.0 * 100.0).round() / 100.0,
                expected_amount: self.allowance.expected_amount(total_distance_km),
                expense_total,
                pending_expenses,
                recent_activity,
            })
        })
    }

    /// Totals across every account.
    ///
    /// Authorization: administrators only.
    pub async fn admin_overview(&self, principal: &Principal) -> ResultEngine<AdminOverview> {
        self.require_admin(principal)?;
        with_tx!(self, |db_tx| {
            let total_journeys = journeys::Entity::find().count(&db_tx).await?;
            let amounts: Vec<i64> = expenses::Entity::find()
                .select_only()
                .column(expenses::Column::AmountMinor)
                .into_tuple()
                .all(&db_tx)
                .await?;
            let expense_total = amounts.into_iter().try_fold(Money::ZERO, |acc, minor| {
                acc.checked_add(Money::new(minor))
                    .ok_or_else(|| EngineError::InvalidArgument("expense total overflows".to_string()))
            })?;
            let pending_approvals = expenses::Entity::find()
                .filter(expenses::Column::Status.is_in(
                    ExpenseStatus::awaiting_review().map(|s| s.as_str().to_string()),
                ))
                .count(&db_tx)
                .await?;

            Ok(AdminOverview {
                total_journeys,
                expense_total,
                pending_approvals,
            })
        })
    }
}
