use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, Expense, ExpenseStatus, Journey, JourneyStatus, Money, Principal, ResultEngine,
    VarianceDecision, VarianceTolerance,
    allowance::{round_variance, variance_percent},
    bulk_approvals, expenses, journeys,
    util::parse_uuid,
};

use super::{Engine, with_tx};

/// What an administrator approves or rejects one at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalTarget {
    Expense,
    Journey,
}

impl TryFrom<&str> for ApprovalTarget {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "expense" => Ok(Self::Expense),
            "journey" => Ok(Self::Journey),
            other => Err(EngineError::InvalidArgument(format!(
                "invalid approval type: {other}"
            ))),
        }
    }
}

/// An expense waiting for review, with the journey it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingApproval {
    pub expense: Expense,
    pub journey: Option<Journey>,
}

/// One decision taken by the bulk sweep.
#[derive(Clone, Debug, PartialEq)]
pub struct BulkApprovalItem {
    pub expense_id: Uuid,
    pub journey_id: Option<Uuid>,
    pub amount: Money,
    pub expected: Money,
    /// Rounded to two decimals.
    pub variance: f64,
    pub decision: VarianceDecision,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BulkApprovalReport {
    pub id: Uuid,
    pub variance_percent: f64,
    pub approved: usize,
    pub rejected: usize,
    pub details: Vec<BulkApprovalItem>,
}

fn awaiting_review() -> Vec<String> {
    ExpenseStatus::awaiting_review()
        .iter()
        .map(|status| status.as_str().to_string())
        .collect()
}

impl Engine {
    /// All expenses waiting for a decision, newest first.
    ///
    /// Authorization: administrators only.
    pub async fn pending_approvals(&self, principal: &Principal) -> ResultEngine<Vec<PendingApproval>> {
        self.require_admin(principal)?;
        with_tx!(self, |db_tx| {
            let rows = expenses::Entity::find()
                .filter(expenses::Column::Status.is_in(awaiting_review()))
                .find_also_related(journeys::Entity)
                .order_by_desc(expenses::Column::CreatedAt)
                .order_by_desc(expenses::Column::Id)
                .all(&db_tx)
                .await?;

            let journey_ids: Vec<String> = rows
                .iter()
                .filter_map(|(_, journey)| journey.as_ref().map(|j| j.id.clone()))
                .collect();
            let expense_ids = self.expense_ids_by_journey(&db_tx, &journey_ids).await?;

            let mut pending = Vec::with_capacity(rows.len());
            for (expense, journey) in rows {
                let journey = journey
                    .map(|model| {
                        let ids = expense_ids.get(&model.id).cloned().unwrap_or_default();
                        Journey::from_model(model, ids)
                    })
                    .transpose()?;
                pending.push(PendingApproval {
                    expense: Expense::try_from(expense)?,
                    journey,
                });
            }
            Ok(pending)
        })
    }

    /// Approve one expense or journey.
    pub async fn approve_single(
        &self,
        principal: &Principal,
        target: ApprovalTarget,
        id: Uuid,
    ) -> ResultEngine<()> {
        self.review_single(principal, target, id, VarianceDecision::Approved)
            .await
    }

    /// Reject one expense or journey.
    pub async fn reject_single(
        &self,
        principal: &Principal,
        target: ApprovalTarget,
        id: Uuid,
    ) -> ResultEngine<()> {
        self.review_single(principal, target, id, VarianceDecision::Rejected)
            .await
    }

    async fn review_single(
        &self,
        principal: &Principal,
        target: ApprovalTarget,
        id: Uuid,
        decision: VarianceDecision,
    ) -> ResultEngine<()> {
        self.require_admin(principal)?;
        with_tx!(self, |db_tx| {
            match target {
                ApprovalTarget::Expense => {
                    let model = expenses::Entity::find_by_id(id.to_string())
                        .one(&db_tx)
                        .await?
                        .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
                    let status = ExpenseStatus::try_from(model.status.as_str())?;
                    if status.is_terminal() {
                        return Err(EngineError::InvalidState(format!(
                            "expense is already {}",
                            status.as_str()
                        )));
                    }
                    set_expense_status(&db_tx, &model.id, expense_status_for(decision)).await?;
                }
                ApprovalTarget::Journey => {
                    let model = journeys::Entity::find_by_id(id.to_string())
                        .one(&db_tx)
                        .await?
                        .ok_or_else(|| EngineError::KeyNotFound("journey not exists".to_string()))?;
                    let status = match decision {
                        VarianceDecision::Approved => JourneyStatus::Approved,
                        VarianceDecision::Rejected => JourneyStatus::Rejected,
                    };
                    let mut active: journeys::ActiveModel = model.into();
                    active.status = ActiveValue::Set(status.as_str().to_string());
                    active.updated_at = ActiveValue::Set(Utc::now());
                    active.update(&db_tx).await?;
                }
            }

            tracing::info!(
                "admin {} marked {target:?} {id} as {decision:?}",
                principal.account_id
            );
            Ok(())
        })
    }

    /// Decide every reviewable expense against the distance allowance.
    ///
    /// Each expense is compared with `expected_amount(journey distance)`; it
    /// is approved when the absolute variance does not exceed the tolerance
    /// (10% when `tolerance_percent` is `None`) and rejected otherwise.
    ///
    /// The sweep is atomic: every status change and the audit row are written
    /// in one transaction, and each change only applies to an expense that is
    /// still waiting for review. If any of them fails nothing is committed.
    pub async fn bulk_approve_by_variance(
        &self,
        principal: &Principal,
        tolerance_percent: Option<f64>,
    ) -> ResultEngine<BulkApprovalReport> {
        self.require_admin(principal)?;
        let tolerance = match tolerance_percent {
            Some(percent) => VarianceTolerance::new(percent)?,
            None => VarianceTolerance::default(),
        };

        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let rows = expenses::Entity::find()
                .filter(expenses::Column::Status.is_in(awaiting_review()))
                .find_also_related(journeys::Entity)
                .order_by_asc(expenses::Column::CreatedAt)
                .order_by_asc(expenses::Column::Id)
                .all(&db_tx)
                .await?;

            let mut details = Vec::with_capacity(rows.len());
            for (expense, journey) in rows {
                let distance_km = journey.as_ref().map_or(0.0, |j| j.distance_km);
                let amount = Money::new(expense.amount_minor);
                let expected = self.allowance.expected_amount(distance_km);
                let variance = variance_percent(amount, expected);
                let decision = tolerance.decide(amount, expected);

                set_expense_status(&db_tx, &expense.id, expense_status_for(decision)).await?;

                details.push(BulkApprovalItem {
                    expense_id: parse_uuid(&expense.id, "expense")?,
                    journey_id: expense
                        .journey_id
                        .as_deref()
                        .map(|id| parse_uuid(id, "journey"))
                        .transpose()?,
                    amount,
                    expected,
                    variance: round_variance(variance),
                    decision,
                });
            }

            let approved = details
                .iter()
                .filter(|item| item.decision == VarianceDecision::Approved)
                .count();
            let rejected = details.len() - approved;

            let id = Uuid::new_v4();
            bulk_approvals::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                admin_id: ActiveValue::Set(principal.account_id.to_string()),
                variance_percent: ActiveValue::Set(tolerance.percent()),
                approved_count: ActiveValue::Set(approved as i64),
                rejected_count: ActiveValue::Set(rejected as i64),
                created_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(
                "bulk approval {id} by {} at {}%: {approved} approved, {rejected} rejected",
                principal.account_id,
                tolerance.percent()
            );
            Ok(BulkApprovalReport {
                id,
                variance_percent: tolerance.percent(),
                approved,
                rejected,
                details,
            })
        })
    }
}

fn expense_status_for(decision: VarianceDecision) -> ExpenseStatus {
    match decision {
        VarianceDecision::Approved => ExpenseStatus::Approved,
        VarianceDecision::Rejected => ExpenseStatus::Rejected,
    }
}

/// Move one expense out of review, only if nobody decided it meanwhile.
async fn set_expense_status(
    db_tx: &DatabaseTransaction,
    expense_id: &str,
    status: ExpenseStatus,
) -> ResultEngine<()> {
    let result = expenses::Entity::update_many()
        .col_expr(expenses::Column::Status, Expr::value(status.as_str()))
        .col_expr(expenses::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(expenses::Column::Id.eq(expense_id.to_string()))
        .filter(expenses::Column::Status.is_in(awaiting_review()))
        .exec(db_tx)
        .await?;
    if result.rows_affected != 1 {
        return Err(EngineError::InvalidState(format!(
            "expense {expense_id} is no longer awaiting review"
        )));
    }
    Ok(())
}
