use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, prelude::*};

use crate::{EngineError, Money, ResultEngine, expenses, journeys, journeys::journey_variance};

use super::Engine;

impl Engine {
    /// Recompute the aggregates of one journey from its stored expenses.
    ///
    /// `total_cost` becomes the sum of the expense amounts and `variance` is
    /// `total_cost - expected_amount`. When the journey has expenses but no
    /// expected amount yet, the expected amount is filled from the distance and
    /// the configured rate.
    ///
    /// Must run inside the caller's transaction.
    pub(super) async fn refresh_journey_totals(
        &self,
        db_tx: &DatabaseTransaction,
        journey_id: &str,
    ) -> ResultEngine<journeys::Model> {
        let journey = journeys::Entity::find_by_id(journey_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("journey not exists".to_string()))?;

        let rows = expenses::Entity::find()
            .filter(expenses::Column::JourneyId.eq(journey_id.to_string()))
            .all(db_tx)
            .await?;

        let mut total_cost = Money::ZERO;
        for row in &rows {
            total_cost = total_cost
                .checked_add(Money::new(row.amount_minor))
                .ok_or_else(|| EngineError::InvalidArgument("journey total overflows".to_string()))?;
        }

        let mut expected = journey
            .expected_amount_minor
            .filter(|minor| *minor != 0)
            .map(Money::new);
        if expected.is_none() && !rows.is_empty() {
            expected = Some(self.allowance.expected_amount(journey.distance_km));
        }
        let variance = journey_variance(total_cost, expected);

        let unchanged = journey.total_cost_minor == total_cost.minor()
            && journey.variance_minor == variance.minor()
            && journey.expected_amount_minor.map(Money::new) == expected;
        if unchanged {
            return Ok(journey);
        }

        let mut active: journeys::ActiveModel = journey.into();
        active.total_cost_minor = ActiveValue::Set(total_cost.minor());
        active.expected_amount_minor = ActiveValue::Set(expected.map(Money::minor));
        active.variance_minor = ActiveValue::Set(variance.minor());
        active.updated_at = ActiveValue::Set(Utc::now());
        let updated = active.update(db_tx).await?;

        tracing::debug!(
            "journey {journey_id} totals: total={total_cost} variance={variance} ({} expenses)",
            rows.len()
        );
        Ok(updated)
    }
}
