use chrono::Utc;
use sea_orm::{ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Journey, JourneyNew, JourneyStatus, JourneyUpdate, Money, Principal, ResultEngine,
    expenses, journeys,
    journeys::journey_variance,
    util::{normalize_required_text, validate_distance, validate_duration},
};

use super::{Engine, with_tx};

/// Page size used when the caller does not ask for one.
pub(super) const DEFAULT_JOURNEY_LIMIT: u64 = 50;

fn validate_expected(expected: Option<Money>) -> ResultEngine<Option<Money>> {
    match expected {
        Some(amount) if amount.minor() < 0 => Err(EngineError::InvalidArgument(
            "expected amount must be >= 0".to_string(),
        )),
        other => Ok(other),
    }
}

impl Engine {
    /// Log a new journey for the caller.
    ///
    /// The journey starts `pending` with no expenses: `total_cost` is 0 and
    /// `variance` is `-expected_amount` (0 when no expected amount is given).
    pub async fn create_journey(&self, principal: &Principal, cmd: JourneyNew) -> ResultEngine<Journey> {
        let purpose = normalize_required_text(&cmd.purpose, "purpose")?;
        let origin = normalize_required_text(&cmd.origin, "origin")?;
        let destination = normalize_required_text(&cmd.destination, "destination")?;
        let distance_km = validate_distance(cmd.distance_km)?;
        let duration_minutes = validate_duration(cmd.duration_minutes)?;
        let expected = validate_expected(cmd.expected_amount)?;

        let now = Utc::now();
        let id = Uuid::new_v4();
        with_tx!(self, |db_tx| {
            let model = journeys::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                owner_id: ActiveValue::Set(principal.account_id.to_string()),
                purpose: ActiveValue::Set(purpose),
                origin: ActiveValue::Set(origin),
                destination: ActiveValue::Set(destination),
                travel_date: ActiveValue::Set(cmd.travel_date.unwrap_or(now)),
                distance_km: ActiveValue::Set(distance_km),
                duration_minutes: ActiveValue::Set(duration_minutes),
                status: ActiveValue::Set(JourneyStatus::Pending.as_str().to_string()),
                total_cost_minor: ActiveValue::Set(0),
                expected_amount_minor: ActiveValue::Set(expected.map(Money::minor)),
                variance_minor: ActiveValue::Set(journey_variance(Money::ZERO, expected).minor()),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!("account {} logged journey {id}", principal.account_id);
            Journey::from_model(model, Vec::new())
        })
    }

    /// The caller's journeys, newest first.
    pub async fn journeys(&self, principal: &Principal, limit: Option<u64>) -> ResultEngine<Vec<Journey>> {
        let limit = limit.unwrap_or(DEFAULT_JOURNEY_LIMIT).max(1);
        with_tx!(self, |db_tx| {
            let models = journeys::Entity::find()
                .filter(journeys::Column::OwnerId.eq(principal.account_id.to_string()))
                .order_by_desc(journeys::Column::CreatedAt)
                .order_by_desc(journeys::Column::Id)
                .limit(limit)
                .all(&db_tx)
                .await?;

            let ids: Vec<String> = models.iter().map(|m| m.id.clone()).collect();
            let mut expense_ids = self.expense_ids_by_journey(&db_tx, &ids).await?;
            models
                .into_iter()
                .map(|model| {
                    let ids = expense_ids.remove(&model.id).unwrap_or_default();
                    Journey::from_model(model, ids)
                })
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// A journey visible to the caller.
    pub async fn journey(&self, principal: &Principal, journey_id: Uuid) -> ResultEngine<Journey> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_journey_visible(&db_tx, journey_id, principal)
                .await?;
            self.journey_from_model(&db_tx, model).await
        })
    }

    /// Patch a journey and recompute its aggregates.
    ///
    /// Changing the distance without an explicit expected amount clears the
    /// stored expected amount, so it is derived again from the new distance.
    pub async fn update_journey(
        &self,
        principal: &Principal,
        journey_id: Uuid,
        cmd: JourneyUpdate,
    ) -> ResultEngine<Journey> {
        if cmd.is_empty() {
            return Err(EngineError::InvalidArgument(
                "nothing to update".to_string(),
            ));
        }
        let purpose = cmd
            .purpose
            .as_deref()
            .map(|v| normalize_required_text(v, "purpose"))
            .transpose()?;
        let origin = cmd
            .origin
            .as_deref()
            .map(|v| normalize_required_text(v, "origin"))
            .transpose()?;
        let destination = cmd
            .destination
            .as_deref()
            .map(|v| normalize_required_text(v, "destination"))
            .transpose()?;
        let distance_km = cmd.distance_km.map(validate_distance).transpose()?;
        let duration_minutes = cmd.duration_minutes.map(validate_duration).transpose()?;
        let expected = validate_expected(cmd.expected_amount)?;

        with_tx!(self, |db_tx| {
            let model = self
                .require_journey_visible(&db_tx, journey_id, principal)
                .await?;
            let distance_changed = distance_km.is_some_and(|d| d != model.distance_km);

            let mut active: journeys::ActiveModel = model.into();
            if let Some(purpose) = purpose {
                active.purpose = ActiveValue::Set(purpose);
            }
            if let Some(origin) = origin {
                active.origin = ActiveValue::Set(origin);
            }
            if let Some(destination) = destination {
                active.destination = ActiveValue::Set(destination);
            }
            if let Some(travel_date) = cmd.travel_date {
                active.travel_date = ActiveValue::Set(travel_date);
            }
            if let Some(distance_km) = distance_km {
                active.distance_km = ActiveValue::Set(distance_km);
            }
            if let Some(duration_minutes) = duration_minutes {
                active.duration_minutes = ActiveValue::Set(duration_minutes);
            }
            match expected {
                Some(expected) => {
                    active.expected_amount_minor = ActiveValue::Set(Some(expected.minor()));
                }
                None if distance_changed => {
                    active.expected_amount_minor = ActiveValue::Set(None);
                }
                None => {}
            }
            active.updated_at = ActiveValue::Set(Utc::now());
            active.update(&db_tx).await?;

            let refreshed = self
                .refresh_journey_totals(&db_tx, &journey_id.to_string())
                .await?;
            self.journey_from_model(&db_tx, refreshed).await
        })
    }

    /// Delete a journey without expenses.
    pub async fn delete_journey(&self, principal: &Principal, journey_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_journey_visible(&db_tx, journey_id, principal)
                .await?;

            let attached = expenses::Entity::find()
                .filter(expenses::Column::JourneyId.eq(model.id.clone()))
                .count(&db_tx)
                .await?;
            if attached > 0 {
                return Err(EngineError::InvalidState(format!(
                    "journey has {attached} expenses"
                )));
            }

            journeys::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            tracing::info!("journey {journey_id} deleted by {}", principal.account_id);
            Ok(())
        })
    }
}
