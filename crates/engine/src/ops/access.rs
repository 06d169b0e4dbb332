use sea_orm::{DatabaseTransaction, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Principal, ResultEngine, expenses, journeys, util::parse_uuid};

use super::Engine;

/// Generates owner-scoped lookups for a table with an `owner_id` column.
///
/// - `$visible_fn` hides records of other owners behind `KeyNotFound`, as
///   reads do.
/// - `$writable_fn` reports them as `Forbidden`, as writes do.
///
/// Administrators pass both checks.
macro_rules! impl_owned_lookup {
    ($visible_fn:ident, $writable_fn:ident, $entity:path, $model:path, $label:literal) => {
        pub(super) async fn $visible_fn(
            &self,
            db: &DatabaseTransaction,
            id: Uuid,
            principal: &Principal,
        ) -> ResultEngine<$model> {
            let model = <$entity>::find_by_id(id.to_string())
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(concat!($label, " not exists").to_string()))?;
            let owner_id = parse_uuid(&model.owner_id, "account")?;
            if !principal.can_act_for(owner_id) {
                return Err(EngineError::KeyNotFound(
                    concat!($label, " not exists").to_string(),
                ));
            }
            Ok(model)
        }

        pub(super) async fn $writable_fn(
            &self,
            db: &DatabaseTransaction,
            id: Uuid,
            principal: &Principal,
        ) -> ResultEngine<$model> {
            let model = <$entity>::find_by_id(id.to_string())
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(concat!($label, " not exists").to_string()))?;
            let owner_id = parse_uuid(&model.owner_id, "account")?;
            if !principal.can_act_for(owner_id) {
                return Err(EngineError::Forbidden(
                    concat!($label, " belongs to another account").to_string(),
                ));
            }
            Ok(model)
        }
    };
}

impl Engine {
    impl_owned_lookup!(
        require_journey_visible,
        require_journey_writable,
        journeys::Entity,
        journeys::Model,
        "journey"
    );

    impl_owned_lookup!(
        require_expense_visible,
        require_expense_writable,
        expenses::Entity,
        expenses::Model,
        "expense"
    );

    /// Administrative operations accept only `admin` and `super_admin`.
    pub(super) fn require_admin(&self, principal: &Principal) -> ResultEngine<()> {
        if !principal.is_admin() {
            return Err(EngineError::Forbidden("admins only".to_string()));
        }
        Ok(())
    }

    /// Expense ids attached to each journey, in creation order.
    pub(super) async fn expense_ids_by_journey(
        &self,
        db: &DatabaseTransaction,
        journey_ids: &[String],
    ) -> ResultEngine<std::collections::HashMap<String, Vec<Uuid>>> {
        use sea_orm::{QueryFilter, QueryOrder};

        let mut grouped: std::collections::HashMap<String, Vec<Uuid>> =
            std::collections::HashMap::new();
        if journey_ids.is_empty() {
            return Ok(grouped);
        }

        let rows = expenses::Entity::find()
            .filter(expenses::Column::JourneyId.is_in(journey_ids.iter().cloned()))
            .order_by_asc(expenses::Column::CreatedAt)
            .order_by_asc(expenses::Column::Id)
            .all(db)
            .await?;
        for row in rows {
            let Some(journey_id) = row.journey_id else {
                continue;
            };
            grouped
                .entry(journey_id)
                .or_default()
                .push(parse_uuid(&row.id, "expense")?);
        }
        Ok(grouped)
    }

    pub(super) async fn journey_from_model(
        &self,
        db: &DatabaseTransaction,
        model: journeys::Model,
    ) -> ResultEngine<journeys::Journey> {
        let mut ids = self
            .expense_ids_by_journey(db, std::slice::from_ref(&model.id))
            .await?;
        let expense_ids = ids.remove(&model.id).unwrap_or_default();
        journeys::Journey::from_model(model, expense_ids)
    }
}
