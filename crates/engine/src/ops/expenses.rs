use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Expense, ExpenseFilter, ExpenseNew, ExpenseStatus, ExpenseUpdate, Principal,
    ReceiptUpload, ResultEngine, expenses,
    expenses::validate_amount,
    util::normalize_optional_text,
};

use super::{Engine, with_tx};

/// Fields of a new expense once validation and receipt storage are done.
struct PreparedExpense {
    id: Uuid,
    journey_id: Option<Uuid>,
    amount_minor: i64,
    category: &'static str,
    description: Option<String>,
    receipt: Option<String>,
    occurred_at: DateTime<Utc>,
}

impl Engine {
    async fn store_receipt(&self, upload: Option<&ReceiptUpload>) -> ResultEngine<Option<String>> {
        match upload {
            Some(upload) => Ok(Some(self.receipts.put(upload).await?)),
            None => Ok(None),
        }
    }

    /// Best effort: a receipt left behind is only wasted space.
    async fn discard_receipt(&self, handle: Option<&str>) {
        if let Some(handle) = handle
            && let Err(err) = self.receipts.remove(handle).await
        {
            tracing::warn!("could not remove receipt {handle}: {err}");
        }
    }

    /// Record an expense for the caller, optionally against one of their
    /// journeys and with a receipt.
    ///
    /// The receipt is validated before anything is written. If the database
    /// transaction fails, the stored receipt is removed again.
    pub async fn create_expense(&self, principal: &Principal, cmd: ExpenseNew) -> ResultEngine<Expense> {
        let amount = validate_amount(cmd.amount)?;
        if let Some(upload) = &cmd.receipt {
            upload.validate()?;
        }
        let receipt = self.store_receipt(cmd.receipt.as_ref()).await?;

        let prepared = PreparedExpense {
            id: Uuid::new_v4(),
            journey_id: cmd.journey_id,
            amount_minor: amount.minor(),
            category: cmd.category.as_str(),
            description: normalize_optional_text(cmd.description.as_deref()),
            receipt: receipt.clone(),
            occurred_at: cmd.occurred_at.unwrap_or_else(Utc::now),
        };
        let result = self.insert_expense(principal, prepared).await;
        if result.is_err() {
            self.discard_receipt(receipt.as_deref()).await;
        }
        result
    }

    async fn insert_expense(&self, principal: &Principal, prepared: PreparedExpense) -> ResultEngine<Expense> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            if let Some(journey_id) = prepared.journey_id {
                self.require_journey_writable(&db_tx, journey_id, principal)
                    .await?;
            }

            let model = expenses::ActiveModel {
                id: ActiveValue::Set(prepared.id.to_string()),
                owner_id: ActiveValue::Set(principal.account_id.to_string()),
                journey_id: ActiveValue::Set(prepared.journey_id.map(|id| id.to_string())),
                amount_minor: ActiveValue::Set(prepared.amount_minor),
                category: ActiveValue::Set(prepared.category.to_string()),
                description: ActiveValue::Set(prepared.description),
                receipt: ActiveValue::Set(prepared.receipt),
                status: ActiveValue::Set(ExpenseStatus::Pending.as_str().to_string()),
                occurred_at: ActiveValue::Set(prepared.occurred_at),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            if let Some(journey_id) = &model.journey_id {
                self.refresh_journey_totals(&db_tx, journey_id).await?;
            }

            tracing::info!(
                "account {} recorded expense {} of {}",
                principal.account_id,
                prepared.id,
                prepared.amount_minor
            );
            Expense::try_from(model)
        })
    }

    /// The caller's expenses, newest first.
    pub async fn expenses(&self, principal: &Principal, filter: ExpenseFilter) -> ResultEngine<Vec<Expense>> {
        with_tx!(self, |db_tx| {
            let mut query = expenses::Entity::find()
                .filter(expenses::Column::OwnerId.eq(principal.account_id.to_string()));
            if let Some(journey_id) = filter.journey_id {
                query = query.filter(expenses::Column::JourneyId.eq(journey_id.to_string()));
            }
            if let Some(status) = filter.status {
                query = query.filter(expenses::Column::Status.eq(status.as_str()));
            }
            let models = query
                .order_by_desc(expenses::Column::CreatedAt)
                .order_by_desc(expenses::Column::Id)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Expense::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// An expense visible to the caller.
    pub async fn expense(&self, principal: &Principal, expense_id: Uuid) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_expense_visible(&db_tx, expense_id, principal)
                .await?;
            Expense::try_from(model)
        })
    }

    /// Patch a reviewable expense and recompute its journey.
    ///
    /// A new receipt replaces the old one; the old file is removed once the
    /// update is committed.
    pub async fn update_expense(
        &self,
        principal: &Principal,
        expense_id: Uuid,
        cmd: ExpenseUpdate,
    ) -> ResultEngine<Expense> {
        let amount = cmd.amount.map(validate_amount).transpose()?;
        if let Some(upload) = &cmd.receipt {
            upload.validate()?;
        }
        let receipt = self.store_receipt(cmd.receipt.as_ref()).await?;

        let result = self
            .patch_expense(principal, expense_id, &cmd, amount.map(|a| a.minor()), receipt.clone())
            .await;
        match result {
            Ok((expense, replaced)) => {
                if receipt.is_some() {
                    self.discard_receipt(replaced.as_deref()).await;
                }
                Ok(expense)
            }
            Err(err) => {
                self.discard_receipt(receipt.as_deref()).await;
                Err(err)
            }
        }
    }

    async fn patch_expense(
        &self,
        principal: &Principal,
        expense_id: Uuid,
        cmd: &ExpenseUpdate,
        amount_minor: Option<i64>,
        receipt: Option<String>,
    ) -> ResultEngine<(Expense, Option<String>)> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_expense_writable(&db_tx, expense_id, principal)
                .await?;
            let status = ExpenseStatus::try_from(model.status.as_str())?;
            if status.is_terminal() {
                return Err(EngineError::InvalidState(format!(
                    "expense is already {}",
                    status.as_str()
                )));
            }
            let replaced = model.receipt.clone();

            let mut active: expenses::ActiveModel = model.into();
            if let Some(amount_minor) = amount_minor {
                active.amount_minor = ActiveValue::Set(amount_minor);
            }
            if let Some(category) = cmd.category {
                active.category = ActiveValue::Set(category.as_str().to_string());
            }
            if let Some(description) = &cmd.description {
                active.description = ActiveValue::Set(normalize_optional_text(Some(description.as_str())));
            }
            if let Some(occurred_at) = cmd.occurred_at {
                active.occurred_at = ActiveValue::Set(occurred_at);
            }
            if receipt.is_some() {
                active.receipt = ActiveValue::Set(receipt);
            }
            active.updated_at = ActiveValue::Set(Utc::now());
            let updated = active.update(&db_tx).await?;

            if let Some(journey_id) = &updated.journey_id {
                self.refresh_journey_totals(&db_tx, journey_id).await?;
            }
            Ok((Expense::try_from(updated)?, replaced))
        })
    }

    /// Delete a reviewable expense and recompute its former journey.
    pub async fn delete_expense(&self, principal: &Principal, expense_id: Uuid) -> ResultEngine<()> {
        let receipt = with_tx!(self, |db_tx| {
            let model = self
                .require_expense_writable(&db_tx, expense_id, principal)
                .await?;
            let status = ExpenseStatus::try_from(model.status.as_str())?;
            if status.is_terminal() {
                return Err(EngineError::InvalidState(format!(
                    "expense is already {}",
                    status.as_str()
                )));
            }

            let receipt = model.receipt.clone();
            let journey_id = model.journey_id.clone();
            expenses::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            if let Some(journey_id) = journey_id {
                self.refresh_journey_totals(&db_tx, &journey_id).await?;
            }
            Ok::<_, EngineError>(receipt)
        })?;

        self.discard_receipt(receipt.as_deref()).await;
        tracing::info!("expense {expense_id} deleted by {}", principal.account_id);
        Ok(())
    }
}
