//! Expense API endpoints
//!
//! Creation and updates are `multipart/form-data` so a receipt can travel with
//! the fields:
//!
//! - `amount`: decimal string, e.g. `12.50`
//! - `category` (alias `expenseType`)
//! - `description`
//! - `journeyId`
//! - `occurredAt`: RFC3339 timestamp or `YYYY-MM-DD`
//! - `receipt`: the file

use api_types::expense::{ExpenseListQuery, ExpenseView};
use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State, multipart::Field},
    http::StatusCode,
};
use chrono::{DateTime, NaiveDate, Utc};
use engine::{
    EngineError, ExpenseCategory, ExpenseFilter, ExpenseStatus, Money, Principal, ReceiptUpload,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views::expense_view};

#[derive(Debug, Default)]
struct ExpenseForm {
    amount: Option<Money>,
    category: Option<ExpenseCategory>,
    description: Option<String>,
    journey_id: Option<Uuid>,
    occurred_at: Option<DateTime<Utc>>,
    receipt: Option<ReceiptUpload>,
}

fn parse_occurred_at(value: &str) -> Result<DateTime<Utc>, ServerError> {
    let value = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
        .ok_or_else(|| ServerError::Generic(format!("invalid date: {value}")))
}

async fn field_text(field: Field<'_>) -> Result<String, ServerError> {
    field
        .text()
        .await
        .map_err(|err| ServerError::Generic(err.to_string()))
}

async fn read_form(mut multipart: Multipart) -> Result<ExpenseForm, ServerError> {
    let mut form = ExpenseForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ServerError::Generic(err.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "receipt" => {
                let file_name = field.file_name().unwrap_or("receipt").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ServerError::Generic(err.to_string()))?;
                // browsers send an empty part when no file is picked
                if !bytes.is_empty() {
                    form.receipt = Some(ReceiptUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            "amount" => form.amount = Some(field_text(field).await?.parse::<Money>()?),
            "category" | "expenseType" => {
                form.category = Some(ExpenseCategory::try_from(field_text(field).await?.as_str())?);
            }
            "description" => form.description = Some(field_text(field).await?),
            "journeyId" => {
                let text = field_text(field).await?;
                let text = text.trim();
                if !text.is_empty() {
                    form.journey_id = Some(
                        Uuid::parse_str(text)
                            .map_err(|_| ServerError::Generic(format!("invalid journeyId: {text}")))?,
                    );
                }
            }
            "occurredAt" => form.occurred_at = Some(parse_occurred_at(&field_text(field).await?)?),
            other => tracing::debug!("ignoring multipart field {other}"),
        }
    }
    Ok(form)
}

/// Handle requests for recording an expense
pub async fn create(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    let form = read_form(multipart).await?;
    let amount = form
        .amount
        .ok_or_else(|| EngineError::InvalidArgument("amount is required".to_string()))?;
    let category = form
        .category
        .ok_or_else(|| EngineError::InvalidArgument("category is required".to_string()))?;

    let cmd = engine::ExpenseNew {
        journey_id: form.journey_id,
        amount,
        category,
        description: form.description,
        occurred_at: form.occurred_at,
        receipt: form.receipt,
    };
    let expense = state.engine.create_expense(&principal, cmd).await?;
    Ok((StatusCode::CREATED, Json(expense_view(expense))))
}

/// Handle requests for listing the caller's expenses
pub async fn list(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Query(query): Query<ExpenseListQuery>,
) -> Result<Json<Vec<ExpenseView>>, ServerError> {
    let status = query
        .status
        .as_deref()
        .map(ExpenseStatus::try_from)
        .transpose()?;
    let expenses = state
        .engine
        .expenses(
            &principal,
            ExpenseFilter {
                journey_id: query.journey_id,
                status,
            },
        )
        .await?;
    Ok(Json(expenses.into_iter().map(expense_view).collect()))
}

pub async fn get(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state.engine.expense(&principal, id).await?;
    Ok(Json(expense_view(expense)))
}

pub async fn update(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ExpenseView>, ServerError> {
    let form = read_form(multipart).await?;
    if form.journey_id.is_some() {
        return Err(ServerError::Generic(
            "the journey of an expense cannot change".to_string(),
        ));
    }

    let cmd = engine::ExpenseUpdate {
        amount: form.amount,
        category: form.category,
        description: form.description,
        occurred_at: form.occurred_at,
        receipt: form.receipt,
    };
    let expense = state.engine.update_expense(&principal, id, cmd).await?;
    Ok(Json(expense_view(expense)))
}

pub async fn delete(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_expense(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
