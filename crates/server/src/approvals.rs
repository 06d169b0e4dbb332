//! Review endpoints under `/admin`

use api_types::approval::{BulkApprovalRequest, BulkApprovalResponse, PendingApproval, Reviewed};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use engine::{ApprovalTarget, EngineError, Principal};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    ServerError,
    server::ServerState,
    views::{bulk_view, pending_view},
};

/// Reads `variancePercent`: a number, a numeric string, or nothing at all.
fn parse_tolerance(value: Option<&Value>) -> Result<Option<f64>, EngineError> {
    let invalid = || EngineError::InvalidArgument("variancePercent must be a number".to_string());
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number.as_f64().map(Some).ok_or_else(invalid),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => text.trim().parse::<f64>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

fn target_name(target: ApprovalTarget) -> &'static str {
    match target {
        ApprovalTarget::Expense => "expense",
        ApprovalTarget::Journey => "journey",
    }
}

pub async fn pending(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<PendingApproval>>, ServerError> {
    let pending = state.engine.pending_approvals(&principal).await?;
    Ok(Json(pending.into_iter().map(pending_view).collect()))
}

pub async fn approve(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<Reviewed>, ServerError> {
    let target = ApprovalTarget::try_from(kind.as_str())?;
    state.engine.approve_single(&principal, target, id).await?;
    Ok(Json(Reviewed {
        id,
        kind: target_name(target).to_string(),
        status: "approved".to_string(),
    }))
}

pub async fn reject(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<Reviewed>, ServerError> {
    let target = ApprovalTarget::try_from(kind.as_str())?;
    state.engine.reject_single(&principal, target, id).await?;
    Ok(Json(Reviewed {
        id,
        kind: target_name(target).to_string(),
        status: "rejected".to_string(),
    }))
}

/// Handle a bulk sweep; an empty body uses the default tolerance.
pub async fn bulk(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    payload: Option<Json<BulkApprovalRequest>>,
) -> Result<Json<BulkApprovalResponse>, ServerError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let tolerance = parse_tolerance(request.variance_percent.as_ref())?;

    let report = state
        .engine
        .bulk_approve_by_variance(&principal, tolerance)
        .await?;
    Ok(Json(bulk_view(report)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn tolerance_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_tolerance(None), Ok(None));
        assert_eq!(parse_tolerance(Some(&Value::Null)), Ok(None));
        assert_eq!(parse_tolerance(Some(&json!(15))), Ok(Some(15.0)));
        assert_eq!(parse_tolerance(Some(&json!(7.5))), Ok(Some(7.5)));
        assert_eq!(parse_tolerance(Some(&json!(" 12 "))), Ok(Some(12.0)));
    }

    #[test]
    fn tolerance_rejects_anything_else() {
        for value in [json!("ten"), json!(true), json!([10]), json!({"v": 10})] {
            assert!(matches!(
                parse_tolerance(Some(&value)),
                Err(EngineError::InvalidArgument(_))
            ));
        }
    }
}
