//! Journey API endpoints

use api_types::journey::{JourneyListQuery, JourneyNew, JourneyUpdate, JourneyView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{Money, Principal};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views::journey_view};

/// Handle requests for logging a new journey
pub async fn create(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<JourneyNew>,
) -> Result<(StatusCode, Json<JourneyView>), ServerError> {
    let mut cmd = engine::JourneyNew::new(
        payload.purpose,
        payload.origin,
        payload.destination,
        payload.distance_km,
        payload.duration_minutes,
    );
    if let Some(travel_date) = payload.travel_date {
        cmd = cmd.travel_date(travel_date.with_timezone(&Utc));
    }
    if let Some(expected) = payload.expected_amount_minor {
        cmd = cmd.expected_amount(Money::new(expected));
    }

    let journey = state.engine.create_journey(&principal, cmd).await?;
    Ok((StatusCode::CREATED, Json(journey_view(journey))))
}

/// Handle requests for listing the caller's journeys
pub async fn list(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Query(query): Query<JourneyListQuery>,
) -> Result<Json<Vec<JourneyView>>, ServerError> {
    let journeys = state.engine.journeys(&principal, query.limit).await?;
    Ok(Json(journeys.into_iter().map(journey_view).collect()))
}

pub async fn get(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JourneyView>, ServerError> {
    let journey = state.engine.journey(&principal, id).await?;
    Ok(Json(journey_view(journey)))
}

pub async fn update(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<JourneyUpdate>,
) -> Result<Json<JourneyView>, ServerError> {
    let cmd = engine::JourneyUpdate {
        purpose: payload.purpose,
        origin: payload.origin,
        destination: payload.destination,
        travel_date: payload.travel_date.map(|d| d.with_timezone(&Utc)),
        distance_km: payload.distance_km,
        duration_minutes: payload.duration_minutes,
        expected_amount: payload.expected_amount_minor.map(Money::new),
    };
    let journey = state.engine.update_journey(&principal, id, cmd).await?;
    Ok(Json(journey_view(journey)))
}

pub async fn delete(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_journey(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
