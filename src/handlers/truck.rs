use axum::extract::{Path, State};
use axum::Json;

use crate::dtos::trip::TripSummaryResponse;
use crate::error::AppError;
use crate::finance::aggregator::{summarize_by_truck, TruckSummary};
use crate::handlers::trip::{fetch_summaries, SUMMARY_SELECT};
use crate::models::trip::TripSummary;
use crate::state::AppState;

/// Trucks are not stored on their own; they are whatever `truck_number`s
/// the trips mention.
pub async fn list_trucks(
    State(AppState { db_pool, .. }): State<AppState>,
) -> Result<Json<Vec<TruckSummary>>, AppError> {
    let trips = fetch_summaries(&db_pool).await?;
    Ok(Json(summarize_by_truck(&trips)))
}

pub async fn get_latest_trip(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(truck_number): Path<String>,
) -> Result<Json<TripSummaryResponse>, AppError> {
    let trip = sqlx::query_as::<_, TripSummary>(&format!(
        "{SUMMARY_SELECT} WHERE truck_number = $1 ORDER BY start_date DESC, updated_at DESC, id DESC LIMIT 1"
    ))
    .bind(truck_number.trim())
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found(format!("No trips recorded for truck {}", truck_number.trim())))?;

    Ok(Json(TripSummaryResponse::from(trip)))
}
