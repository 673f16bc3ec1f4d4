use axum::{routing::get, Router};
use crate::state::AppState;
use crate::handlers::truck::{get_latest_trip, list_trucks};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trucks", get(list_trucks))
        .route("/trucks/{truck_number}/latest-trip", get(get_latest_trip))
}
