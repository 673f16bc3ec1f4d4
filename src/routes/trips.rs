use axum::{
    routing::{get, post},
    Router,
};
use crate::state::AppState;
use crate::handlers::trip;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trips", get(trip::list_trips).post(trip::create_trip))
        .route("/trips/calculate", post(trip::calculate_trip))
        .route(
            "/trips/{id}",
            get(trip::get_trip).put(trip::update_trip).delete(trip::delete_trip),
        )
}
