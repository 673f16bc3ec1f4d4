use axum::{routing::get, Router};
use crate::state::AppState;
use crate::handlers::analytics::{dashboard, monthly_report};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/analytics/monthly", get(monthly_report))
        .route("/dashboard", get(dashboard))
}
