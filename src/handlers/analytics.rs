use axum::extract::{Query, State};
use axum::Json;
use chrono::Local;

use crate::dtos::analytics::{AnalyticsQuery, DashboardResponse, MonthlyReportResponse, RECENT_TRIP_LIMIT};
use crate::dtos::trip::TripSummaryResponse;
use crate::error::AppError;
use crate::finance::aggregator::{bucket_by_month, filter_by_range, PeriodTotals};
use crate::finance::format::format_inr;
use crate::handlers::trip::fetch_summaries;
use crate::state::AppState;

pub async fn monthly_report(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(params): Query<AnalyticsQuery>,
) -> Result<Json<MonthlyReportResponse>, AppError> {
    let range = params.resolve(Local::now().date_naive())?;

    let trips = fetch_summaries(&db_pool).await?;
    let in_range = filter_by_range(&trips, &range);
    let months = bucket_by_month(in_range);
    let totals = PeriodTotals::from_months(&months);

    tracing::debug!(
        start = %range.start,
        end = %range.end,
        months = months.len(),
        "Monthly report built"
    );

    Ok(Json(MonthlyReportResponse {
        range,
        months,
        totals: totals.into(),
    }))
}

pub async fn dashboard(
    State(AppState { db_pool, .. }): State<AppState>,
) -> Result<Json<DashboardResponse>, AppError> {
    let trips = fetch_summaries(&db_pool).await?;
    let totals = PeriodTotals::from_months(&bucket_by_month(&trips));

    Ok(Json(DashboardResponse {
        trip_count: trips.len(),
        total_revenue: totals.revenue,
        total_expenses: totals.expenses,
        total_profit: totals.profit,
        total_revenue_display: format_inr(totals.revenue),
        total_profit_display: format_inr(totals.profit),
        recent_trips: trips
            .into_iter()
            .take(RECENT_TRIP_LIMIT)
            .map(TripSummaryResponse::from)
            .collect(),
    }))
}
