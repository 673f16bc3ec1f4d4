use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dtos::trip::TripSummaryResponse;
use crate::error::AppError;
use crate::finance::aggregator::{DateRange, MonthlyFinancialSummary, PeriodTotals, QuickRange};
use crate::finance::format::format_inr;

/// Number of trips listed on the dashboard.
pub const RECENT_TRIP_LIMIT: usize = 5;

/// Default analytics window when neither dates nor a preset are given.
const DEFAULT_MONTHS: u32 = 12;

// Request DTOs

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub range: Option<QuickRange>,
}

impl AnalyticsQuery {
    /// Explicit dates win over a preset; a missing end means `today`.
    pub fn resolve(&self, today: NaiveDate) -> Result<DateRange, AppError> {
        match (self.start, self.end, self.range) {
            (Some(start), end, _) => DateRange::new(start, end.unwrap_or(today)),
            (None, Some(end), preset) => {
                let months = preset.map(QuickRange::months).unwrap_or(DEFAULT_MONTHS);
                Ok(DateRange::last_months(months, end))
            }
            (None, None, Some(preset)) => Ok(preset.ending(today)),
            (None, None, None) => Ok(DateRange::last_months(DEFAULT_MONTHS, today)),
        }
    }
}

// Response DTOs

#[derive(Debug, Serialize)]
pub struct PeriodTotalsResponse {
    #[serde(flatten)]
    pub totals: PeriodTotals,
    pub revenue_display: String,
    pub expenses_display: String,
    pub profit_display: String,
}

impl From<PeriodTotals> for PeriodTotalsResponse {
    fn from(totals: PeriodTotals) -> Self {
        Self {
            revenue_display: format_inr(totals.revenue),
            expenses_display: format_inr(totals.expenses),
            profit_display: format_inr(totals.profit),
            totals,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MonthlyReportResponse {
    pub range: DateRange,
    pub months: Vec<MonthlyFinancialSummary>,
    pub totals: PeriodTotalsResponse,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub trip_count: usize,
    pub total_revenue: Decimal,
    pub total_expenses: Decimal,
    pub total_profit: Decimal,
    pub total_revenue_display: String,
    pub total_profit_display: String,
    pub recent_trips: Vec<TripSummaryResponse>,
}
