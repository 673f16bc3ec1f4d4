//! Period aggregation over stored trip figures.
//!
//! Buckets are keyed by the calendar month of each trip's `start_date`
//! and only ever sum values the calculator already produced, so
//! `profit == revenue - expenses` holds exactly for every bucket.
//! Sums saturate at `Decimal`'s bounds instead of panicking.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::trip::TripSummary;

/// Inclusive `start_date` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::validation(format!(
                "Start date ({start}) must not be after end date ({end})"
            )));
        }
        Ok(Self { start, end })
    }

    /// The window of `months` calendar months ending on `today`.
    pub fn last_months(months: u32, today: NaiveDate) -> Self {
        let start = today
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Preset windows offered by the date-range picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum QuickRange {
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "3y")]
    ThreeYears,
    #[serde(rename = "4y")]
    FourYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl QuickRange {
    pub fn months(self) -> u32 {
        match self {
            QuickRange::OneMonth => 1,
            QuickRange::ThreeMonths => 3,
            QuickRange::SixMonths => 6,
            QuickRange::OneYear => 12,
            QuickRange::TwoYears => 24,
            QuickRange::ThreeYears => 36,
            QuickRange::FourYears => 48,
            QuickRange::FiveYears => 60,
        }
    }

    pub fn ending(self, today: NaiveDate) -> DateRange {
        DateRange::last_months(self.months(), today)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyFinancialSummary {
    /// `Oct 2024`
    pub month: String,
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub profit: Decimal,
    pub trip_count: usize,
    pub profit_margin_percent: i64,
    #[serde(skip)]
    pub first_trip_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodTotals {
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub profit: Decimal,
    pub profit_margin_percent: i64,
}

impl PeriodTotals {
    pub fn from_months(months: &[MonthlyFinancialSummary]) -> Self {
        let revenue = total(months.iter().map(|m| m.revenue));
        let expenses = total(months.iter().map(|m| m.expenses));
        let profit = total(months.iter().map(|m| m.profit));
        Self {
            revenue,
            expenses,
            profit,
            profit_margin_percent: profit_margin_percent(profit, revenue),
        }
    }
}

fn total(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts.into_iter().fold(Decimal::ZERO, Decimal::saturating_add)
}

/// `round(profit / revenue * 100)`, halves rounded up; 0 without revenue
/// or when the ratio is out of range.
pub fn profit_margin_percent(profit: Decimal, revenue: Decimal) -> i64 {
    if revenue <= Decimal::ZERO {
        return 0;
    }
    profit
        .checked_div(revenue)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|percent| percent.checked_add(Decimal::new(5, 1)))
        .and_then(|percent| percent.floor().to_i64())
        .unwrap_or(0)
}

pub fn filter_by_range<'a>(trips: &'a [TripSummary], range: &DateRange) -> Vec<&'a TripSummary> {
    trips.iter().filter(|t| range.contains(t.start_date)).collect()
}

pub fn bucket_by_month<'a, I>(trips: I) -> Vec<MonthlyFinancialSummary>
where
    I: IntoIterator<Item = &'a TripSummary>,
{
    let mut buckets: BTreeMap<(i32, u32), MonthlyFinancialSummary> = BTreeMap::new();

    for trip in trips {
        let date = trip.start_date;
        let bucket = buckets
            .entry((date.year(), date.month()))
            .or_insert_with(|| MonthlyFinancialSummary {
                month: date.format("%b %Y").to_string(),
                revenue: Decimal::ZERO,
                expenses: Decimal::ZERO,
                profit: Decimal::ZERO,
                trip_count: 0,
                profit_margin_percent: 0,
                first_trip_date: date,
            });
        bucket.revenue = bucket.revenue.saturating_add(trip.rent);
        bucket.expenses = bucket.expenses.saturating_add(trip.total_expenses);
        bucket.profit = bucket.profit.saturating_add(trip.profit_loss);
        bucket.trip_count += 1;
        bucket.first_trip_date = bucket.first_trip_date.min(date);
    }

    let mut months: Vec<MonthlyFinancialSummary> = buckets.into_values().collect();
    for month in &mut months {
        month.profit_margin_percent = profit_margin_percent(month.profit, month.revenue);
    }
    months.sort_by_key(|m| m.first_trip_date);
    months
}

/// Per-truck roll-up shown on the trucks page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TruckSummary {
    pub truck_number: String,
    pub truck_name: String,
    pub driver_name: String,
    pub trip_count: usize,
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub profit: Decimal,
    pub profit_margin_percent: i64,
    pub latest_trip_id: i64,
    pub latest_trip_number: String,
    pub latest_trip_date: NaiveDate,
    pub last_updated: DateTime<Utc>,
}

fn recency(trip: &TripSummary) -> (NaiveDate, DateTime<Utc>, i64) {
    (trip.start_date, trip.updated_at, trip.id)
}

/// Groups trips by `truck_number`; name and driver come from each truck's
/// most recent trip.
pub fn summarize_by_truck(trips: &[TripSummary]) -> Vec<TruckSummary> {
    let mut by_truck: BTreeMap<&str, Vec<&TripSummary>> = BTreeMap::new();
    for trip in trips {
        by_truck.entry(trip.truck_number.as_str()).or_default().push(trip);
    }

    by_truck
        .into_iter()
        .filter_map(|(truck_number, trips)| {
            let latest = trips.iter().copied().max_by_key(|t| recency(t))?;
            let revenue = total(trips.iter().map(|t| t.rent));
            let profit = total(trips.iter().map(|t| t.profit_loss));
            Some(TruckSummary {
                truck_number: truck_number.to_string(),
                truck_name: latest.truck_name.clone(),
                driver_name: latest.driver1_name.clone(),
                trip_count: trips.len(),
                revenue,
                expenses: total(trips.iter().map(|t| t.total_expenses)),
                profit,
                profit_margin_percent: profit_margin_percent(profit, revenue),
                latest_trip_id: latest.id,
                latest_trip_number: latest.trip_number.clone(),
                latest_trip_date: latest.start_date,
                last_updated: trips.iter().map(|t| t.updated_at).max().unwrap_or(latest.updated_at),
            })
        })
        .collect()
}
