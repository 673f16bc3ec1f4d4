use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgPool, Postgres, Transaction};

use crate::dtos::trip::{
    CalculationRequest, CalculationResponse, TripListQuery, TripRequest, TripResponse,
    TripSummaryResponse,
};
use crate::error::AppError;
use crate::finance::aggregator::DateRange;
use crate::finance::calculator::FuelPurchase;
use crate::models::trip::{DieselEntry, DieselEntryRow, TripRecord, TripRow, TripSummary};
use crate::state::AppState;

const TRIP_SELECT: &str = r#"SELECT
    id, trip_number, truck_name, truck_number, driver1_name, driver2_name,
    loading_point, unloading_point, start_date, unloading_date, eway_bill, lr_number,
    starting_km, closing_km, running_km,
    rent, loading_halt_cost, unloading_halt_cost, fastag_charges, def_charges, rto_charges,
    police_commission, other_expenses_amount, other_expenses_text,
    driver_bata_type, driver_bata_percent, driver_bata_amount,
    agent_name, agent_mobile, agent_commission_type, agent_commission_percent, agent_commission_amount,
    diesel_cost, total_expenses, profit_loss, created_at, updated_at
FROM trips"#;

pub(crate) const SUMMARY_SELECT: &str = r#"SELECT
    id, trip_number, truck_name, truck_number, driver1_name,
    loading_point, unloading_point, start_date, unloading_date,
    rent, total_expenses, profit_loss, updated_at
FROM trips"#;

const INSERT_TRIP: &str = r#"INSERT INTO trips (
    trip_number, truck_name, truck_number, driver1_name, driver2_name,
    loading_point, unloading_point, start_date, unloading_date, eway_bill, lr_number,
    starting_km, closing_km, running_km,
    rent, loading_halt_cost, unloading_halt_cost, fastag_charges, def_charges, rto_charges,
    police_commission, other_expenses_amount, other_expenses_text,
    driver_bata_type, driver_bata_percent, driver_bata_amount,
    agent_name, agent_mobile, agent_commission_type, agent_commission_percent, agent_commission_amount,
    diesel_cost, total_expenses, profit_loss)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
        $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32, $33, $34)
RETURNING id"#;

const UPDATE_TRIP: &str = r#"UPDATE trips SET
    trip_number = $1, truck_name = $2, truck_number = $3, driver1_name = $4, driver2_name = $5,
    loading_point = $6, unloading_point = $7, start_date = $8, unloading_date = $9,
    eway_bill = $10, lr_number = $11,
    starting_km = $12, closing_km = $13, running_km = $14,
    rent = $15, loading_halt_cost = $16, unloading_halt_cost = $17, fastag_charges = $18,
    def_charges = $19, rto_charges = $20, police_commission = $21, other_expenses_amount = $22,
    other_expenses_text = $23,
    driver_bata_type = $24, driver_bata_percent = $25, driver_bata_amount = $26,
    agent_name = $27, agent_mobile = $28, agent_commission_type = $29,
    agent_commission_percent = $30, agent_commission_amount = $31,
    diesel_cost = $32, total_expenses = $33, profit_loss = $34,
    updated_at = NOW()
WHERE id = $35
RETURNING id"#;

const INSERT_DIESEL_ENTRY: &str = r#"INSERT INTO diesel_entries
    (trip_id, position, purchase_date, purchase_time, location, litres_purchased, price_per_litre, total_cost)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#;

pub async fn create_trip(
    State(AppState { db_pool, bata_base }): State<AppState>,
    Json(req): Json<TripRequest>,
) -> Result<(StatusCode, Json<TripResponse>), AppError> {
    req.validate()?;
    let (record, diesel_entries) = req.into_record(bata_base)?;

    // Trip row and its diesel entries land together or not at all
    let mut tx = db_pool.begin().await?;

    let (id,): (i64,) = bind_record(sqlx::query_as(INSERT_TRIP), &record)
        .fetch_one(&mut *tx)
        .await?;
    insert_diesel_entries(&mut tx, id, &diesel_entries).await?;

    tx.commit().await?;

    tracing::info!(
        trip_id = id,
        trip_number = %record.trip_number,
        profit_loss = %record.financials.profit_loss,
        "Trip created"
    );

    let trip = fetch_trip_by_id(&db_pool, id).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

pub async fn get_trip(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TripResponse>, AppError> {
    fetch_trip_by_id(&db_pool, id).await.map(Json)
}

pub async fn list_trips(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(params): Query<TripListQuery>,
) -> Result<Json<Vec<TripSummaryResponse>>, AppError> {
    if let (Some(start), Some(end)) = (params.start, params.end) {
        DateRange::new(start, end)?;
    }
    let truck_number = params
        .truck_number
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let trips = sqlx::query_as::<_, TripSummary>(&format!(
        r#"{SUMMARY_SELECT}
        WHERE ($1::DATE IS NULL OR start_date >= $1)
          AND ($2::DATE IS NULL OR start_date <= $2)
          AND ($3::TEXT IS NULL OR truck_number = $3)
        ORDER BY created_at DESC, id DESC"#
    ))
    .bind(params.start)
    .bind(params.end)
    .bind(truck_number)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(trips.into_iter().map(TripSummaryResponse::from).collect()))
}

/// Full replace. Diesel entries are swapped inside the same transaction as
/// the trip row, so a trip is never left without them.
pub async fn update_trip(
    State(AppState { db_pool, bata_base }): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<TripRequest>,
) -> Result<Json<TripResponse>, AppError> {
    req.validate()?;
    let (record, diesel_entries) = req.into_record(bata_base)?;

    let mut tx = db_pool.begin().await?;

    bind_record(sqlx::query_as::<_, (i64,)>(UPDATE_TRIP), &record)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Trip not found"))?;

    sqlx::query("DELETE FROM diesel_entries WHERE trip_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    insert_diesel_entries(&mut tx, id, &diesel_entries).await?;

    tx.commit().await?;

    tracing::info!(
        trip_id = id,
        diesel_entries = diesel_entries.len(),
        profit_loss = %record.financials.profit_loss,
        "Trip updated"
    );

    fetch_trip_by_id(&db_pool, id).await.map(Json)
}

pub async fn delete_trip(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let mut tx = db_pool.begin().await?;

    let removed_entries = sqlx::query("DELETE FROM diesel_entries WHERE trip_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let result = sqlx::query("DELETE FROM trips WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Trip not found"));
    }

    tx.commit().await?;

    tracing::info!(trip_id = id, removed_entries, "Trip deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Live totals for the trip wizard; nothing is stored.
pub async fn calculate_trip(
    State(AppState { bata_base, .. }): State<AppState>,
    Json(req): Json<CalculationRequest>,
) -> Result<Json<CalculationResponse>, AppError> {
    req.calculate(bata_base).map(Json)
}

/// All trip summaries, newest first.
pub(crate) async fn fetch_summaries(db_pool: &PgPool) -> Result<Vec<TripSummary>, AppError> {
    let trips = sqlx::query_as::<_, TripSummary>(&format!(
        "{SUMMARY_SELECT} ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(db_pool)
    .await?;
    Ok(trips)
}

// Helper function to fetch a trip with its diesel entries
async fn fetch_trip_by_id(db_pool: &PgPool, id: i64) -> Result<TripResponse, AppError> {
    let row = sqlx::query_as::<_, TripRow>(&format!("{TRIP_SELECT} WHERE id = $1"))
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Trip not found"))?;

    let entries = sqlx::query_as::<_, DieselEntryRow>(
        r#"SELECT id, purchase_date, purchase_time, location,
                  litres_purchased, price_per_litre, total_cost
        FROM diesel_entries
        WHERE trip_id = $1
        ORDER BY purchase_date, purchase_time, position"#,
    )
    .bind(id)
    .fetch_all(db_pool)
    .await?;

    TripResponse::from_row(row, entries)
}

async fn insert_diesel_entries(
    tx: &mut Transaction<'_, Postgres>,
    trip_id: i64,
    entries: &[DieselEntry],
) -> Result<(), AppError> {
    for (position, entry) in entries.iter().enumerate() {
        let position = i32::try_from(position)
            .map_err(|_| AppError::validation("Too many diesel entries"))?;
        let total_cost = entry
            .total_cost()
            .ok_or_else(|| AppError::internal(format!("diesel entry {position} cost overflowed")))?;
        sqlx::query(INSERT_DIESEL_ENTRY)
            .bind(trip_id)
            .bind(position)
            .bind(entry.date)
            .bind(entry.time)
            .bind(entry.location.as_str())
            .bind(entry.litres_purchased)
            .bind(entry.price_per_litre)
            .bind(total_cost)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// Binds `$1..$34` in the column order of `INSERT_TRIP` and `UPDATE_TRIP`.
fn bind_record<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    r: &'q TripRecord,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    let c = &r.charges;
    let f = &r.financials;
    query
        .bind(r.trip_number.as_str())
        .bind(r.truck_name.as_str())
        .bind(r.truck_number.as_str())
        .bind(r.driver1_name.as_str())
        .bind(r.driver2_name.as_deref())
        .bind(r.loading_point.as_str())
        .bind(r.unloading_point.as_str())
        .bind(r.start_date)
        .bind(r.unloading_date)
        .bind(r.eway_bill.as_deref())
        .bind(r.lr_number.as_deref())
        .bind(r.starting_km)
        .bind(r.closing_km)
        .bind(r.running_km)
        .bind(c.rent)
        .bind(c.loading_halt_cost)
        .bind(c.unloading_halt_cost)
        .bind(c.fastag_charges)
        .bind(c.def_charges)
        .bind(c.rto_charges)
        .bind(c.police_commission)
        .bind(c.other_expenses_amount)
        .bind(r.other_expenses_text.as_deref())
        .bind(c.driver_bata.basis())
        .bind(c.driver_bata.percent())
        .bind(f.driver_bata_amount)
        .bind(r.agent_name.as_deref())
        .bind(r.agent_mobile.as_deref())
        .bind(c.agent_commission.basis())
        .bind(c.agent_commission.percent())
        .bind(f.agent_commission_amount)
        .bind(f.diesel_cost)
        .bind(f.total_expenses)
        .bind(f.profit_loss)
}
