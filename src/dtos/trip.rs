use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, FieldError};
use crate::finance::calculator::{
    self, AgentCommission, BataBase, DriverBata, FuelPurchase, TripCharges, TripFinancials,
};
use crate::finance::format::{format_date, format_inr};
use crate::models::trip::{DieselEntry, DieselEntryRow, TripRecord, TripRow, TripSummary};

// Request DTOs

/// Body of `POST /trips` and `PUT /trips/{id}`. Derived money fields are
/// never accepted from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct TripRequest {
    pub trip_number: String,
    pub truck_name: String,
    pub truck_number: String,
    pub driver1_name: String,
    pub driver2_name: Option<String>,
    pub loading_point: String,
    pub unloading_point: String,
    pub start_date: NaiveDate,
    pub unloading_date: NaiveDate,
    pub eway_bill: Option<String>,
    pub lr_number: Option<String>,
    pub starting_km: Decimal,
    pub closing_km: Decimal,
    pub rent: Decimal,
    #[serde(default)]
    pub loading_halt_cost: Decimal,
    #[serde(default)]
    pub unloading_halt_cost: Decimal,
    #[serde(default)]
    pub fastag_charges: Decimal,
    #[serde(default)]
    pub def_charges: Decimal,
    #[serde(default)]
    pub rto_charges: Decimal,
    #[serde(default)]
    pub police_commission: Decimal,
    #[serde(default)]
    pub other_expenses_amount: Decimal,
    pub other_expenses_text: Option<String>,
    #[serde(default)]
    pub driver_bata: DriverBata,
    #[serde(default)]
    pub agent_commission: AgentCommission,
    pub agent_name: Option<String>,
    pub agent_mobile: Option<String>,
    pub diesel_entries: Vec<DieselEntry>,
}

fn require_text(errors: &mut Vec<FieldError>, field: &str, value: &str, label: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, format!("{label} is required")));
    }
}

fn require_non_negative(errors: &mut Vec<FieldError>, field: &str, value: Decimal) {
    if value.is_sign_negative() && !value.is_zero() {
        errors.push(FieldError::new(field, "Must be a positive number"));
    }
}

/// Trims and drops blank optional text.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TripRequest {
    /// Collects every field problem at once so the form can mark them all.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();

        require_text(&mut errors, "trip_number", &self.trip_number, "Trip number");
        require_text(&mut errors, "truck_name", &self.truck_name, "Truck name");
        require_text(&mut errors, "truck_number", &self.truck_number, "Truck number");
        require_text(&mut errors, "driver1_name", &self.driver1_name, "Driver name");
        require_text(&mut errors, "loading_point", &self.loading_point, "Loading point");
        require_text(&mut errors, "unloading_point", &self.unloading_point, "Unloading point");

        if self.unloading_date < self.start_date {
            errors.push(FieldError::new(
                "unloading_date",
                "Unloading date must not be before the start date",
            ));
        }

        require_non_negative(&mut errors, "starting_km", self.starting_km);
        require_non_negative(&mut errors, "closing_km", self.closing_km);
        if calculator::running_km(self.starting_km, self.closing_km).is_none() {
            errors.push(FieldError::new(
                "closing_km",
                "Closing KM must be greater than or equal to Starting KM",
            ));
        }

        for (field, value) in [
            ("rent", self.rent),
            ("loading_halt_cost", self.loading_halt_cost),
            ("unloading_halt_cost", self.unloading_halt_cost),
            ("fastag_charges", self.fastag_charges),
            ("def_charges", self.def_charges),
            ("rto_charges", self.rto_charges),
            ("police_commission", self.police_commission),
            ("other_expenses_amount", self.other_expenses_amount),
        ] {
            require_non_negative(&mut errors, field, value);
        }

        match self.driver_bata {
            DriverBata::Percentage { percent } => require_non_negative(&mut errors, "driver_bata.percent", percent),
            DriverBata::Fixed { amount } => require_non_negative(&mut errors, "driver_bata.amount", amount),
        }
        match self.agent_commission {
            AgentCommission::Percentage { percent } => {
                require_non_negative(&mut errors, "agent_commission.percent", percent)
            }
            AgentCommission::Fixed { amount } => {
                require_non_negative(&mut errors, "agent_commission.amount", amount)
            }
        }

        if self.diesel_entries.is_empty() {
            errors.push(FieldError::new("diesel_entries", "At least one diesel entry is required"));
        }
        for (i, entry) in self.diesel_entries.iter().enumerate() {
            require_text(&mut errors, &format!("diesel_entries[{i}].location"), &entry.location, "Location");
            require_non_negative(&mut errors, &format!("diesel_entries[{i}].litres_purchased"), entry.litres_purchased);
            require_non_negative(&mut errors, &format!("diesel_entries[{i}].price_per_litre"), entry.price_per_litre);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(errors))
        }
    }

    /// Derives every computed column. Call after [`TripRequest::validate`].
    pub fn into_record(self, base: BataBase) -> Result<(TripRecord, Vec<DieselEntry>), AppError> {
        let charges = TripCharges {
            rent: self.rent,
            loading_halt_cost: self.loading_halt_cost,
            unloading_halt_cost: self.unloading_halt_cost,
            fastag_charges: self.fastag_charges,
            def_charges: self.def_charges,
            rto_charges: self.rto_charges,
            police_commission: self.police_commission,
            other_expenses_amount: self.other_expenses_amount,
            driver_bata: self.driver_bata,
            agent_commission: self.agent_commission,
        };
        let financials = calculator::derive_financials(&charges, &self.diesel_entries, base)?;
        let running_km = calculator::running_km(self.starting_km, self.closing_km).unwrap_or_default();

        let diesel_entries = self
            .diesel_entries
            .into_iter()
            .map(|e| DieselEntry { location: e.location.trim().to_string(), ..e })
            .collect();

        let record = TripRecord {
            trip_number: self.trip_number.trim().to_string(),
            truck_name: self.truck_name.trim().to_string(),
            truck_number: self.truck_number.trim().to_string(),
            driver1_name: self.driver1_name.trim().to_string(),
            driver2_name: clean(self.driver2_name),
            loading_point: self.loading_point.trim().to_string(),
            unloading_point: self.unloading_point.trim().to_string(),
            start_date: self.start_date,
            unloading_date: self.unloading_date,
            eway_bill: clean(self.eway_bill),
            lr_number: clean(self.lr_number),
            starting_km: self.starting_km,
            closing_km: self.closing_km,
            running_km,
            agent_name: clean(self.agent_name),
            agent_mobile: clean(self.agent_mobile),
            other_expenses_text: clean(self.other_expenses_text),
            charges,
            financials,
        };

        Ok((record, diesel_entries))
    }
}

/// Query of `GET /trips`.
#[derive(Debug, Deserialize)]
pub struct TripListQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub truck_number: Option<String>,
}

/// One fuel line as sent by the trip wizard while the user is still typing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FuelLineInput {
    #[serde(default)]
    pub litres_purchased: Decimal,
    #[serde(default)]
    pub price_per_litre: Decimal,
}

impl FuelPurchase for FuelLineInput {
    fn litres_purchased(&self) -> Decimal {
        self.litres_purchased
    }

    fn price_per_litre(&self) -> Decimal {
        self.price_per_litre
    }
}

/// Body of `POST /trips/calculate`. Missing numbers count as zero.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CalculationRequest {
    pub starting_km: Decimal,
    pub closing_km: Decimal,
    pub rent: Decimal,
    pub loading_halt_cost: Decimal,
    pub unloading_halt_cost: Decimal,
    pub fastag_charges: Decimal,
    pub def_charges: Decimal,
    pub rto_charges: Decimal,
    pub police_commission: Decimal,
    pub other_expenses_amount: Decimal,
    pub driver_bata: DriverBata,
    pub agent_commission: AgentCommission,
    pub diesel_entries: Vec<FuelLineInput>,
}

impl CalculationRequest {
    /// Fails only when an amount overflows.
    pub fn calculate(&self, base: BataBase) -> Result<CalculationResponse, AppError> {
        let charges = TripCharges {
            rent: self.rent,
            loading_halt_cost: self.loading_halt_cost,
            unloading_halt_cost: self.unloading_halt_cost,
            fastag_charges: self.fastag_charges,
            def_charges: self.def_charges,
            rto_charges: self.rto_charges,
            police_commission: self.police_commission,
            other_expenses_amount: self.other_expenses_amount,
            driver_bata: self.driver_bata,
            agent_commission: self.agent_commission,
        };
        let financials = calculator::derive_financials(&charges, &self.diesel_entries, base)?;
        let diesel_entry_totals = calculator::compute_entry_costs(&self.diesel_entries)?;
        let running_km = calculator::running_km(self.starting_km, self.closing_km);

        let mut issues = Vec::new();
        if running_km.is_none() {
            issues.push(FieldError::new(
                "closing_km",
                "Closing KM must be greater than or equal to Starting KM",
            ));
        }

        Ok(CalculationResponse {
            running_km,
            diesel_entry_totals,
            financials,
            profit_loss_display: format_inr(financials.profit_loss),
            issues,
        })
    }
}

// Response DTOs

#[derive(Debug, Serialize)]
pub struct CalculationResponse {
    pub running_km: Option<Decimal>,
    pub diesel_entry_totals: Vec<Decimal>,
    #[serde(flatten)]
    pub financials: TripFinancials,
    pub profit_loss_display: String,
    pub issues: Vec<FieldError>,
}

#[derive(Debug, Serialize)]
pub struct DieselEntryResponse {
    pub id: i64,
    #[serde(flatten)]
    pub entry: DieselEntry,
    pub total_cost: Decimal,
}

impl From<DieselEntryRow> for DieselEntryResponse {
    fn from(row: DieselEntryRow) -> Self {
        Self {
            id: row.id,
            entry: row.entry,
            total_cost: row.total_cost,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TripResponse {
    pub id: i64,
    pub trip_number: String,
    pub truck_name: String,
    pub truck_number: String,
    pub driver1_name: String,
    pub driver2_name: Option<String>,
    pub loading_point: String,
    pub unloading_point: String,
    pub start_date: NaiveDate,
    pub unloading_date: NaiveDate,
    pub eway_bill: Option<String>,
    pub lr_number: Option<String>,
    pub starting_km: Decimal,
    pub closing_km: Decimal,
    pub running_km: Decimal,
    #[serde(flatten)]
    pub charges: TripCharges,
    pub other_expenses_text: Option<String>,
    pub agent_name: Option<String>,
    pub agent_mobile: Option<String>,
    pub diesel_entries: Vec<DieselEntryResponse>,
    #[serde(flatten)]
    pub financials: TripFinancials,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TripResponse {
    pub fn from_row(row: TripRow, diesel_entries: Vec<DieselEntryRow>) -> Result<Self, AppError> {
        let charges = row.charges()?;
        let financials = row.financials();
        Ok(Self {
            id: row.id,
            trip_number: row.trip_number,
            truck_name: row.truck_name,
            truck_number: row.truck_number,
            driver1_name: row.driver1_name,
            driver2_name: row.driver2_name,
            loading_point: row.loading_point,
            unloading_point: row.unloading_point,
            start_date: row.start_date,
            unloading_date: row.unloading_date,
            eway_bill: row.eway_bill,
            lr_number: row.lr_number,
            starting_km: row.starting_km,
            closing_km: row.closing_km,
            running_km: row.running_km,
            charges,
            other_expenses_text: row.other_expenses_text,
            agent_name: row.agent_name,
            agent_mobile: row.agent_mobile,
            diesel_entries: diesel_entries.into_iter().map(DieselEntryResponse::from).collect(),
            financials,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TripSummaryResponse {
    pub id: i64,
    pub trip_number: String,
    pub truck_name: String,
    pub truck_number: String,
    pub driver1_name: String,
    pub loading_point: String,
    pub unloading_point: String,
    pub start_date: NaiveDate,
    pub start_date_display: String,
    pub unloading_date: NaiveDate,
    pub rent: Decimal,
    pub total_expenses: Decimal,
    pub profit_loss: Decimal,
    pub profit_loss_display: String,
    pub last_updated: DateTime<Utc>,
}

impl From<TripSummary> for TripSummaryResponse {
    fn from(t: TripSummary) -> Self {
        Self {
            id: t.id,
            start_date_display: format_date(t.start_date),
            profit_loss_display: format_inr(t.profit_loss),
            trip_number: t.trip_number,
            truck_name: t.truck_name,
            truck_number: t.truck_number,
            driver1_name: t.driver1_name,
            loading_point: t.loading_point,
            unloading_point: t.unloading_point,
            start_date: t.start_date,
            unloading_date: t.unloading_date,
            rent: t.rent,
            total_expenses: t.total_expenses,
            profit_loss: t.profit_loss,
            last_updated: t.updated_at,
        }
    }
}
