use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use crate::finance::calculator::{
    AgentCommission, ChargeBasis, DriverBata, FuelPurchase, TripCharges, TripFinancials,
};

/// One fuel purchase on a trip, as entered in the trip form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DieselEntry {
    #[sqlx(rename = "purchase_date")]
    pub date: NaiveDate,
    #[sqlx(rename = "purchase_time")]
    #[serde(with = "clock_time")]
    pub time: NaiveTime,
    pub location: String,
    pub litres_purchased: Decimal,
    pub price_per_litre: Decimal,
}

impl FuelPurchase for DieselEntry {
    fn litres_purchased(&self) -> Decimal {
        self.litres_purchased
    }

    fn price_per_litre(&self) -> Decimal {
        self.price_per_litre
    }
}

/// Full `trips` row.
#[derive(Debug, Clone, FromRow)]
pub struct TripRow {
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
    pub rent: Decimal,
    pub loading_halt_cost: Decimal,
    pub unloading_halt_cost: Decimal,
    pub fastag_charges: Decimal,
    pub def_charges: Decimal,
    pub rto_charges: Decimal,
    pub police_commission: Decimal,
    pub other_expenses_amount: Decimal,
    pub other_expenses_text: Option<String>,
    pub driver_bata_type: ChargeBasis,
    pub driver_bata_percent: Option<Decimal>,
    pub driver_bata_amount: Decimal,
    pub agent_name: Option<String>,
    pub agent_mobile: Option<String>,
    pub agent_commission_type: ChargeBasis,
    pub agent_commission_percent: Option<Decimal>,
    pub agent_commission_amount: Decimal,
    pub diesel_cost: Decimal,
    pub total_expenses: Decimal,
    pub profit_loss: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TripRow {
    /// Rebuilds the tagged bata/commission policies from their flat columns.
    pub fn charges(&self) -> Result<TripCharges, AppError> {
        let driver_bata = match (self.driver_bata_type, self.driver_bata_percent) {
            (ChargeBasis::Percentage, Some(percent)) => DriverBata::Percentage { percent },
            (ChargeBasis::Percentage, None) => {
                return Err(AppError::internal(format!(
                    "trip {} has percentage driver bata without a percent",
                    self.id
                )))
            }
            (ChargeBasis::Fixed, _) => DriverBata::Fixed { amount: self.driver_bata_amount },
        };

        let agent_commission = match (self.agent_commission_type, self.agent_commission_percent) {
            (ChargeBasis::Percentage, Some(percent)) => AgentCommission::Percentage { percent },
            (ChargeBasis::Percentage, None) => {
                return Err(AppError::internal(format!(
                    "trip {} has percentage agent commission without a percent",
                    self.id
                )))
            }
            (ChargeBasis::Fixed, _) => AgentCommission::Fixed { amount: self.agent_commission_amount },
        };

        Ok(TripCharges {
            rent: self.rent,
            loading_halt_cost: self.loading_halt_cost,
            unloading_halt_cost: self.unloading_halt_cost,
            fastag_charges: self.fastag_charges,
            def_charges: self.def_charges,
            rto_charges: self.rto_charges,
            police_commission: self.police_commission,
            other_expenses_amount: self.other_expenses_amount,
            driver_bata,
            agent_commission,
        })
    }

    pub fn financials(&self) -> TripFinancials {
        TripFinancials {
            diesel_cost: self.diesel_cost,
            driver_bata_amount: self.driver_bata_amount,
            agent_commission_amount: self.agent_commission_amount,
            total_expenses: self.total_expenses,
            profit_loss: self.profit_loss,
        }
    }
}

/// `diesel_entries` row.
#[derive(Debug, Clone, FromRow)]
pub struct DieselEntryRow {
    pub id: i64,
    #[sqlx(flatten)]
    pub entry: DieselEntry,
    pub total_cost: Decimal,
}

/// The slice of a trip that dashboards, truck tiles and analytics read.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct TripSummary {
    pub id: i64,
    pub trip_number: String,
    pub truck_name: String,
    pub truck_number: String,
    pub driver1_name: String,
    pub loading_point: String,
    pub unloading_point: String,
    pub start_date: NaiveDate,
    pub unloading_date: NaiveDate,
    pub rent: Decimal,
    pub total_expenses: Decimal,
    pub profit_loss: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Every scalar column written for a trip, derived fields included.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
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
    pub agent_name: Option<String>,
    pub agent_mobile: Option<String>,
    pub other_expenses_text: Option<String>,
    pub charges: TripCharges,
    pub financials: TripFinancials,
}

/// Accepts `HH:MM` as typed in the trip form as well as `HH:MM:SS`.
/// Writes `HH:MM`, keeping the seconds only when there are any.
mod clock_time {
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        let pattern = if time.second() == 0 { "%H:%M" } else { "%H:%M:%S" };
        serializer.serialize_str(&time.format(pattern).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|_| serde::de::Error::custom(format!("invalid time '{raw}', expected HH:MM")))
    }
}
