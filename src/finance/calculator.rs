//! Trip financial calculator.
//!
//! Every money field a trip shows besides its raw inputs is derived here.
//! [`derive_financials`] evaluates the derivations in dependency order:
//! diesel cost, agent commission, driver bata, then the expense and
//! profit totals. Callers invoke it again after any raw-field change;
//! nothing is cached between calls.
//!
//! Arithmetic is checked. A result outside `Decimal`'s range comes back
//! as an [`AmountOverflow`] naming the input it was derived from.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// How a percentage or fixed charge was entered. Stored as the
/// `charge_basis` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "charge_basis", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChargeBasis {
    Percentage,
    Fixed,
}

/// Driver allowance policy for one trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DriverBata {
    Percentage { percent: Decimal },
    Fixed { amount: Decimal },
}

impl DriverBata {
    pub fn basis(&self) -> ChargeBasis {
        match self {
            DriverBata::Percentage { .. } => ChargeBasis::Percentage,
            DriverBata::Fixed { .. } => ChargeBasis::Fixed,
        }
    }

    pub fn percent(&self) -> Option<Decimal> {
        match self {
            DriverBata::Percentage { percent } => Some(*percent),
            DriverBata::Fixed { .. } => None,
        }
    }
}

impl Default for DriverBata {
    fn default() -> Self {
        DriverBata::Percentage { percent: Decimal::TEN }
    }
}

/// Booking agent commission policy for one trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentCommission {
    Percentage { percent: Decimal },
    Fixed { amount: Decimal },
}

impl AgentCommission {
    pub fn basis(&self) -> ChargeBasis {
        match self {
            AgentCommission::Percentage { .. } => ChargeBasis::Percentage,
            AgentCommission::Fixed { .. } => ChargeBasis::Fixed,
        }
    }

    pub fn percent(&self) -> Option<Decimal> {
        match self {
            AgentCommission::Percentage { percent } => Some(*percent),
            AgentCommission::Fixed { .. } => None,
        }
    }
}

impl Default for AgentCommission {
    fn default() -> Self {
        AgentCommission::Fixed { amount: Decimal::ZERO }
    }
}

/// What a percentage driver bata is taken of. One value is configured per
/// deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BataBase {
    #[default]
    Rent,
    NetOfCommission,
}

impl FromStr for BataBase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rent" => Ok(BataBase::Rent),
            "net_of_commission" => Ok(BataBase::NetOfCommission),
            other => Err(format!("unknown driver bata base '{other}', expected 'rent' or 'net_of_commission'")),
        }
    }
}

/// A derived amount did not fit in a `Decimal`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} is too large to calculate with")]
pub struct AmountOverflow {
    pub field: String,
}

impl AmountOverflow {
    fn on(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }
}

/// A single fuel purchase as far as costing is concerned.
pub trait FuelPurchase {
    fn litres_purchased(&self) -> Decimal;
    fn price_per_litre(&self) -> Decimal;

    /// `None` when the product overflows.
    fn total_cost(&self) -> Option<Decimal> {
        self.litres_purchased().checked_mul(self.price_per_litre())
    }
}

/// Raw charge inputs of a trip, everything the totals depend on except
/// the diesel entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TripCharges {
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
}

/// The ten line items that make up a trip's expenses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostComponents {
    pub loading_halt_cost: Decimal,
    pub unloading_halt_cost: Decimal,
    pub driver_bata_amount: Decimal,
    pub agent_commission_amount: Decimal,
    pub diesel_cost: Decimal,
    pub fastag_charges: Decimal,
    pub def_charges: Decimal,
    pub rto_charges: Decimal,
    pub other_expenses_amount: Decimal,
    pub police_commission: Decimal,
}

impl CostComponents {
    /// `None` when the sum overflows.
    pub fn total(&self) -> Option<Decimal> {
        [
            self.loading_halt_cost,
            self.unloading_halt_cost,
            self.driver_bata_amount,
            self.agent_commission_amount,
            self.diesel_cost,
            self.fastag_charges,
            self.def_charges,
            self.rto_charges,
            self.other_expenses_amount,
            self.police_commission,
        ]
        .into_iter()
        .try_fold(Decimal::ZERO, Decimal::checked_add)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totals {
    pub total_expenses: Decimal,
    pub profit_loss: Decimal,
}

/// Every derived money field of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TripFinancials {
    pub diesel_cost: Decimal,
    pub driver_bata_amount: Decimal,
    pub agent_commission_amount: Decimal,
    pub total_expenses: Decimal,
    pub profit_loss: Decimal,
}

fn percent_of(amount: Decimal, percent: Decimal) -> Option<Decimal> {
    amount.checked_mul(percent)?.checked_div(Decimal::ONE_HUNDRED)
}

/// `litres × price` of each entry, in input order.
pub fn compute_entry_costs<T: FuelPurchase>(entries: &[T]) -> Result<Vec<Decimal>, AmountOverflow> {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| e.total_cost().ok_or_else(|| AmountOverflow::on(format!("diesel_entries[{i}]"))))
        .collect()
}

pub fn compute_diesel_cost<T: FuelPurchase>(entries: &[T]) -> Result<Decimal, AmountOverflow> {
    compute_entry_costs(entries)?
        .into_iter()
        .try_fold(Decimal::ZERO, Decimal::checked_add)
        .ok_or_else(|| AmountOverflow::on("diesel_entries"))
}

pub fn compute_agent_commission(
    rent: Decimal,
    commission: &AgentCommission,
) -> Result<Decimal, AmountOverflow> {
    match *commission {
        AgentCommission::Percentage { percent } => {
            percent_of(rent, percent).ok_or_else(|| AmountOverflow::on("agent_commission"))
        }
        AgentCommission::Fixed { amount } => Ok(amount),
    }
}

/// `agent_commission` is only read when `base` is [`BataBase::NetOfCommission`].
pub fn compute_driver_bata(
    rent: Decimal,
    bata: &DriverBata,
    base: BataBase,
    agent_commission: Decimal,
) -> Result<Decimal, AmountOverflow> {
    match *bata {
        DriverBata::Fixed { amount } => Ok(amount),
        DriverBata::Percentage { percent } => {
            let base_amount = match base {
                BataBase::Rent => Some(rent),
                BataBase::NetOfCommission => rent.checked_sub(agent_commission),
            };
            base_amount
                .and_then(|b| percent_of(b, percent))
                .ok_or_else(|| AmountOverflow::on("driver_bata"))
        }
    }
}

pub fn compute_totals(rent: Decimal, costs: &CostComponents) -> Result<Totals, AmountOverflow> {
    let total_expenses = costs.total().ok_or_else(|| AmountOverflow::on("total_expenses"))?;
    let profit_loss = rent
        .checked_sub(total_expenses)
        .ok_or_else(|| AmountOverflow::on("profit_loss"))?;
    Ok(Totals { total_expenses, profit_loss })
}

pub fn derive_financials<T: FuelPurchase>(
    charges: &TripCharges,
    diesel_entries: &[T],
    base: BataBase,
) -> Result<TripFinancials, AmountOverflow> {
    let diesel_cost = compute_diesel_cost(diesel_entries)?;
    let agent_commission_amount = compute_agent_commission(charges.rent, &charges.agent_commission)?;
    let driver_bata_amount =
        compute_driver_bata(charges.rent, &charges.driver_bata, base, agent_commission_amount)?;

    let costs = CostComponents {
        loading_halt_cost: charges.loading_halt_cost,
        unloading_halt_cost: charges.unloading_halt_cost,
        driver_bata_amount,
        agent_commission_amount,
        diesel_cost,
        fastag_charges: charges.fastag_charges,
        def_charges: charges.def_charges,
        rto_charges: charges.rto_charges,
        other_expenses_amount: charges.other_expenses_amount,
        police_commission: charges.police_commission,
    };
    let totals = compute_totals(charges.rent, &costs)?;

    Ok(TripFinancials {
        diesel_cost,
        driver_bata_amount,
        agent_commission_amount,
        total_expenses: totals.total_expenses,
        profit_loss: totals.profit_loss,
    })
}

/// Distance covered, or `None` when the odometer readings are reversed
/// (or too far apart to subtract).
pub fn running_km(starting_km: Decimal, closing_km: Decimal) -> Option<Decimal> {
    if closing_km < starting_km {
        return None;
    }
    closing_km.checked_sub(starting_km)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    struct Fill(Decimal, Decimal);

    impl FuelPurchase for Fill {
        fn litres_purchased(&self) -> Decimal {
            self.0
        }
        fn price_per_litre(&self) -> Decimal {
            self.1
        }
    }

    fn sample_charges() -> TripCharges {
        TripCharges {
            rent: d("25000"),
            loading_halt_cost: d("1500"),
            unloading_halt_cost: d("1200"),
            fastag_charges: d("1000"),
            def_charges: d("500"),
            rto_charges: d("800"),
            police_commission: d("300"),
            other_expenses_amount: d("1500"),
            driver_bata: DriverBata::Percentage { percent: d("10") },
            agent_commission: AgentCommission::Fixed { amount: d("1250") },
        }
    }

    fn sample_fills() -> Vec<Fill> {
        vec![Fill(d("120"), d("90.5")), Fill(d("80"), d("91.2"))]
    }

    #[test]
    fn diesel_cost_sums_each_fill() {
        assert_eq!(compute_diesel_cost(&sample_fills()), Ok(d("18156")));
        assert_eq!(compute_diesel_cost::<Fill>(&[]), Ok(Decimal::ZERO));
    }

    #[test]
    fn diesel_cost_is_not_rounded() {
        let fills = vec![Fill(d("10.5"), d("93.37"))];
        assert_eq!(compute_diesel_cost(&fills), Ok(d("980.385")));
    }

    #[test]
    fn worked_trip_with_bata_on_rent() {
        let f = derive_financials(&sample_charges(), &sample_fills(), BataBase::Rent).unwrap();
        assert_eq!(f.diesel_cost, d("18156"));
        assert_eq!(f.driver_bata_amount, d("2500"));
        assert_eq!(f.agent_commission_amount, d("1250"));
        assert_eq!(f.total_expenses, d("28706"));
        assert_eq!(f.profit_loss, d("-3706"));
    }

    #[test]
    fn worked_trip_with_bata_net_of_commission() {
        let f = derive_financials(&sample_charges(), &sample_fills(), BataBase::NetOfCommission).unwrap();
        assert_eq!(f.driver_bata_amount, d("2375"));
        assert_eq!(f.total_expenses, d("28581"));
        assert_eq!(f.profit_loss, d("-3581"));
    }

    #[test]
    fn fixed_bata_ignores_rent_and_base() {
        let bata = DriverBata::Fixed { amount: d("1800") };
        assert_eq!(compute_driver_bata(d("25000"), &bata, BataBase::Rent, d("0")), Ok(d("1800")));
        assert_eq!(compute_driver_bata(d("0"), &bata, BataBase::NetOfCommission, d("999")), Ok(d("1800")));
    }

    #[test]
    fn percentage_commission_is_taken_of_rent() {
        let commission = AgentCommission::Percentage { percent: d("5") };
        assert_eq!(compute_agent_commission(d("25000"), &commission), Ok(d("1250")));
        let fixed = AgentCommission::Fixed { amount: d("700") };
        assert_eq!(compute_agent_commission(d("25000"), &fixed), Ok(d("700")));
    }

    #[test]
    fn commission_feeds_bata_when_net_of_commission() {
        let mut charges = sample_charges();
        charges.agent_commission = AgentCommission::Percentage { percent: d("4") };
        let f = derive_financials(&charges, &sample_fills(), BataBase::NetOfCommission).unwrap();
        assert_eq!(f.agent_commission_amount, d("1000"));
        assert_eq!(f.driver_bata_amount, d("2400"));
    }

    #[test]
    fn each_component_moves_total_by_its_delta() {
        let base = CostComponents {
            loading_halt_cost: d("1500"),
            unloading_halt_cost: d("1200"),
            driver_bata_amount: d("2500"),
            agent_commission_amount: d("1250"),
            diesel_cost: d("18156"),
            fastag_charges: d("1000"),
            def_charges: d("500"),
            rto_charges: d("800"),
            other_expenses_amount: d("1500"),
            police_commission: d("300"),
        };
        let before = compute_totals(d("25000"), &base).unwrap();
        let delta = d("123.45");

        for field in 0..10 {
            let mut costs = base.clone();
            let slot = match field {
                0 => &mut costs.loading_halt_cost,
                1 => &mut costs.unloading_halt_cost,
                2 => &mut costs.driver_bata_amount,
                3 => &mut costs.agent_commission_amount,
                4 => &mut costs.diesel_cost,
                5 => &mut costs.fastag_charges,
                6 => &mut costs.def_charges,
                7 => &mut costs.rto_charges,
                8 => &mut costs.other_expenses_amount,
                _ => &mut costs.police_commission,
            };
            *slot += delta;
            let after = compute_totals(d("25000"), &costs).unwrap();
            assert_eq!(after.total_expenses - before.total_expenses, delta);
            assert_eq!(before.profit_loss - after.profit_loss, delta);
        }
    }

    #[test]
    fn zero_rent_is_a_loss() {
        let mut charges = sample_charges();
        charges.rent = Decimal::ZERO;
        let f = derive_financials(&charges, &sample_fills(), BataBase::Rent).unwrap();
        assert_eq!(f.driver_bata_amount, Decimal::ZERO);
        assert_eq!(f.profit_loss, -f.total_expenses);
        assert!(f.profit_loss < Decimal::ZERO);
    }

    #[test]
    fn recomputing_is_idempotent() {
        let charges = sample_charges();
        let fills = sample_fills();
        let first = derive_financials(&charges, &fills, BataBase::Rent).unwrap();
        let second = derive_financials(&charges, &fills, BataBase::Rent).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn oversized_fill_is_reported_on_its_entry() {
        let fills = vec![Fill(d("10"), d("90")), Fill(d("1000000000000000"), d("1000000000000000"))];
        assert_eq!(
            compute_diesel_cost(&fills),
            Err(AmountOverflow { field: "diesel_entries[1]".into() })
        );
    }

    #[test]
    fn overflow_surfaces_instead_of_panicking() {
        let mut charges = sample_charges();
        charges.rent = Decimal::MAX;
        let err = derive_financials(&charges, &sample_fills(), BataBase::Rent).unwrap_err();
        assert_eq!(err.field, "driver_bata");

        let mut charges = sample_charges();
        charges.fastag_charges = Decimal::MAX;
        let err = derive_financials(&charges, &sample_fills(), BataBase::Rent).unwrap_err();
        assert_eq!(err.field, "total_expenses");

        let mut charges = sample_charges();
        charges.rent = Decimal::MIN;
        charges.driver_bata = DriverBata::Fixed { amount: d("1800") };
        let err = derive_financials(&charges, &sample_fills(), BataBase::Rent).unwrap_err();
        assert_eq!(err.field, "profit_loss");
    }

    #[test]
    fn running_km_rejects_reversed_readings() {
        assert_eq!(running_km(d("1000"), d("1450.5")), Some(d("450.5")));
        assert_eq!(running_km(d("1000"), d("1000")), Some(Decimal::ZERO));
        assert_eq!(running_km(d("1000"), d("999")), None);
        assert_eq!(running_km(Decimal::MIN, Decimal::MAX), None);
    }

    #[test]
    fn policy_json_is_tagged() {
        let bata: DriverBata = serde_json::from_str(r#"{"type":"fixed","amount":1500}"#).unwrap();
        assert_eq!(bata, DriverBata::Fixed { amount: d("1500") });
        let commission: AgentCommission =
            serde_json::from_str(r#"{"type":"percentage","percent":2.5}"#).unwrap();
        assert_eq!(commission.percent(), Some(d("2.5")));
        assert_eq!(commission.basis(), ChargeBasis::Percentage);
        assert!(serde_json::from_str::<DriverBata>(r#"{"type":"fixed"}"#).is_err());
    }

    #[test]
    fn bata_base_parses_from_config() {
        assert_eq!("rent".parse::<BataBase>(), Ok(BataBase::Rent));
        assert_eq!(" Net_Of_Commission ".parse::<BataBase>(), Ok(BataBase::NetOfCommission));
        assert!("gross".parse::<BataBase>().is_err());
    }
}
