//! Preference schedules: per-unit valuations for one agent.
//!
//! A buyer's schedule is its redemption value for each additional unit and
//! never increases (diminishing marginal value). A seller's schedule is its
//! cost for each additional unit and never decreases (rising marginal cost).
//!
//! Generation walks units `1..=num_units`, perturbing a drifting reference
//! value with bounded uniform noise:
//!
//! ```text
//! candidate_i = max(1, current_i + U(-noise, +noise) * current_i)
//! value_i     = min(candidate_i, value_{i-1})   // buyer
//! value_i     = max(candidate_i, value_{i-1})   // seller
//! current_i+1 = current_i * U(drift.low, drift.high)
//! ```
//!
//! Values are drawn once when the schedule is built and never regenerated.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::EconError;
use crate::orders::Side;
use crate::types::{Price, Unit};

// === CONSTANTS ===

pub const DEFAULT_NOISE_FACTOR: f64 = 0.1;

/// Buyers start with this multiple of their total valuation in cash.
pub const DEFAULT_ENDOWMENT_FACTOR: f64 = 1.2;

/// Floor for every generated valuation.
pub const MIN_UNIT_VALUE: Price = 1.0;

/// Buyers' reference value slides gently down from unit to unit.
pub const BUYER_DRIFT: DriftBounds = DriftBounds {
    low: 0.95,
    high: 1.0,
};

/// Sellers' reference value creeps gently up from unit to unit.
pub const SELLER_DRIFT: DriftBounds = DriftBounds {
    low: 1.0,
    high: 1.05,
};

// === CONFIG ===

/// Range of the per-unit multiplicative drift applied to the reference value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftBounds {
    pub low: f64,
    pub high: f64,
}

impl DriftBounds {
    pub fn validate(&self) -> Result<(), EconError> {
        let finite = self.low.is_finite() && self.high.is_finite();
        if finite && 0.0 < self.low && self.low <= self.high {
            Ok(())
        } else {
            Err(EconError::InvalidDrift {
                low: self.low,
                high: self.high,
            })
        }
    }
}

fn default_noise_factor() -> f64 {
    DEFAULT_NOISE_FACTOR
}

fn default_endowment_factor() -> f64 {
    DEFAULT_ENDOWMENT_FACTOR
}

fn default_is_buyer() -> bool {
    true
}

/// Parameters for generating a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub num_units: u32,
    /// Reference value of the first unit.
    pub base_value: Price,
    /// Half-width of the noise band, as a fraction of the reference value.
    #[serde(default = "default_noise_factor")]
    pub noise_factor: f64,
    #[serde(default = "default_is_buyer")]
    pub is_buyer: bool,
    /// Buyers only.
    #[serde(default = "default_endowment_factor")]
    pub endowment_factor: f64,
    /// Overrides the role's default drift (`BUYER_DRIFT` / `SELLER_DRIFT`).
    #[serde(default)]
    pub drift: Option<DriftBounds>,
}

impl ScheduleConfig {
    pub fn buyer(num_units: u32, base_value: Price) -> Self {
        Self {
            num_units,
            base_value,
            noise_factor: DEFAULT_NOISE_FACTOR,
            is_buyer: true,
            endowment_factor: DEFAULT_ENDOWMENT_FACTOR,
            drift: None,
        }
    }

    pub fn seller(num_units: u32, base_value: Price) -> Self {
        Self {
            is_buyer: false,
            ..Self::buyer(num_units, base_value)
        }
    }

    pub fn with_noise(mut self, noise_factor: f64) -> Self {
        self.noise_factor = noise_factor;
        self
    }

    pub fn with_endowment_factor(mut self, endowment_factor: f64) -> Self {
        self.endowment_factor = endowment_factor;
        self
    }

    pub fn with_drift(mut self, low: f64, high: f64) -> Self {
        self.drift = Some(DriftBounds { low, high });
        self
    }

    fn side(&self) -> Side {
        if self.is_buyer { Side::Buy } else { Side::Sell }
    }

    /// Drift in effect for the given side.
    pub fn drift_for(&self, side: Side) -> DriftBounds {
        self.drift.unwrap_or(match side {
            Side::Buy => BUYER_DRIFT,
            Side::Sell => SELLER_DRIFT,
        })
    }

    /// Check every parameter, reporting the first one out of range.
    pub fn validate(&self) -> Result<(), EconError> {
        if self.num_units < 1 {
            return Err(EconError::InvalidNumUnits(self.num_units));
        }
        if !(self.base_value.is_finite() && self.base_value > 0.0) {
            return Err(EconError::InvalidBaseValue(self.base_value));
        }
        if !(0.0..1.0).contains(&self.noise_factor) {
            return Err(EconError::InvalidNoiseFactor(self.noise_factor));
        }
        if !(self.endowment_factor.is_finite() && self.endowment_factor >= 0.0) {
            return Err(EconError::InvalidEndowmentFactor(self.endowment_factor));
        }
        if let Some(drift) = &self.drift {
            drift.validate()?;
        }
        Ok(())
    }
}

// === CAPABILITY ===

mod sealed {
    pub trait Sealed {}
}

/// What a strategy needs from an agent's valuations.
///
/// Sealed: the buyer and seller schedules (and `Schedule`, which wraps
/// either) are the only implementations.
pub trait PreferenceSchedule: sealed::Sealed {
    /// Valuation per unit index, `1..=num_units`.
    fn values(&self) -> &BTreeMap<Unit, Price>;

    /// Cash-equivalent the agent starts with.
    fn initial_endowment(&self) -> Price;

    fn is_buyer(&self) -> bool;

    /// Valuation of the `quantity`-th unit, or 0.0 past the end of the schedule.
    fn get_value(&self, quantity: Unit) -> Price {
        self.values().get(&quantity).copied().unwrap_or(0.0)
    }

    /// `get_value` for callers holding a float; fractional or negative
    /// quantities read as 0.0.
    fn value_at(&self, quantity: f64) -> Price {
        if quantity.fract() != 0.0 || quantity < 1.0 || quantity > Unit::MAX as f64 {
            return 0.0;
        }
        self.get_value(quantity as Unit)
    }

    fn num_units(&self) -> u32 {
        self.values().len() as u32
    }

    fn total_value(&self) -> Price {
        self.values().values().sum()
    }

    /// Points for plotting the schedule.
    fn curve(&self) -> ScheduleCurve {
        ScheduleCurve {
            label: if self.is_buyer() { "Demand" } else { "Supply" }.to_string(),
            is_buyer: self.is_buyer(),
            points: self.values().iter().map(|(u, v)| (*u, *v)).collect(),
            initial_endowment: self.initial_endowment(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct ScheduleCurve {
    pub label: String,
    pub is_buyer: bool,
    pub points: Vec<(Unit, Price)>,
    pub initial_endowment: Price,
}

// === GENERATION ===

fn sample<R: Rng>(rng: &mut R, low: f64, high: f64) -> f64 {
    if low < high {
        rng.random_range(low..=high)
    } else {
        low
    }
}

/// Draw a monotone valuation curve: non-increasing for buyers,
/// non-decreasing for sellers, never below `MIN_UNIT_VALUE`.
fn generate_values<R: Rng>(
    config: &ScheduleConfig,
    side: Side,
    drift: DriftBounds,
    rng: &mut R,
) -> BTreeMap<Unit, Price> {
    let mut values = BTreeMap::new();
    let mut current = config.base_value;
    let mut previous: Option<Price> = None;

    for unit in 1..=config.num_units {
        let noise = sample(rng, -config.noise_factor, config.noise_factor) * current;
        let candidate = (current + noise).max(MIN_UNIT_VALUE);
        let value = match (previous, side) {
            (None, _) => candidate,
            (Some(prev), Side::Buy) => candidate.min(prev),
            (Some(prev), Side::Sell) => candidate.max(prev),
        };
        values.insert(unit, value);
        previous = Some(value);

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "schedule",
            buyer = matches!(side, Side::Buy),
            unit,
            reference = current,
            value,
        );

        current *= sample(rng, drift.low, drift.high);
    }

    values
}

// === BUYER ===

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuyerPreferenceSchedule {
    base_value: Price,
    noise_factor: f64,
    endowment_factor: f64,
    drift: DriftBounds,
    values: BTreeMap<Unit, Price>,
    initial_endowment: Price,
}

impl BuyerPreferenceSchedule {
    /// Generate from the thread-local RNG. `config.is_buyer` is not consulted.
    pub fn generate(config: &ScheduleConfig) -> Result<Self, EconError> {
        Self::generate_with(config, &mut rand::rng())
    }

    pub fn generate_with<R: Rng>(
        config: &ScheduleConfig,
        rng: &mut R,
    ) -> Result<Self, EconError> {
        config.validate()?;
        let drift = config.drift_for(Side::Buy);
        let values = generate_values(config, Side::Buy, drift, rng);
        let initial_endowment = values.values().sum::<Price>() * config.endowment_factor;
        Ok(Self {
            base_value: config.base_value,
            noise_factor: config.noise_factor,
            endowment_factor: config.endowment_factor,
            drift,
            values,
            initial_endowment,
        })
    }

    pub fn base_value(&self) -> Price {
        self.base_value
    }

    pub fn noise_factor(&self) -> f64 {
        self.noise_factor
    }

    pub fn endowment_factor(&self) -> f64 {
        self.endowment_factor
    }

    pub fn drift(&self) -> DriftBounds {
        self.drift
    }
}

impl sealed::Sealed for BuyerPreferenceSchedule {}

impl PreferenceSchedule for BuyerPreferenceSchedule {
    fn values(&self) -> &BTreeMap<Unit, Price> {
        &self.values
    }

    fn initial_endowment(&self) -> Price {
        self.initial_endowment
    }

    fn is_buyer(&self) -> bool {
        true
    }
}

// === SELLER ===

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellerPreferenceSchedule {
    base_value: Price,
    noise_factor: f64,
    drift: DriftBounds,
    values: BTreeMap<Unit, Price>,
    initial_endowment: Price,
}

impl SellerPreferenceSchedule {
    /// Generate from the thread-local RNG. `config.is_buyer` and
    /// `config.endowment_factor` are not consulted.
    pub fn generate(config: &ScheduleConfig) -> Result<Self, EconError> {
        Self::generate_with(config, &mut rand::rng())
    }

    pub fn generate_with<R: Rng>(
        config: &ScheduleConfig,
        rng: &mut R,
    ) -> Result<Self, EconError> {
        config.validate()?;
        let drift = config.drift_for(Side::Sell);
        let values = generate_values(config, Side::Sell, drift, rng);
        // Goods in hand valued at cost
        let initial_endowment = values.values().sum();
        Ok(Self {
            base_value: config.base_value,
            noise_factor: config.noise_factor,
            drift,
            values,
            initial_endowment,
        })
    }

    pub fn base_value(&self) -> Price {
        self.base_value
    }

    pub fn noise_factor(&self) -> f64 {
        self.noise_factor
    }

    pub fn drift(&self) -> DriftBounds {
        self.drift
    }
}

impl sealed::Sealed for SellerPreferenceSchedule {}

impl PreferenceSchedule for SellerPreferenceSchedule {
    fn values(&self) -> &BTreeMap<Unit, Price> {
        &self.values
    }

    fn initial_endowment(&self) -> Price {
        self.initial_endowment
    }

    fn is_buyer(&self) -> bool {
        false
    }
}

// === EITHER ROLE ===

/// A schedule of whichever role `ScheduleConfig::is_buyer` selects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Schedule {
    Buyer(BuyerPreferenceSchedule),
    Seller(SellerPreferenceSchedule),
}

impl Schedule {
    pub fn generate(config: &ScheduleConfig) -> Result<Self, EconError> {
        Self::generate_with(config, &mut rand::rng())
    }

    pub fn generate_with<R: Rng>(
        config: &ScheduleConfig,
        rng: &mut R,
    ) -> Result<Self, EconError> {
        match config.side() {
            Side::Buy => BuyerPreferenceSchedule::generate_with(config, rng).map(Schedule::Buyer),
            Side::Sell => {
                SellerPreferenceSchedule::generate_with(config, rng).map(Schedule::Seller)
            }
        }
    }
}

impl sealed::Sealed for Schedule {}

impl PreferenceSchedule for Schedule {
    fn values(&self) -> &BTreeMap<Unit, Price> {
        match self {
            Schedule::Buyer(s) => s.values(),
            Schedule::Seller(s) => s.values(),
        }
    }

    fn initial_endowment(&self) -> Price {
        match self {
            Schedule::Buyer(s) => s.initial_endowment(),
            Schedule::Seller(s) => s.initial_endowment(),
        }
    }

    fn is_buyer(&self) -> bool {
        matches!(self, Schedule::Buyer(_))
    }
}
