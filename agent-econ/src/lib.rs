use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

pub mod endowment;
pub mod error;
pub mod goods;
pub mod orders;
pub mod schedule;
pub mod types;

pub use endowment::*;
pub use error::*;
pub use goods::*;
pub use orders::*;
pub use schedule::*;
pub use types::*;

#[cfg(feature = "instrument")]
pub use instrument;

// ============================================================================
// WASM API - one agent's economic state
// ============================================================================

/// Snapshot of an agent's holdings for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct BasketSnapshot {
    pub agent_id: String,
    pub cash: f64,
    pub goods: Vec<(String, f64)>,
    pub trade_count: usize,
}

/// An agent's ledger and valuations behind a JS-friendly handle.
#[wasm_bindgen]
pub struct AgentState {
    endowment: Endowment,
    schedule: Schedule,
}

#[wasm_bindgen]
impl AgentState {
    /// `initial_basket` is `{cash, goods: [{name, quantity}]}`; `schedule` is a
    /// `ScheduleConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(
        agent_id: String,
        initial_basket: JsValue,
        schedule: JsValue,
    ) -> Result<AgentState, JsError> {
        // Better panic messages in browser console
        console_error_panic_hook::set_once();

        let basket: Basket =
            serde_wasm_bindgen::from_value(initial_basket).map_err(EconError::from)?;
        let config: ScheduleConfig =
            serde_wasm_bindgen::from_value(schedule).map_err(EconError::from)?;
        Ok(Self::build(agent_id, basket, &config)?)
    }

    /// Same as the constructor, from JSON strings.
    #[wasm_bindgen]
    pub fn from_json(
        agent_id: String,
        initial_basket_json: &str,
        schedule_json: &str,
    ) -> Result<AgentState, JsError> {
        Ok(Self::build_from_json(agent_id, initial_basket_json, schedule_json)?)
    }

    #[wasm_bindgen(getter)]
    pub fn agent_id(&self) -> String {
        self.endowment.agent_id().to_string()
    }

    /// Record a trade. Trades this agent isn't party to are kept but change nothing.
    #[wasm_bindgen]
    pub fn add_trade(&mut self, trade: JsValue) -> Result<(), JsError> {
        let trade: Trade = serde_wasm_bindgen::from_value(trade).map_err(EconError::from)?;
        self.endowment.add_trade(trade);
        Ok(())
    }

    /// Record a trade, refusing it if this agent is neither buyer nor seller.
    #[wasm_bindgen]
    pub fn add_trade_strict(&mut self, trade: JsValue) -> Result<(), JsError> {
        let trade: Trade = serde_wasm_bindgen::from_value(trade).map_err(EconError::from)?;
        Ok(self.endowment.try_add_trade(trade)?)
    }

    /// Record a JSON array of trades in order. Returns how many were added.
    #[wasm_bindgen]
    pub fn add_trades_json(&mut self, trades_json: &str) -> Result<usize, JsError> {
        Ok(self.import_trades_json(trades_json)?)
    }

    #[wasm_bindgen]
    pub fn trade_count(&self) -> usize {
        self.endowment.trades().len()
    }

    #[wasm_bindgen]
    pub fn current_basket(&self) -> BasketSnapshot {
        let basket = self.endowment.current_basket();
        BasketSnapshot {
            agent_id: self.endowment.agent_id().to_string(),
            cash: basket.cash,
            goods: basket
                .goods()
                .iter()
                .map(|g| (g.name.clone(), g.quantity))
                .collect(),
            trade_count: self.endowment.trades().len(),
        }
    }

    /// Valuation of the `quantity`-th unit; 0 outside the schedule.
    #[wasm_bindgen]
    pub fn get_value(&self, quantity: f64) -> f64 {
        self.schedule.value_at(quantity)
    }

    #[wasm_bindgen]
    pub fn initial_endowment(&self) -> f64 {
        self.schedule.initial_endowment()
    }

    #[wasm_bindgen]
    pub fn is_buyer(&self) -> bool {
        self.schedule.is_buyer()
    }

    #[wasm_bindgen]
    pub fn schedule_curve(&self) -> ScheduleCurve {
        self.schedule.curve()
    }

    /// Unit valuations in order, unit 1 first.
    #[wasm_bindgen]
    pub fn schedule_values(&self) -> js_sys::Float64Array {
        let values: Vec<f64> = self.schedule.values().values().copied().collect();
        js_sys::Float64Array::from(values.as_slice())
    }
}

// ============================================================================
// Native API
// ============================================================================

impl AgentState {
    pub fn build(
        agent_id: impl Into<AgentId>,
        initial_basket: Basket,
        config: &ScheduleConfig,
    ) -> Result<Self, EconError> {
        let schedule = Schedule::generate(config)?;
        Ok(Self::with_parts(Endowment::new(agent_id, initial_basket), schedule))
    }

    pub fn build_from_json(
        agent_id: impl Into<AgentId>,
        initial_basket_json: &str,
        schedule_json: &str,
    ) -> Result<Self, EconError> {
        let basket: Basket = serde_json::from_str(initial_basket_json)?;
        let config: ScheduleConfig = serde_json::from_str(schedule_json)?;
        Self::build(agent_id, basket, &config)
    }

    pub fn with_parts(endowment: Endowment, schedule: Schedule) -> Self {
        Self {
            endowment,
            schedule,
        }
    }

    /// Decode the whole array before recording anything, so a bad entry
    /// leaves the history untouched.
    pub fn import_trades_json(&mut self, trades_json: &str) -> Result<usize, EconError> {
        let trades: Vec<Trade> = serde_json::from_str(trades_json)?;
        let added = trades.len();
        for trade in trades {
            self.endowment.add_trade(trade);
        }
        Ok(added)
    }

    pub fn endowment(&self) -> &Endowment {
        &self.endowment
    }

    pub fn endowment_mut(&mut self) -> &mut Endowment {
        &mut self.endowment
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn buyer_state() -> AgentState {
        let config = ScheduleConfig::buyer(5, 100.0);
        let schedule = Schedule::generate_with(&config, &mut StdRng::seed_from_u64(5)).unwrap();
        let basket = Basket::new(1000.0, [Good::new("wheat", 10.0)]);
        AgentState::with_parts(Endowment::new("A", basket), schedule)
    }

    #[test]
    fn snapshot_reflects_trades() {
        let mut state = buyer_state();
        let added = state
            .import_trades_json(
                r#"[{"trade_id": 1, "buyer_id": "A", "seller_id": "B", "price": 5.0, "quantity": 2, "good_name": "wheat"}]"#,
            )
            .unwrap();

        assert_eq!(added, 1);
        let snapshot = state.current_basket();
        assert_eq!(snapshot.cash, 990.0);
        assert_eq!(snapshot.goods, vec![("wheat".to_string(), 12.0)]);
        assert_eq!(snapshot.trade_count, 1);
    }

    #[test]
    fn malformed_batch_adds_nothing() {
        let mut state = buyer_state();
        let result = state.import_trades_json(
            r#"[{"trade_id": 1, "buyer_id": "A", "seller_id": "B", "price": 5.0}, {"trade_id": "x"}]"#,
        );

        assert!(matches!(result, Err(EconError::Decode(_))));
        assert_eq!(state.trade_count(), 0);
    }

    #[test]
    fn builds_from_json() {
        let state = AgentState::build_from_json(
            "S1",
            r#"{"cash": 0.0, "goods": [{"name": "consumption_good", "quantity": 4.0}]}"#,
            r#"{"num_units": 4, "base_value": 20.0, "is_buyer": false}"#,
        )
        .unwrap();

        assert!(!state.is_buyer());
        assert_eq!(state.schedule_curve().points.len(), 4);
        assert_eq!(state.get_value(5.0), 0.0);
        assert!(state.get_value(1.0) >= MIN_UNIT_VALUE);
        assert!((state.initial_endowment() - state.schedule().total_value()).abs() < 1e-9);
    }

    #[test]
    fn invalid_schedule_json_is_reported() {
        let err = AgentState::build_from_json(
            "S1",
            r#"{"cash": 0.0}"#,
            r#"{"num_units": 0, "base_value": 20.0}"#,
        )
        .err();
        assert_eq!(err, Some(EconError::InvalidNumUnits(0)));
    }
}
