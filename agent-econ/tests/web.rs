//! JS-boundary tests for `AgentState`. Run with `wasm-pack test --node`.
#![cfg(target_arch = "wasm32")]

use agent_econ::{AgentState, Basket, Good, ScheduleConfig, Trade};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

fn to_js<T: serde::Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap()
}

fn wheat_agent() -> AgentState {
    let basket = Basket::new(1000.0, [Good::new("wheat", 10.0)]);
    AgentState::new(
        "A".to_string(),
        to_js(&basket),
        to_js(&ScheduleConfig::buyer(5, 100.0)),
    )
    .unwrap_or_else(|_| panic!("agent should build"))
}

#[wasm_bindgen_test]
fn constructor_decodes_js_objects() {
    let agent = wheat_agent();
    assert_eq!(agent.agent_id(), "A");
    assert!(agent.is_buyer());
    assert_eq!(agent.schedule_values().length(), 5);
}

#[wasm_bindgen_test]
fn js_trade_updates_basket() {
    let mut agent = wheat_agent();
    agent
        .add_trade(to_js(&Trade::new(1, "A", "B", 5.0, 2, "wheat")))
        .unwrap_or_else(|_| panic!("trade should decode"));

    let snapshot = agent.current_basket();
    assert_eq!(snapshot.cash, 990.0);
    assert_eq!(snapshot.goods, vec![("wheat".to_string(), 12.0)]);
}

#[wasm_bindgen_test]
fn strict_add_rejects_foreign_trade() {
    let mut agent = wheat_agent();
    let result = agent.add_trade_strict(to_js(&Trade::new(1, "B", "C", 5.0, 2, "wheat")));
    assert!(result.is_err());
    assert_eq!(agent.trade_count(), 0);
}

#[wasm_bindgen_test]
fn bad_schedule_is_an_error() {
    let basket = Basket::default();
    let result = AgentState::new(
        "A".to_string(),
        to_js(&basket),
        to_js(&ScheduleConfig::seller(0, 10.0)),
    );
    assert!(result.is_err());
}
