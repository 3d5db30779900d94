// === CORE TYPES ===

/// Identifies a market participant. Trades name their parties by this id.
pub type AgentId = String;
pub type TradeId = u64;
pub type Price = f64;
pub type Quantity = f64;

/// Index of a unit on a preference schedule, starting at 1.
pub type Unit = u32;

/// Good name used when a trade record does not say what was traded.
pub const DEFAULT_GOOD_NAME: &str = "consumption_good";
