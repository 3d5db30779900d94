// Endowment ledger: initial basket + append-only trade history

use std::cell::{Cell, RefCell};

use serde::{Deserialize, Serialize};

use crate::error::EconError;
use crate::goods::Basket;
use crate::orders::{Side, Trade};
use crate::types::AgentId;

/// Current basket together with the history length it was folded from.
#[derive(Debug, Clone)]
struct CachedBasket {
    trade_count: usize,
    basket: Basket,
}

/// An agent's holdings, derived from what it started with plus every trade
/// it took part in.
///
/// The current basket is a left fold over `trades` in append order. It is
/// cached together with the trade count it saw; a read recomputes only when
/// the history has grown since. Not `Sync`: one owner reads and writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endowment {
    agent_id: AgentId,
    initial_basket: Basket,
    #[serde(default)]
    trades: Vec<Trade>,
    #[serde(skip)]
    cache: RefCell<Option<CachedBasket>>,
    #[serde(skip)]
    folds: Cell<u64>,
}

impl Endowment {
    pub fn new(agent_id: impl Into<AgentId>, initial_basket: Basket) -> Self {
        Self::with_trades(agent_id, initial_basket, Vec::new())
    }

    /// Start from an existing history, e.g. when replaying a recorded session.
    pub fn with_trades(
        agent_id: impl Into<AgentId>,
        initial_basket: Basket,
        trades: Vec<Trade>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            initial_basket,
            trades,
            cache: RefCell::new(None),
            folds: Cell::new(0),
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn initial_basket(&self) -> &Basket {
        &self.initial_basket
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Append a trade. No party or duplicate-id checks; a trade this agent
    /// isn't in leaves the basket unchanged.
    pub fn add_trade(&mut self, trade: Trade) {
        // The cache's trade count no longer matches, which marks it stale.
        self.trades.push(trade);
    }

    /// Like `add_trade`, but refuses trades where this agent is neither the
    /// buyer nor the seller.
    pub fn try_add_trade(&mut self, trade: Trade) -> Result<(), EconError> {
        if trade.side_of(&self.agent_id).is_none() {
            return Err(EconError::NotAParty {
                trade_id: trade.trade_id,
                agent_id: self.agent_id.clone(),
                buyer_id: trade.buyer_id,
                seller_id: trade.seller_id,
            });
        }
        self.add_trade(trade);
        Ok(())
    }

    /// Holdings after every trade so far. Returns a fresh snapshot.
    pub fn current_basket(&self) -> Basket {
        let mut cache = self.cache.borrow_mut();
        let (start, basket) = match cache.take() {
            Some(cached) if cached.trade_count == self.trades.len() => {
                let basket = cached.basket.clone();
                *cache = Some(cached);
                return basket;
            }
            // History is append-only, so a stale snapshot is still a valid prefix.
            Some(cached) if cached.trade_count < self.trades.len() => {
                (cached.trade_count, cached.basket)
            }
            _ => (0, self.initial_basket.clone()),
        };

        let basket = self.fold(start, basket);
        *cache = Some(CachedBasket {
            trade_count: self.trades.len(),
            basket: basket.clone(),
        });
        basket
    }

    /// How many times the trade history has been folded. Diagnostic only.
    pub fn fold_count(&self) -> u64 {
        self.folds.get()
    }

    /// Apply `trades[start..]` to `basket`. Each applied trade is logged once,
    /// when it is first folded in.
    fn fold(&self, start: usize, mut basket: Basket) -> Basket {
        self.folds.set(self.folds.get() + 1);

        for trade in &self.trades[start..] {
            let Some(side) = trade.side_of(&self.agent_id) else {
                continue;
            };
            let held = basket.get_good_quantity(&trade.good_name);
            let qty = trade.quantity as f64;
            match side {
                Side::Buy => {
                    basket.cash -= trade.value();
                    basket.update_good(trade.good_name.as_str(), held + qty);
                }
                Side::Sell => {
                    basket.cash += trade.value();
                    basket.update_good(trade.good_name.as_str(), held - qty);
                }
            }

            #[cfg(feature = "instrument")]
            tracing::info!(
                target: "trade",
                agent_id = self.agent_id.as_str(),
                trade_id = trade.trade_id,
                good = trade.good_name.as_str(),
                buy = matches!(side, Side::Buy),
                price = trade.price,
                quantity = trade.quantity as u64,
                value = trade.value(),
                cash_after = basket.cash,
            );
        }
        basket
    }
}

impl PartialEq for Endowment {
    fn eq(&self, other: &Self) -> bool {
        self.agent_id == other.agent_id
            && self.initial_basket == other.initial_basket
            && self.trades == other.trades
    }
}
