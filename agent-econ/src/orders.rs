use serde::{Deserialize, Serialize};

use crate::error::EconError;
use crate::types::{AgentId, DEFAULT_GOOD_NAME, Price, TradeId};

// === ORDERS ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// Price and size shared by every order an agent can post.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ActionFields")]
pub struct MarketAction {
    pub price: Price,
    quantity: u32,
}

#[derive(Deserialize)]
struct ActionFields {
    price: Price,
    #[serde(default = "default_trade_quantity")]
    quantity: u32,
}

impl TryFrom<ActionFields> for MarketAction {
    type Error = EconError;

    fn try_from(fields: ActionFields) -> Result<Self, Self::Error> {
        MarketAction::new(fields.price, fields.quantity)
    }
}

impl MarketAction {
    pub fn new(price: Price, quantity: u32) -> Result<Self, EconError> {
        if quantity < 1 {
            return Err(EconError::InvalidOrderQuantity(quantity));
        }
        Ok(Self { price, quantity })
    }

    /// A single-unit order at `price`.
    pub fn unit(price: Price) -> Self {
        Self { price, quantity: 1 }
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// Wire form shared by `Bid` and `Ask`: the action plus an explicit role flag.
#[derive(Serialize, Deserialize)]
struct OrderFields {
    #[serde(flatten)]
    action: MarketAction,
    #[serde(default)]
    is_buyer: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "OrderFields", try_from = "OrderFields")]
pub struct Bid {
    pub action: MarketAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "OrderFields", try_from = "OrderFields")]
pub struct Ask {
    pub action: MarketAction,
}

impl Bid {
    pub fn new(price: Price, quantity: u32) -> Result<Self, EconError> {
        MarketAction::new(price, quantity).map(|action| Self { action })
    }

    pub fn side(&self) -> Side {
        Side::Buy
    }
}

impl Ask {
    pub fn new(price: Price, quantity: u32) -> Result<Self, EconError> {
        MarketAction::new(price, quantity).map(|action| Self { action })
    }

    pub fn side(&self) -> Side {
        Side::Sell
    }
}

impl From<Bid> for OrderFields {
    fn from(bid: Bid) -> Self {
        Self {
            action: bid.action,
            is_buyer: Some(true),
        }
    }
}

impl From<Ask> for OrderFields {
    fn from(ask: Ask) -> Self {
        Self {
            action: ask.action,
            is_buyer: Some(false),
        }
    }
}

impl TryFrom<OrderFields> for Bid {
    type Error = EconError;

    fn try_from(fields: OrderFields) -> Result<Self, Self::Error> {
        match fields.is_buyer {
            Some(false) => Err(EconError::OrderSideMismatch {
                kind: "bid",
                is_buyer: false,
            }),
            _ => Ok(Self {
                action: fields.action,
            }),
        }
    }
}

impl TryFrom<OrderFields> for Ask {
    type Error = EconError;

    fn try_from(fields: OrderFields) -> Result<Self, Self::Error> {
        match fields.is_buyer {
            Some(true) => Err(EconError::OrderSideMismatch {
                kind: "ask",
                is_buyer: true,
            }),
            _ => Ok(Self {
                action: fields.action,
            }),
        }
    }
}

// === TRADES ===

fn default_trade_quantity() -> u32 {
    1
}

fn default_good_name() -> String {
    DEFAULT_GOOD_NAME.to_string()
}

/// A completed transaction between two named parties.
///
/// Produced by whatever matched the orders; the ledger takes it as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub buyer_id: AgentId,
    pub seller_id: AgentId,
    pub price: Price,
    #[serde(default = "default_trade_quantity")]
    pub quantity: u32,
    #[serde(default = "default_good_name")]
    pub good_name: String,
}

impl Trade {
    pub fn new(
        trade_id: TradeId,
        buyer_id: impl Into<AgentId>,
        seller_id: impl Into<AgentId>,
        price: Price,
        quantity: u32,
        good_name: impl Into<String>,
    ) -> Self {
        Self {
            trade_id,
            buyer_id: buyer_id.into(),
            seller_id: seller_id.into(),
            price,
            quantity,
            good_name: good_name.into(),
        }
    }

    /// Cash that changes hands.
    pub fn value(&self) -> Price {
        self.price * self.quantity as f64
    }

    /// Which side of this trade `agent_id` was on, if any. A self-trade
    /// counts as a buy.
    pub fn side_of(&self, agent_id: &str) -> Option<Side> {
        if self.buyer_id == agent_id {
            Some(Side::Buy)
        } else if self.seller_id == agent_id {
            Some(Side::Sell)
        } else {
            None
        }
    }
}
