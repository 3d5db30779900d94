// Goods and baskets: the value containers an agent's holdings are made of

use std::cell::OnceCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Price, Quantity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Good {
    pub name: String,
    /// May be fractional. Not clamped at zero.
    pub quantity: Quantity,
}

impl Good {
    pub fn new(name: impl Into<String>, quantity: Quantity) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }
}

/// Cash plus a list of uniquely-named goods.
///
/// The name index is derived lazily on first lookup and dropped whenever the
/// goods change, so reads after `update_good` never see a stale view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "BasketFields")]
pub struct Basket {
    pub cash: Price,
    goods: Vec<Good>,
    #[serde(skip)]
    index: OnceCell<HashMap<String, Quantity>>,
}

#[derive(Deserialize)]
struct BasketFields {
    cash: Price,
    #[serde(default)]
    goods: Vec<Good>,
}

impl From<BasketFields> for Basket {
    fn from(fields: BasketFields) -> Self {
        Basket::new(fields.cash, fields.goods)
    }
}

impl PartialEq for Basket {
    fn eq(&self, other: &Self) -> bool {
        self.cash == other.cash && self.goods == other.goods
    }
}

impl Basket {
    /// Build a basket. Later duplicates of a name overwrite earlier ones in
    /// place, keeping names unique.
    pub fn new(cash: Price, goods: impl IntoIterator<Item = Good>) -> Self {
        let mut basket = Self {
            cash,
            goods: Vec::new(),
            index: OnceCell::new(),
        };
        for good in goods {
            basket.update_good(good.name, good.quantity);
        }
        basket
    }

    pub fn with_good(mut self, name: impl Into<String>, quantity: Quantity) -> Self {
        self.update_good(name, quantity);
        self
    }

    pub fn goods(&self) -> &[Good] {
        &self.goods
    }

    /// Set a good's quantity, appending it if the basket doesn't hold it yet.
    pub fn update_good(&mut self, name: impl Into<String>, quantity: Quantity) {
        let name = name.into();
        match self.goods.iter_mut().find(|g| g.name == name) {
            Some(good) => good.quantity = quantity,
            None => self.goods.push(Good { name, quantity }),
        }
        self.index.take();
    }

    /// Quantity held of `name`, or 0.0 if the basket has no such good.
    pub fn get_good_quantity(&self, name: &str) -> Quantity {
        self.goods_by_name().get(name).copied().unwrap_or(0.0)
    }

    pub fn goods_by_name(&self) -> &HashMap<String, Quantity> {
        self.index.get_or_init(|| {
            self.goods
                .iter()
                .map(|g| (g.name.clone(), g.quantity))
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_good_reads_as_zero() {
        let basket = Basket::new(100.0, [Good::new("wheat", 3.0)]);
        assert_eq!(basket.get_good_quantity("nonexistent"), 0.0);
        assert_eq!(basket.get_good_quantity("wheat"), 3.0);
    }

    #[test]
    fn update_replaces_existing_good_in_place() {
        let mut basket = Basket::new(0.0, [Good::new("wheat", 3.0), Good::new("iron", 1.0)]);
        basket.update_good("wheat", 7.5);

        assert_eq!(basket.goods().len(), 2);
        assert_eq!(basket.goods()[0], Good::new("wheat", 7.5));
    }

    #[test]
    fn update_appends_unknown_good() {
        let mut basket = Basket::new(0.0, [Good::new("wheat", 3.0)]);
        basket.update_good("iron", 2.0);

        assert_eq!(basket.goods().len(), 2);
        assert_eq!(basket.goods()[1].name, "iron");
    }

    #[test]
    fn index_is_rebuilt_after_update() {
        let mut basket = Basket::new(0.0, [Good::new("wheat", 3.0)]);
        // Prime the index before mutating
        assert_eq!(basket.goods_by_name()["wheat"], 3.0);

        basket.update_good("wheat", 4.0);
        basket.update_good("cloth", 1.0);

        assert_eq!(basket.get_good_quantity("wheat"), 4.0);
        assert_eq!(basket.get_good_quantity("cloth"), 1.0);
        assert_eq!(basket.goods_by_name().len(), 2);
    }

    #[test]
    fn duplicate_names_collapse_on_construction() {
        let basket = Basket::new(0.0, [Good::new("wheat", 1.0), Good::new("wheat", 5.0)]);
        assert_eq!(basket.goods(), &[Good::new("wheat", 5.0)]);
    }

    #[test]
    fn equality_ignores_index_state() {
        let a = Basket::new(10.0, [Good::new("wheat", 1.0)]);
        let b = a.clone();
        let _ = a.goods_by_name();
        assert_eq!(a, b);
    }

    #[test]
    fn deserialized_basket_keeps_names_unique() {
        let basket: Basket = serde_json::from_str(
            r#"{"cash": 1.0, "goods": [{"name": "wheat", "quantity": 2.0}, {"name": "wheat", "quantity": 9.0}]}"#,
        )
        .unwrap();
        assert_eq!(basket.goods().len(), 1);
        assert_eq!(basket.get_good_quantity("wheat"), 9.0);
    }

    #[test]
    fn deserializes_without_index() {
        let basket: Basket =
            serde_json::from_str(r#"{"cash": 5.0, "goods": [{"name": "wheat", "quantity": 2.0}]}"#)
                .unwrap();
        assert_eq!(basket.cash, 5.0);
        assert_eq!(basket.get_good_quantity("wheat"), 2.0);
    }
}
