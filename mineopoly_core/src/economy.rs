use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ItemType;

/// Current sell prices for every item kind.
///
/// Selling an item pushes its price down; prices drift back toward their
/// defaults one unit per turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Economy {
    prices: HashMap<ItemType, u32>,
}

impl Default for Economy {
    fn default() -> Self {
        Self {
            prices: ItemType::ALL
                .into_iter()
                .map(|item| (item, Self::default_price(item)))
                .collect(),
        }
    }
}

impl Economy {
    pub fn default_price(item: ItemType) -> u32 {
        match item {
            ItemType::Ruby => 50,
            ItemType::Emerald => 75,
            ItemType::Diamond => 100,
        }
    }

    fn min_price(item: ItemType) -> u32 {
        Self::default_price(item) / 10
    }

    /// Returns the current price of one `item`.
    pub fn price(&self, item: ItemType) -> u32 {
        self.prices
            .get(&item)
            .copied()
            .unwrap_or_else(|| Self::default_price(item))
    }

    /// Sells `items` at current prices and returns the total proceeds.
    ///
    /// Prices are read before any of this sale's drops apply.
    pub fn sell(&mut self, items: &[ItemType]) -> u32 {
        let total = items.iter().map(|item| self.price(*item)).sum();
        for &item in items {
            let drop = Self::default_price(item) / 10;
            let floor = Self::min_price(item);
            let price = self.prices.entry(item).or_insert(Self::default_price(item));
            *price = price.saturating_sub(drop).max(floor);
        }
        total
    }

    /// Moves every price one unit back toward its default.
    pub fn recover(&mut self) {
        for (item, price) in self.prices.iter_mut() {
            *price = (*price + 1).min(Self::default_price(*item));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_uses_prices_before_drop() {
        let mut economy = Economy::default();
        let total = economy.sell(&[ItemType::Ruby, ItemType::Ruby, ItemType::Diamond]);
        assert_eq!(total, 50 + 50 + 100);
        assert_eq!(economy.price(ItemType::Ruby), 40);
        assert_eq!(economy.price(ItemType::Diamond), 90);
        assert_eq!(economy.price(ItemType::Emerald), 75);
    }

    #[test]
    fn prices_floor_and_recover() {
        let mut economy = Economy::default();
        economy.sell(&[ItemType::Ruby; 20]);
        assert_eq!(economy.price(ItemType::Ruby), 5);

        economy.recover();
        assert_eq!(economy.price(ItemType::Ruby), 6);
        for _ in 0..100 {
            economy.recover();
        }
        assert_eq!(economy.price(ItemType::Ruby), 50);
    }
}
