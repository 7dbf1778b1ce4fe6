//! Orders produced by the server

use super::Wine;
use serde::{Deserialize, Serialize};

/// Record of a purchase attempt; the client only ever receives these
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: u32,
    pub status: String,
    pub customer: String,
    pub items: Vec<Wine>,
}

impl Order {
    pub fn new(id: u32, status: impl Into<String>, customer: impl Into<String>, items: Vec<Wine>) -> Self {
        Self {
            id,
            status: status.into(),
            customer: customer.into(),
            items,
        }
    }

    pub fn first_item(&self) -> Option<&Wine> {
        self.items.first()
    }

    /// Total bottles across all lines
    pub fn bottles(&self) -> u32 {
        self.items.iter().map(|w| w.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bottles() {
        let order = Order::new(
            1,
            "pending",
            "user@user.com",
            vec![Wine::with_id(20).with_quantity(2), Wine::with_id(22).with_quantity(1)],
        );
        assert_eq!(order.bottles(), 3);
        assert_eq!(order.first_item().map(|w| w.id), Some(20));
    }

    #[test]
    fn test_empty_order() {
        let order = Order::default();
        assert!(order.first_item().is_none());
        assert_eq!(order.bottles(), 0);
    }
}
