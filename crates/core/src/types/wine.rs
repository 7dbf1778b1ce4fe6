//! Catalog items

use serde::{Deserialize, Serialize};

/// One purchasable wine
///
/// `quantity` is stock when the item comes from the catalog, and the
/// requested amount when it comes from a cart or an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wine {
    pub id: u32,
    pub name: String,
    pub producer: String,
    pub year: u16,
    pub notes: String,
    pub quantity: u32,
    pub grapes: String,
}

impl Wine {
    /// Create new wine
    pub fn new(
        id: u32,
        name: impl Into<String>,
        producer: impl Into<String>,
        year: u16,
        notes: impl Into<String>,
        quantity: u32,
        grapes: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            producer: producer.into(),
            year,
            notes: notes.into(),
            quantity,
            grapes: grapes.into(),
        }
    }

    /// Reference to an item by id only, e.g. for cart requests
    pub fn with_id(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Zero-identity item older servers send in place of "permission denied"
    pub fn sentinel() -> Self {
        Self::default()
    }

    /// Recognised by id alone, whatever the other fields carry
    pub fn is_sentinel(&self) -> bool {
        self.id == 0
    }

    /// Same wine with another quantity
    pub fn with_quantity(&self, quantity: u32) -> Self {
        Self {
            quantity,
            ..self.clone()
        }
    }
}
