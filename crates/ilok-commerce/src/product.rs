//! Catalog Products

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::meta::MetaValue;

/// Catalog product identifier assigned by the host platform
pub type ProductId = u64;

/// A catalog product as snapshot onto a line item.
///
/// Licensing only cares about the product's metadata (the SKU GUID key);
/// pricing, stock and presentation stay with the host platform.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier
    pub id: ProductId,

    /// Product-scoped metadata
    pub meta: HashMap<String, MetaValue>,
}

impl Product {
    pub fn new(id: ProductId) -> Self {
        Self {
            id,
            meta: HashMap::new(),
        }
    }

    /// Read a product metadata value
    pub fn meta(&self, key: &str) -> Option<&MetaValue> {
        self.meta.get(key)
    }

    /// Write a product metadata value
    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.meta.insert(key.into(), value.into());
    }

    /// Builder-style metadata write, for fixture construction
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.set_meta(key, value);
        self
    }
}
