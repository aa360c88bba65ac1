//! Orders and Line Items
//!
//! The order aggregate as seen by the licensing integration: status, payment
//! flag, creation channel, metadata and an ordered collection of line items.
//! Orders are owned by the [`OrderStore`](crate::store::OrderStore); the
//! integration reads them, adjusts metadata and saves them back.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::meta::MetaValue;
use crate::product::{Product, ProductId};

/// Order identifier assigned by the host platform
pub type OrderId = u64;

/// Line-item identifier, unique within its order
pub type ItemId = u64;

/// Order lifecycle status, kebab-case on the wire (`"on-hold"`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Pending,
    Processing,
    OnHold,
    Completed,
    Cancelled,
    Refunded,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::OnHold => "on-hold",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
            OrderStatus::Failed => "failed",
        }
    }

    /// Parse a wire-form status string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "processing" => Some(OrderStatus::Processing),
            "on-hold" => Some(OrderStatus::OnHold),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            "refunded" => Some(OrderStatus::Refunded),
            "failed" => Some(OrderStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A purchased line on an order
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LineItem {
    /// Item identifier, order-scoped
    pub id: ItemId,

    /// Referenced catalog product
    pub product_id: ProductId,

    /// Referenced variation, when the product was bought as a variation
    pub variation_id: Option<ProductId>,

    /// Purchased quantity
    pub quantity: u32,

    /// Item-scoped metadata
    pub meta: HashMap<String, MetaValue>,

    /// Resolved product snapshot; `None` when the catalog entry is gone
    pub product: Option<Product>,
}

impl LineItem {
    pub fn new(id: ItemId, product_id: ProductId, quantity: u32) -> Self {
        Self {
            id,
            product_id,
            variation_id: None,
            quantity,
            meta: HashMap::new(),
            product: None,
        }
    }

    /// Attach the resolved product snapshot
    pub fn with_product(mut self, product: Product) -> Self {
        self.product = Some(product);
        self
    }

    /// Set the variation this item was bought as
    pub fn with_variation(mut self, variation_id: ProductId) -> Self {
        self.variation_id = Some(variation_id);
        self
    }

    /// Read an item metadata value
    pub fn meta(&self, key: &str) -> Option<&MetaValue> {
        self.meta.get(key)
    }

    /// Write an item metadata value
    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.meta.insert(key.into(), value.into());
    }

    /// Delete an item metadata value
    pub fn remove_meta(&mut self, key: &str) -> Option<MetaValue> {
        self.meta.remove(key)
    }
}

/// An order as retrieved from the store
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier
    pub id: OrderId,

    /// Current lifecycle status
    pub status: OrderStatus,

    /// Whether payment has been captured
    pub paid: bool,

    /// Creation channel (`"checkout"`, `"subscription"`, `"admin"`, ...)
    pub created_via: String,

    /// Line items in platform iteration order
    pub items: Vec<LineItem>,

    /// Order-scoped metadata
    pub meta: HashMap<String, MetaValue>,
}

impl Order {
    pub fn new(id: OrderId) -> Self {
        Self {
            id,
            status: OrderStatus::Pending,
            paid: false,
            created_via: "checkout".into(),
            items: Vec::new(),
            meta: HashMap::new(),
        }
    }

    /// Add a line item, keeping insertion order
    pub fn push_item(&mut self, item: LineItem) {
        self.items.push(item);
    }

    /// Look up a line item by its order-scoped id
    pub fn item(&self, id: ItemId) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Mutable line-item lookup
    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// Read an order metadata value
    pub fn meta(&self, key: &str) -> Option<&MetaValue> {
        self.meta.get(key)
    }

    /// Write an order metadata value
    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.meta.insert(key.into(), value.into());
    }

    /// Delete an order metadata value
    pub fn remove_meta(&mut self, key: &str) -> Option<MetaValue> {
        self.meta.remove(key)
    }

    /// Whether payment has been captured for this order
    pub fn is_paid(&self) -> bool {
        self.paid
    }
}
