//! Subscriptions
//!
//! The subscription system owns the recurring-billing relationship; the
//! licensing integration only needs the identifier and the link back to the
//! parent (original purchase) order.

use serde::{Deserialize, Serialize};

use crate::order::OrderId;

/// Subscription identifier assigned by the subscription system
pub type SubscriptionId = u64;

/// A subscription record
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscription identifier
    pub id: SubscriptionId,

    /// The order that originally created this subscription, if known.
    /// Renewal orders are separate orders; resolving their license origin
    /// always goes through this parent.
    pub parent_order_id: Option<OrderId>,
}

impl Subscription {
    pub fn new(id: SubscriptionId) -> Self {
        Self {
            id,
            parent_order_id: None,
        }
    }

    /// Link the parent order
    pub fn with_parent(mut self, parent_order_id: OrderId) -> Self {
        self.parent_order_id = Some(parent_order_id);
        self
    }
}
