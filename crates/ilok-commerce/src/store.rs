//! Store Traits
//!
//! The seams to the host platform. Implementations wrap whatever persistence
//! the host uses (a shop database, a REST bridge); [`MemoryOrderStore`]
//! (crate::memory) covers tests and embedded use.
//!
//! `save_order` persists the whole aggregate (order metadata and item
//! metadata together), mirroring how the host platform flushes an order
//! object. Notes are append-only and store-owned: the core writes them but
//! never reads them back.

use async_trait::async_trait;

use crate::error::Result;
use crate::order::{Order, OrderId, OrderStatus};
use crate::subscription::{Subscription, SubscriptionId};

/// Order retrieval and persistence as consumed by the licensing integration
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetch an order by id; `None` when it does not exist
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Persist the order aggregate (metadata and item metadata included)
    async fn save_order(&self, order: &Order) -> Result<()>;

    /// Append to the order's note log (operator visibility)
    async fn add_order_note(&self, id: OrderId, note: &str) -> Result<()>;

    /// Transition the order to a new lifecycle status
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<()>;
}

/// Subscription lookups as consumed by the renewal path
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Fetch a subscription by id; `None` when it does not exist
    async fn get_subscription(&self, id: SubscriptionId) -> Result<Option<Subscription>>;

    /// The subscription system's own renewal-detection predicate: whether
    /// this order was generated to bill a recurring period
    async fn is_renewal_order(&self, order: &Order) -> Result<bool>;
}
