//! In-Memory Stores
//!
//! Reference implementations of the store traits for tests and for hosts
//! embedding the integration without a real backend. Notes are captured with
//! timestamps so tests can assert on operator-visible output.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use crate::error::{CommerceError, Result};
use crate::order::{Order, OrderId, OrderStatus};
use crate::store::{OrderStore, SubscriptionStore};
use crate::subscription::{Subscription, SubscriptionId};

/// A captured order note
#[derive(Clone, Debug)]
pub struct OrderNote {
    /// Note text as appended
    pub text: String,

    /// When the note was appended
    pub added_at: DateTime<Utc>,
}

/// In-memory order store
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
    notes: RwLock<HashMap<OrderId, Vec<OrderNote>>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an order (fixture setup; bypasses save semantics)
    pub async fn insert(&self, order: Order) {
        self.orders.write().await.insert(order.id, order);
    }

    /// Notes appended to an order, oldest first
    pub async fn notes_for(&self, id: OrderId) -> Vec<OrderNote> {
        self.notes.read().await.get(&id).cloned().unwrap_or_default()
    }

    /// Current stored status, if the order exists
    pub async fn status_of(&self, id: OrderId) -> Option<OrderStatus> {
        self.orders.read().await.get(&id).map(|o| o.status)
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn save_order(&self, order: &Order) -> Result<()> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn add_order_note(&self, id: OrderId, note: &str) -> Result<()> {
        if !self.orders.read().await.contains_key(&id) {
            return Err(CommerceError::OrderNotFound(id));
        }
        tracing::debug!(order_id = id, note, "Appending order note");
        self.notes.write().await.entry(id).or_default().push(OrderNote {
            text: note.to_string(),
            added_at: Utc::now(),
        });
        Ok(())
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<()> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&id).ok_or(CommerceError::OrderNotFound(id))?;
        tracing::debug!(order_id = id, from = %order.status, to = %status, "Updating order status");
        order.status = status;
        Ok(())
    }
}

/// In-memory subscription store
#[derive(Default)]
pub struct MemorySubscriptionStore {
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
    renewal_orders: RwLock<HashSet<OrderId>>,
}

impl MemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a subscription
    pub async fn insert(&self, subscription: Subscription) {
        self.subscriptions
            .write()
            .await
            .insert(subscription.id, subscription);
    }

    /// Mark an order id as a renewal order for the detection predicate
    pub async fn register_renewal_order(&self, id: OrderId) {
        self.renewal_orders.write().await.insert(id);
    }
}

#[async_trait]
impl SubscriptionStore for MemorySubscriptionStore {
    async fn get_subscription(&self, id: SubscriptionId) -> Result<Option<Subscription>> {
        Ok(self.subscriptions.read().await.get(&id).cloned())
    }

    async fn is_renewal_order(&self, order: &Order) -> Result<bool> {
        Ok(self.renewal_orders.read().await.contains(&order.id))
    }
}
