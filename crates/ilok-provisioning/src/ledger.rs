//! Provisioning Ledger
//!
//! Everything the integration remembers about an order lives in order and
//! item metadata: the processed marker that makes event delivery idempotent,
//! and the deposit references the renewal path reads back a billing period
//! later. This module owns those keys and their normalization quirks.

use std::sync::Arc;

use chrono::Utc;
use ilok_commerce::{ItemId, MetaValue, Order, OrderStore};

use crate::error::Result;

/// Order meta key marking an order as fully provisioned
pub const PROCESSED_KEY: &str = "_ilok_orders_processed";

/// Item meta key holding that item's deposit reference(s)
pub const ITEM_REFERENCE_KEY: &str = "deposit_reference_value";

/// Order meta key holding a specific item's deposit reference(s)
pub fn order_reference_key(item_id: ItemId) -> String {
    format!("_deposit_reference_value_{item_id}")
}

/// Deposit references for one line item
///
/// A quantity-one item stores its single reference as a bare string, larger
/// quantities store a list. Both shapes exist in historical data, so readers
/// must accept either.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DepositReference {
    One(String),
    Many(Vec<String>),
}

impl DepositReference {
    /// Build from a GUID bucket; `None` when the bucket is empty
    pub fn from_guids(mut guids: Vec<String>) -> Option<Self> {
        match guids.len() {
            0 => None,
            1 => Some(DepositReference::One(guids.remove(0))),
            _ => Some(DepositReference::Many(guids)),
        }
    }

    /// All references, regardless of stored shape
    pub fn as_list(&self) -> Vec<String> {
        match self {
            DepositReference::One(s) => vec![s.clone()],
            DepositReference::Many(l) => l.clone(),
        }
    }
}

impl From<DepositReference> for MetaValue {
    fn from(reference: DepositReference) -> Self {
        match reference {
            DepositReference::One(s) => MetaValue::Text(s),
            DepositReference::Many(l) => MetaValue::List(l),
        }
    }
}

/// Reads and writes the integration's order metadata
#[derive(Clone)]
pub struct ProvisioningLedger {
    orders: Arc<dyn OrderStore>,
}

impl ProvisioningLedger {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    /// Whether the order has already been provisioned
    ///
    /// The marker is the sole re-processing signal; order status is never
    /// consulted.
    pub fn is_processed(&self, order: &Order) -> bool {
        order
            .meta(PROCESSED_KEY)
            .is_some_and(|marker| !marker.is_empty())
    }

    /// Set the processed marker to the current epoch second and persist
    pub async fn mark_processed(&self, order: &mut Order) -> Result<()> {
        order.set_meta(PROCESSED_KEY, Utc::now().timestamp());
        self.orders.save_order(order).await?;
        tracing::debug!(order_id = order.id, "Marked order as processed");
        Ok(())
    }

    /// Persist an item's deposit references under both storage keys
    ///
    /// References are persisted before the processed marker ever is, so a
    /// crash between the two leaves a re-processable order rather than a
    /// processed order with missing references.
    pub async fn store_references(
        &self,
        order: &mut Order,
        item_id: ItemId,
        reference: &DepositReference,
    ) -> Result<()> {
        let value: MetaValue = reference.clone().into();
        order.set_meta(order_reference_key(item_id), value.clone());
        if let Some(item) = order.item_mut(item_id) {
            item.set_meta(ITEM_REFERENCE_KEY, value);
        }

        if let DepositReference::Many(references) = reference {
            tracing::info!(
                order_id = order.id,
                item_id,
                references = ?references,
                "Stored deposit references for item"
            );
        }

        self.orders.save_order(order).await?;
        Ok(())
    }

    /// Read back an item's deposit references, order-level key first
    ///
    /// Falls back to the item-level key for orders written before the
    /// order-level copy existed. Scalar and list shapes both normalize to a
    /// plain list; absent references normalize to an empty one.
    pub fn stored_references(&self, order: &Order, item_id: ItemId) -> Vec<String> {
        let order_level = order
            .meta(&order_reference_key(item_id))
            .filter(|v| !v.is_empty());

        let value = order_level.or_else(|| {
            order
                .item(item_id)
                .and_then(|item| item.meta(ITEM_REFERENCE_KEY))
        });

        value.map(MetaValue::to_reference_list).unwrap_or_default()
    }

    /// Remove the marker and every stored reference, then persist
    ///
    /// The cleanup path for uninstalling the integration from an order.
    pub async fn clear(&self, order: &mut Order) -> Result<()> {
        order.remove_meta(PROCESSED_KEY);

        let item_ids: Vec<ItemId> = order.items.iter().map(|i| i.id).collect();
        for item_id in item_ids {
            order.remove_meta(&order_reference_key(item_id));
        }
        for item in &mut order.items {
            item.remove_meta(ITEM_REFERENCE_KEY);
        }

        self.orders.save_order(order).await?;
        tracing::debug!(order_id = order.id, "Cleared provisioning metadata");
        Ok(())
    }
}
