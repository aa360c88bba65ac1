//! Subscription Renewal Handler
//!
//! On a renewal payment, no new licenses are deposited. Instead the deposit
//! references stored on the subscription's parent order are read back and
//! each one is refreshed at the gateway for another billing period.
//!
//! Renewal line items are matched to parent line items by exact product and
//! variation id equality; first match wins. References are refreshed one by
//! one, and a single success is enough to mark the renewal order processed.

use std::sync::Arc;

use ilok_commerce::{ItemId, Order, OrderStore, Subscription};
use ilok_eden::LicenseService;

use crate::dispatch::Trigger;
use crate::error::{ProvisionError, Result};
use crate::extract::item_sku_guid;
use crate::ledger::ProvisioningLedger;

/// Outcome of a renewal attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenewOutcome {
    /// Processed marker already present; nothing was done
    AlreadyProcessed,

    /// No renewal item could be tied to stored parent references
    NoRenewableItems,

    /// Refresh attempted for every reference; counts tell how it went
    Refreshed { successful: usize, total: usize },
}

/// A renewal line item tied back to its parent order's references
struct RenewableItem {
    renewal_item_id: ItemId,
    parent_item_id: ItemId,
    references: Vec<String>,
}

/// Refreshes previously deposited licenses on subscription renewals
pub struct RenewalHandler {
    orders: Arc<dyn OrderStore>,
    license: Arc<dyn LicenseService>,
    ledger: ProvisioningLedger,
}

impl RenewalHandler {
    pub fn new(orders: Arc<dyn OrderStore>, license: Arc<dyn LicenseService>) -> Self {
        let ledger = ProvisioningLedger::new(orders.clone());
        Self {
            orders,
            license,
            ledger,
        }
    }

    /// The ledger this handler records into
    pub fn ledger(&self) -> &ProvisioningLedger {
        &self.ledger
    }

    /// Refresh the parent order's licenses for one renewal payment
    pub async fn renew(
        &self,
        subscription: &Subscription,
        renewal_order: &mut Order,
        trigger: Trigger,
    ) -> Result<RenewOutcome> {
        if self.ledger.is_processed(renewal_order) {
            tracing::info!(
                subscription_id = subscription.id,
                order_id = renewal_order.id,
                trigger = %trigger,
                "Renewal order already processed"
            );
            return Ok(RenewOutcome::AlreadyProcessed);
        }

        let parent_order_id =
            subscription
                .parent_order_id
                .ok_or(ProvisionError::ParentOrderMissing {
                    subscription_id: subscription.id,
                })?;
        let parent_order = self
            .orders
            .get_order(parent_order_id)
            .await?
            .ok_or(ProvisionError::ParentOrderMissing {
                subscription_id: subscription.id,
            })?;

        let items = self.renewable_items(renewal_order, &parent_order);
        if items.is_empty() {
            tracing::info!(
                subscription_id = subscription.id,
                order_id = renewal_order.id,
                trigger = %trigger,
                "No license items found for renewal"
            );
            return Ok(RenewOutcome::NoRenewableItems);
        }

        let mut successful = 0_usize;
        let mut total = 0_usize;

        for item in &items {
            tracing::debug!(
                renewal_item_id = item.renewal_item_id,
                parent_item_id = item.parent_item_id,
                reference_count = item.references.len(),
                "Refreshing references for renewal item"
            );

            for reference in &item.references {
                total += 1;

                match self.license.refresh_subscription(None, reference).await {
                    Ok(response) if response.is_success() => {
                        successful += 1;
                        self.ledger.mark_processed(renewal_order).await?;
                        self.orders
                            .add_order_note(
                                renewal_order.id,
                                &format!("Refreshed license ref: {reference}"),
                            )
                            .await?;
                        tracing::info!(
                            subscription_id = subscription.id,
                            reference,
                            trigger = %trigger,
                            "Successfully refreshed license"
                        );
                    }
                    Ok(response) => {
                        self.orders
                            .add_order_note(
                                renewal_order.id,
                                &format!("Failed to refresh license ref: {reference}"),
                            )
                            .await?;
                        tracing::error!(
                            subscription_id = subscription.id,
                            reference,
                            httpcode = response.httpcode,
                            trigger = %trigger,
                            "Failed to refresh license"
                        );
                    }
                    Err(e) => {
                        self.orders
                            .add_order_note(
                                renewal_order.id,
                                &format!("Failed to refresh license ref: {reference}"),
                            )
                            .await?;
                        tracing::error!(
                            subscription_id = subscription.id,
                            reference,
                            error = %e,
                            trigger = %trigger,
                            "License refresh call failed"
                        );
                    }
                }
            }
        }

        if successful == total && total > 0 {
            self.ledger.mark_processed(renewal_order).await?;
            tracing::info!(
                subscription_id = subscription.id,
                trigger = %trigger,
                "Successfully processed all {} license renewals",
                successful
            );
        } else {
            tracing::warn!(
                subscription_id = subscription.id,
                trigger = %trigger,
                "Processed {} out of {} license renewals",
                successful,
                total
            );
        }

        Ok(RenewOutcome::Refreshed { successful, total })
    }

    /// Tie renewal items back to parent items and their stored references
    fn renewable_items(&self, renewal_order: &Order, parent_order: &Order) -> Vec<RenewableItem> {
        let mut items = Vec::new();

        for renewal_item in &renewal_order.items {
            if renewal_item.product.is_none() {
                tracing::debug!(
                    order_id = renewal_order.id,
                    item_id = renewal_item.id,
                    "Renewal item has no resolvable product, skipping"
                );
                continue;
            }

            if item_sku_guid(renewal_item).is_none() {
                tracing::debug!(
                    order_id = renewal_order.id,
                    item_id = renewal_item.id,
                    "Renewal item has no valid SKU GUID, skipping"
                );
                continue;
            }

            let parent_item_id = parent_order.items.iter().find_map(|parent_item| {
                (parent_item.product_id == renewal_item.product_id
                    && parent_item.variation_id == renewal_item.variation_id)
                    .then_some(parent_item.id)
            });
            let Some(parent_item_id) = parent_item_id else {
                tracing::warn!(
                    order_id = renewal_order.id,
                    renewal_item_id = renewal_item.id,
                    "Could not find parent order item for renewal item"
                );
                continue;
            };

            let references = self.ledger.stored_references(parent_order, parent_item_id);
            if references.is_empty() {
                tracing::warn!(
                    order_id = renewal_order.id,
                    parent_item_id,
                    "No deposit references found for parent item"
                );
                continue;
            }

            items.push(RenewableItem {
                renewal_item_id: renewal_item.id,
                parent_item_id,
                references,
            });
        }

        items
    }
}
