//! Lifecycle Event Dispatch
//!
//! The host platform reports order lifecycle events; this module routes them
//! to the deposit and renewal handlers and applies the follow-up status
//! transitions. Dispatch never returns an error: a provisioning problem must
//! not break the host's own order processing, so every failure is logged and
//! absorbed here.

use std::sync::Arc;

use ilok_commerce::{
    Order, OrderId, OrderStatus, OrderStore, SubscriptionId, SubscriptionStore,
};
use ilok_eden::LicenseService;
use serde::{Deserialize, Serialize};

use crate::deposit::DepositHandler;
use crate::ledger::ProvisioningLedger;
use crate::renewal::RenewalHandler;

/// An order lifecycle event as reported by the host platform
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Payment captured for an order
    PaymentCompleted { order_id: OrderId },

    /// Order entered the processing status
    OrderProcessing { order_id: OrderId },

    /// Order entered the completed status
    OrderCompleted { order_id: OrderId },

    /// A subscription renewal payment was captured
    SubscriptionRenewalPaymentCompleted {
        subscription_id: SubscriptionId,
        order_id: OrderId,
    },
}

/// Which event caused a handler invocation; threaded into every log line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    PaymentCompleted,
    OrderProcessing,
    OrderCompleted,
    SubscriptionRenewalPaymentCompleted,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::PaymentCompleted => "payment_completed",
            Trigger::OrderProcessing => "order_processing",
            Trigger::OrderCompleted => "order_completed",
            Trigger::SubscriptionRenewalPaymentCompleted => {
                "subscription_renewal_payment_complete"
            }
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Routes lifecycle events to the provisioning handlers
pub struct EventDispatcher {
    orders: Arc<dyn OrderStore>,
    subscriptions: Option<Arc<dyn SubscriptionStore>>,
    deposit: DepositHandler,
    renewal: RenewalHandler,
    ledger: ProvisioningLedger,
}

impl EventDispatcher {
    /// Wire up the handlers against the injected stores and license service
    ///
    /// A subscription store is optional: hosts without a subscription engine
    /// simply never see renewal events, and renewal-order detection falls
    /// back to order metadata alone.
    pub fn new(
        orders: Arc<dyn OrderStore>,
        subscriptions: Option<Arc<dyn SubscriptionStore>>,
        license: Arc<dyn LicenseService>,
    ) -> Self {
        let deposit = DepositHandler::new(orders.clone(), subscriptions.clone(), license.clone());
        let renewal = RenewalHandler::new(orders.clone(), license);
        let ledger = ProvisioningLedger::new(orders.clone());

        Self {
            orders,
            subscriptions,
            deposit,
            renewal,
            ledger,
        }
    }

    /// Handle one lifecycle event to completion
    pub async fn dispatch(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::PaymentCompleted { order_id } => {
                self.on_payment_completed(order_id).await;
            }
            LifecycleEvent::OrderProcessing { order_id } => {
                self.on_order_processing(order_id).await;
            }
            LifecycleEvent::OrderCompleted { order_id } => {
                self.on_order_completed(order_id).await;
            }
            LifecycleEvent::SubscriptionRenewalPaymentCompleted {
                subscription_id,
                order_id,
            } => {
                self.on_subscription_renewal(subscription_id, order_id).await;
            }
        }
    }

    /// Payment capture deposits licenses but never touches order status
    async fn on_payment_completed(&self, order_id: OrderId) {
        let trigger = Trigger::PaymentCompleted;
        let Some(mut order) = self.load_order(order_id, trigger).await else {
            return;
        };

        if self.ledger.is_processed(&order) {
            return;
        }

        if let Err(e) = self.deposit.deposit(&mut order, trigger).await {
            tracing::error!(order_id, trigger = %trigger, error = %e, "Error processing order");
        }
    }

    /// Processing orders deposit if needed, then advance to completed
    async fn on_order_processing(&self, order_id: OrderId) {
        let trigger = Trigger::OrderProcessing;
        let Some(mut order) = self.load_order(order_id, trigger).await else {
            return;
        };

        if !self.ledger.is_processed(&order) {
            if let Err(e) = self.deposit.deposit(&mut order, trigger).await {
                tracing::error!(order_id, trigger = %trigger, error = %e, "Error processing order");
            }

            // Deposit did not take; leave the order where it is so the
            // problem stays visible.
            if !self.ledger.is_processed(&order) {
                tracing::warn!(
                    order_id,
                    trigger = %trigger,
                    "Tried to create licenses but order is not marked as processed"
                );
                return;
            }
        }

        self.update_status(order_id, OrderStatus::Completed, trigger)
            .await;
    }

    /// Completed orders deposit if needed; an unprovisioned order is sent
    /// back to processing for another pass
    async fn on_order_completed(&self, order_id: OrderId) {
        let trigger = Trigger::OrderCompleted;
        let Some(mut order) = self.load_order(order_id, trigger).await else {
            return;
        };

        if self.ledger.is_processed(&order) {
            return;
        }

        if let Err(e) = self.deposit.deposit(&mut order, trigger).await {
            tracing::error!(order_id, trigger = %trigger, error = %e, "Error processing order");
        }

        if !self.ledger.is_processed(&order) {
            self.update_status(order_id, OrderStatus::Processing, trigger)
                .await;
        }
    }

    /// Renewal payments refresh the parent order's licenses, then complete
    /// the renewal order once it is marked processed
    async fn on_subscription_renewal(&self, subscription_id: SubscriptionId, order_id: OrderId) {
        let trigger = Trigger::SubscriptionRenewalPaymentCompleted;

        let Some(subscriptions) = &self.subscriptions else {
            tracing::error!(
                subscription_id,
                trigger = %trigger,
                "No subscription store configured for renewal events"
            );
            return;
        };

        let subscription = match subscriptions.get_subscription(subscription_id).await {
            Ok(Some(subscription)) => subscription,
            Ok(None) => {
                tracing::error!(subscription_id, trigger = %trigger, "Subscription not found");
                return;
            }
            Err(e) => {
                tracing::error!(
                    subscription_id,
                    trigger = %trigger,
                    error = %e,
                    "Failed to load subscription"
                );
                return;
            }
        };

        let Some(mut order) = self.load_order(order_id, trigger).await else {
            return;
        };

        if let Err(e) = self
            .renewal
            .renew(&subscription, &mut order, trigger)
            .await
        {
            tracing::error!(
                subscription_id,
                order_id,
                trigger = %trigger,
                error = %e,
                "Error processing subscription renewal"
            );
        }

        if self.ledger.is_processed(&order) {
            self.update_status(order_id, OrderStatus::Completed, trigger)
                .await;
        }
    }

    async fn load_order(&self, order_id: OrderId, trigger: Trigger) -> Option<Order> {
        match self.orders.get_order(order_id).await {
            Ok(Some(order)) => Some(order),
            Ok(None) => {
                tracing::error!(order_id, trigger = %trigger, "Order not found");
                None
            }
            Err(e) => {
                tracing::error!(order_id, trigger = %trigger, error = %e, "Failed to load order");
                None
            }
        }
    }

    async fn update_status(&self, order_id: OrderId, status: OrderStatus, trigger: Trigger) {
        if let Err(e) = self.orders.update_status(order_id, status).await {
            tracing::error!(
                order_id,
                trigger = %trigger,
                status = %status,
                error = %e,
                "Failed to update order status"
            );
        }
    }
}
