//! License Deposit Handler
//!
//! Turns a paid order into deposited licenses: expands line-item quantities
//! into a flat SKU request, sends it to the licensing gateway, regroups the
//! returned license GUIDs back onto the items that requested them, and only
//! then marks the order processed.
//!
//! The regrouping is positional. The gateway is assumed to answer with one
//! license per requested SKU, in request order; there is no reordering or
//! matching logic beyond that alignment.

use std::sync::Arc;

use ilok_commerce::{ItemId, Order, OrderStore, SubscriptionStore};
use ilok_eden::LicenseService;

use crate::dispatch::Trigger;
use crate::error::Result;
use crate::extract::licensable_items;
use crate::ledger::{DepositReference, ProvisioningLedger};

/// Order meta key flagging an order as a subscription renewal
pub const RENEWAL_META_KEY: &str = "_subscription_renewal";

/// Creation channel of renewal orders generated by the subscription engine
const RENEWAL_CREATED_VIA: &str = "subscription";

/// Outcome of a deposit attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DepositOutcome {
    /// Processed marker already present; nothing was done
    AlreadyProcessed,

    /// Renewal orders never receive fresh deposits; the renewal path owns them
    SkippedRenewal,

    /// No line item qualified for provisioning
    NoLicensableItems,

    /// Gateway refused the deposit or was unreachable; marker untouched
    RemoteFailed,

    /// Licenses deposited and references stored
    Deposited { licenses: Vec<String> },
}

/// Deposits licenses for completed or paid orders
pub struct DepositHandler {
    orders: Arc<dyn OrderStore>,
    subscriptions: Option<Arc<dyn SubscriptionStore>>,
    license: Arc<dyn LicenseService>,
    ledger: ProvisioningLedger,
}

impl DepositHandler {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        subscriptions: Option<Arc<dyn SubscriptionStore>>,
        license: Arc<dyn LicenseService>,
    ) -> Self {
        let ledger = ProvisioningLedger::new(orders.clone());
        Self {
            orders,
            subscriptions,
            license,
            ledger,
        }
    }

    /// The ledger this handler records into
    pub fn ledger(&self) -> &ProvisioningLedger {
        &self.ledger
    }

    /// Deposit licenses for an order, once
    ///
    /// `Err` means the order platform itself failed; every gateway-side
    /// problem is reported as an outcome and an order note instead.
    pub async fn deposit(&self, order: &mut Order, trigger: Trigger) -> Result<DepositOutcome> {
        tracing::info!(
            order_id = order.id,
            status = %order.status,
            paid = order.is_paid(),
            trigger = %trigger,
            "Processing order for license creation"
        );

        if self.ledger.is_processed(order) {
            tracing::info!(
                order_id = order.id,
                trigger = %trigger,
                "Order already processed for license creation"
            );
            return Ok(DepositOutcome::AlreadyProcessed);
        }

        if self.is_renewal_order(order).await? {
            tracing::info!(
                order_id = order.id,
                trigger = %trigger,
                "Skipping renewal order, handled by the renewal path"
            );
            return Ok(DepositOutcome::SkippedRenewal);
        }

        let items = licensable_items(order);
        if items.is_empty() {
            tracing::info!(
                order_id = order.id,
                trigger = %trigger,
                "No license items found in order"
            );
            return Ok(DepositOutcome::NoLicensableItems);
        }

        // One request slot per unit: a quantity-3 item occupies three
        // aligned positions in both vectors.
        let mut sku_guids: Vec<String> = Vec::new();
        let mut item_map: Vec<ItemId> = Vec::new();
        for item in &items {
            for _ in 0..item.quantity {
                sku_guids.push(item.sku_guid.clone());
                item_map.push(item.item_id);
            }
        }

        if sku_guids.is_empty() {
            tracing::warn!(
                order_id = order.id,
                trigger = %trigger,
                "No valid SKU GUIDs found for order"
            );
            return Ok(DepositOutcome::NoLicensableItems);
        }

        // One licensing account per order.
        let account_id = items[0].account_id.clone();

        let response = match self
            .license
            .deposit_skus(&sku_guids, &account_id, order.id)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    order_id = order.id,
                    trigger = %trigger,
                    service = self.license.name(),
                    error = %e,
                    "License deposit call failed"
                );
                self.orders
                    .add_order_note(order.id, &format!("License deposit failed: {e}"))
                    .await?;
                return Ok(DepositOutcome::RemoteFailed);
            }
        };

        if !response.is_success() {
            tracing::error!(
                order_id = order.id,
                trigger = %trigger,
                httpcode = response.httpcode,
                "License deposit returned non-success status"
            );
            self.orders
                .add_order_note(
                    order.id,
                    &format!("License deposit failed. httpcode: {}", response.httpcode),
                )
                .await?;
            return Ok(DepositOutcome::RemoteFailed);
        }

        let license_guids = match response.license_guids() {
            Ok(guids) => guids,
            Err(e) => {
                tracing::error!(
                    order_id = order.id,
                    trigger = %trigger,
                    error = %e,
                    "License deposit response could not be parsed"
                );
                self.orders
                    .add_order_note(order.id, &format!("License deposit failed: {e}"))
                    .await?;
                return Ok(DepositOutcome::RemoteFailed);
            }
        };

        // Regroup positionally; zip tolerates a short response by leaving
        // the remaining slots unfilled.
        let mut buckets: Vec<(ItemId, Vec<String>)> =
            items.iter().map(|i| (i.item_id, Vec::new())).collect();
        for (item_id, guid) in item_map.iter().zip(license_guids.iter()) {
            if let Some((_, bucket)) = buckets.iter_mut().find(|(id, _)| id == item_id) {
                bucket.push(guid.clone());
            }
        }

        for (item_id, bucket) in buckets {
            let Some(reference) = DepositReference::from_guids(bucket) else {
                tracing::warn!(
                    order_id = order.id,
                    item_id,
                    "No license references received for item"
                );
                continue;
            };

            let note = match &reference {
                DepositReference::One(guid) => format!("Deposited license ref: {guid}"),
                DepositReference::Many(_) => "Deposited multiple licenses.".to_string(),
            };
            self.ledger.store_references(order, item_id, &reference).await?;
            self.orders.add_order_note(order.id, &note).await?;
        }

        self.ledger.mark_processed(order).await?;
        tracing::info!(
            order_id = order.id,
            trigger = %trigger,
            licenses = ?license_guids,
            "Successfully created licenses for order"
        );

        Ok(DepositOutcome::Deposited {
            licenses: license_guids,
        })
    }

    /// Whether this order is a subscription renewal rather than a fresh sale
    async fn is_renewal_order(&self, order: &Order) -> Result<bool> {
        if order.meta(RENEWAL_META_KEY).is_some_and(|v| !v.is_empty()) {
            return Ok(true);
        }

        if order.created_via == RENEWAL_CREATED_VIA {
            return Ok(true);
        }

        if let Some(subscriptions) = &self.subscriptions {
            return Ok(subscriptions.is_renewal_order(order).await?);
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ilok_commerce::{
        LineItem, MemoryOrderStore, MemorySubscriptionStore, MetaValue, Product,
    };
    use ilok_eden::{ApiResponse, MockLicenseService};

    use crate::extract::{ACCOUNT_ID_KEY, SKU_GUID_KEY};
    use crate::ledger::PROCESSED_KEY;

    fn licensable_item(item_id: u64, product_id: u64, quantity: u32, sku: &str) -> LineItem {
        let product = Product::new(product_id).with_meta(SKU_GUID_KEY, sku);
        let mut item = LineItem::new(item_id, product_id, quantity).with_product(product);
        item.set_meta(ACCOUNT_ID_KEY, "ilokuser42");
        item
    }

    struct Fixture {
        store: Arc<MemoryOrderStore>,
        mock: Arc<MockLicenseService>,
        handler: DepositHandler,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryOrderStore::new());
        let mock = Arc::new(MockLicenseService::new());
        let handler = DepositHandler::new(store.clone(), None, mock.clone());
        Fixture {
            store,
            mock,
            handler,
        }
    }

    async fn seeded_order(fixture: &Fixture) -> Order {
        let mut order = Order::new(100);
        order.push_item(licensable_item(1, 7, 2, "sku-guid-aaaa"));
        order.push_item(licensable_item(2, 8, 1, "sku-guid-bbbb"));
        fixture.store.insert(order.clone()).await;
        order
    }

    #[tokio::test]
    async fn test_deposit_expands_quantities_and_regroups() {
        let f = fixture();
        let mut order = seeded_order(&f).await;
        f.mock
            .queue_deposit_guids(vec!["g-1".into(), "g-2".into(), "g-3".into()])
            .await;

        let outcome = f
            .handler
            .deposit(&mut order, Trigger::PaymentCompleted)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            DepositOutcome::Deposited {
                licenses: vec!["g-1".into(), "g-2".into(), "g-3".into()]
            }
        );

        // The request carried one SKU per unit.
        let calls = f.mock.deposits().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].sku_guids,
            vec!["sku-guid-aaaa", "sku-guid-aaaa", "sku-guid-bbbb"]
        );
        assert_eq!(calls[0].account_id, "ilokuser42");

        // Quantity-2 item gets a list, quantity-1 item a scalar.
        let saved = f.store.get_order(100).await.unwrap().unwrap();
        assert_eq!(
            f.handler.ledger().stored_references(&saved, 1),
            vec!["g-1", "g-2"]
        );
        assert_eq!(f.handler.ledger().stored_references(&saved, 2), vec!["g-3"]);
        assert!(matches!(
            saved.meta("_deposit_reference_value_2"),
            Some(MetaValue::Text(_))
        ));
        assert!(f.handler.ledger().is_processed(&saved));

        let notes: Vec<String> = f
            .store
            .notes_for(100)
            .await
            .into_iter()
            .map(|n| n.text)
            .collect();
        assert_eq!(
            notes,
            vec!["Deposited multiple licenses.", "Deposited license ref: g-3"]
        );
    }

    #[tokio::test]
    async fn test_second_deposit_is_a_no_op() {
        let f = fixture();
        let mut order = seeded_order(&f).await;

        f.handler
            .deposit(&mut order, Trigger::PaymentCompleted)
            .await
            .unwrap();
        let outcome = f
            .handler
            .deposit(&mut order, Trigger::OrderCompleted)
            .await
            .unwrap();

        assert_eq!(outcome, DepositOutcome::AlreadyProcessed);
        assert_eq!(f.mock.deposits().await.len(), 1);
    }

    #[tokio::test]
    async fn test_renewal_meta_skips_deposit() {
        let f = fixture();
        let mut order = seeded_order(&f).await;
        order.set_meta(RENEWAL_META_KEY, "5005");

        let outcome = f
            .handler
            .deposit(&mut order, Trigger::OrderCompleted)
            .await
            .unwrap();
        assert_eq!(outcome, DepositOutcome::SkippedRenewal);
        assert!(f.mock.deposits().await.is_empty());
    }

    #[tokio::test]
    async fn test_subscription_created_via_skips_deposit() {
        let f = fixture();
        let mut order = seeded_order(&f).await;
        order.created_via = "subscription".into();

        let outcome = f
            .handler
            .deposit(&mut order, Trigger::OrderCompleted)
            .await
            .unwrap();
        assert_eq!(outcome, DepositOutcome::SkippedRenewal);
    }

    #[tokio::test]
    async fn test_subscription_store_predicate_skips_deposit() {
        let store = Arc::new(MemoryOrderStore::new());
        let subscriptions = Arc::new(MemorySubscriptionStore::new());
        let mock = Arc::new(MockLicenseService::new());
        let handler = DepositHandler::new(store.clone(), Some(subscriptions.clone()), mock.clone());

        let mut order = Order::new(100);
        order.push_item(licensable_item(1, 7, 1, "sku-guid-aaaa"));
        store.insert(order.clone()).await;
        subscriptions.register_renewal_order(100).await;

        let outcome = handler
            .deposit(&mut order, Trigger::PaymentCompleted)
            .await
            .unwrap();
        assert_eq!(outcome, DepositOutcome::SkippedRenewal);
        assert!(mock.deposits().await.is_empty());
    }

    #[tokio::test]
    async fn test_no_licensable_items() {
        let f = fixture();
        let mut order = Order::new(101);
        order.push_item(LineItem::new(1, 7, 1));
        f.store.insert(order.clone()).await;

        let outcome = f
            .handler
            .deposit(&mut order, Trigger::PaymentCompleted)
            .await
            .unwrap();
        assert_eq!(outcome, DepositOutcome::NoLicensableItems);
        assert!(f.mock.deposits().await.is_empty());
    }

    #[tokio::test]
    async fn test_gateway_rejection_leaves_order_retryable() {
        let f = fixture();
        let mut order = seeded_order(&f).await;
        f.mock.set_deposit_status(500).await;

        let outcome = f
            .handler
            .deposit(&mut order, Trigger::PaymentCompleted)
            .await
            .unwrap();
        assert_eq!(outcome, DepositOutcome::RemoteFailed);

        let saved = f.store.get_order(100).await.unwrap().unwrap();
        assert!(saved.meta(PROCESSED_KEY).is_none());
        let notes = f.store.notes_for(100).await;
        assert_eq!(notes[0].text, "License deposit failed. httpcode: 500");

        // Once the gateway recovers, the same order deposits normally.
        f.mock.set_deposit_status(200).await;
        let outcome = f
            .handler
            .deposit(&mut order, Trigger::OrderCompleted)
            .await
            .unwrap();
        assert!(matches!(outcome, DepositOutcome::Deposited { .. }));
        assert_eq!(f.mock.deposits().await.len(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_noted_without_marking() {
        let f = fixture();
        let mut order = seeded_order(&f).await;
        f.mock.set_transport_failure(true).await;

        let outcome = f
            .handler
            .deposit(&mut order, Trigger::PaymentCompleted)
            .await
            .unwrap();
        assert_eq!(outcome, DepositOutcome::RemoteFailed);

        let notes = f.store.notes_for(100).await;
        assert_eq!(notes.len(), 1);
        assert!(notes[0].text.starts_with("License deposit failed:"));

        let saved = f.store.get_order(100).await.unwrap().unwrap();
        assert!(!f.handler.ledger().is_processed(&saved));
    }

    #[tokio::test]
    async fn test_short_response_stores_what_arrived_and_still_marks() {
        let f = fixture();
        let mut order = seeded_order(&f).await;
        // Three units requested, one license returned.
        f.mock.queue_deposit_guids(vec!["g-only".into()]).await;

        let outcome = f
            .handler
            .deposit(&mut order, Trigger::PaymentCompleted)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            DepositOutcome::Deposited {
                licenses: vec!["g-only".into()]
            }
        );

        let saved = f.store.get_order(100).await.unwrap().unwrap();
        // A single received reference stores as a scalar even on a
        // quantity-2 item.
        assert_eq!(f.handler.ledger().stored_references(&saved, 1), vec!["g-only"]);
        assert!(f.handler.ledger().stored_references(&saved, 2).is_empty());
        assert!(f.handler.ledger().is_processed(&saved));
    }

    #[tokio::test]
    async fn test_unparsable_success_body_is_remote_failure() {
        struct BadBodyService;

        #[async_trait]
        impl LicenseService for BadBodyService {
            async fn deposit_skus(
                &self,
                _sku_guids: &[String],
                _account_id: &str,
                _order_id: u64,
            ) -> ilok_eden::Result<ApiResponse> {
                Ok(ApiResponse::new(200, "definitely not json"))
            }

            async fn refresh_subscription(
                &self,
                _account_id: Option<&str>,
                _deposit_reference: &str,
            ) -> ilok_eden::Result<ApiResponse> {
                Ok(ApiResponse::new(200, "{}"))
            }

            fn name(&self) -> &str {
                "BadBodyService"
            }
        }

        let store = Arc::new(MemoryOrderStore::new());
        let handler = DepositHandler::new(store.clone(), None, Arc::new(BadBodyService));

        let mut order = Order::new(102);
        order.push_item(licensable_item(1, 7, 1, "sku-guid-aaaa"));
        store.insert(order.clone()).await;

        let outcome = handler
            .deposit(&mut order, Trigger::PaymentCompleted)
            .await
            .unwrap();
        assert_eq!(outcome, DepositOutcome::RemoteFailed);

        let saved = store.get_order(102).await.unwrap().unwrap();
        assert!(!handler.ledger().is_processed(&saved));
        let notes = store.notes_for(102).await;
        assert!(notes[0].text.starts_with("License deposit failed:"));
    }
}
