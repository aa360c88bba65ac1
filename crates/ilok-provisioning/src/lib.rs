//! # ilok-provisioning
//!
//! Order-to-license reconciliation between a storefront and the Eden
//! licensing gateway: deposit licenses when an order is paid or completed,
//! refresh them when a subscription renews, and keep both paths idempotent
//! under duplicate or out-of-order event delivery.
//!
//! The processed marker in order metadata is the single source of truth for
//! "this order already got its licenses". Events may arrive twice, in any
//! order, from any of the host's hooks; whichever handler runs first wins and
//! the rest become no-ops.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ilok_eden::{EdenClient, EdenConfig};
//! use ilok_provisioning::{EventDispatcher, LifecycleEvent};
//!
//! let eden = Arc::new(EdenClient::new(EdenConfig::from_env())?);
//! let dispatcher = EventDispatcher::new(orders, Some(subscriptions), eden);
//!
//! // Bridge host platform hooks into lifecycle events.
//! dispatcher
//!     .dispatch(LifecycleEvent::PaymentCompleted { order_id: 1001 })
//!     .await;
//! ```

mod deposit;
mod dispatch;
mod extract;
mod ledger;
mod renewal;
mod validate;
mod error;

pub use deposit::{DepositHandler, DepositOutcome, RENEWAL_META_KEY};
pub use dispatch::{EventDispatcher, LifecycleEvent, Trigger};
pub use error::{ProvisionError, Result};
pub use extract::{
    item_account_id, item_sku_guid, licensable_items, LicensableItem, ACCOUNT_ID_FALLBACK_KEY,
    ACCOUNT_ID_KEY, SKU_GUID_KEY,
};
pub use ledger::{
    order_reference_key, DepositReference, ProvisioningLedger, ITEM_REFERENCE_KEY, PROCESSED_KEY,
};
pub use renewal::{RenewOutcome, RenewalHandler};
pub use validate::{validate_account_id, validate_sku_guid, SKU_GUID_MIN_LEN};
