//! # ilok-commerce
//!
//! Commerce-side domain model for the iLok order integration: orders, line
//! items, products, subscriptions, and the metadata bag each of them carries.
//!
//! The provisioning crate never talks to a storefront directly. It goes
//! through the [`OrderStore`] and [`SubscriptionStore`] traits defined here,
//! so the same reconciliation logic runs against a live platform adapter or
//! the in-memory stores used in tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ilok_commerce::{MemoryOrderStore, Order, OrderStore};
//!
//! let store = MemoryOrderStore::new();
//!
//! let mut order = Order::new(1001);
//! order.set_meta("_ilok_user_id", "user@example.com");
//! store.save_order(&order).await?;
//!
//! let loaded = store.get_order(1001).await?;
//! ```

mod memory;
mod meta;
mod order;
mod product;
mod store;
mod subscription;
mod error;

pub use error::{CommerceError, Result};
pub use memory::{MemoryOrderStore, MemorySubscriptionStore, OrderNote};
pub use meta::MetaValue;
pub use order::{LineItem, Order, OrderId, OrderStatus, ItemId};
pub use product::{Product, ProductId};
pub use store::{OrderStore, SubscriptionStore};
pub use subscription::{Subscription, SubscriptionId};
