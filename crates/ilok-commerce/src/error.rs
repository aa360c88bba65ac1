//! Commerce Error Types

use thiserror::Error;

use crate::order::OrderId;
use crate::subscription::SubscriptionId;

/// Result type alias for order platform operations
pub type Result<T> = std::result::Result<T, CommerceError>;

/// Errors surfaced by the order platform seams
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Order does not exist in the backing store
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Subscription does not exist in the backing store
    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(SubscriptionId),

    /// Escape hatch for host store implementations (databases, RPC, ...)
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl CommerceError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, CommerceError::Backend(_))
    }
}
