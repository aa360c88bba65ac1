//! Provisioning Error Types

use thiserror::Error;

use ilok_commerce::{CommerceError, OrderId, SubscriptionId};

/// Result type alias for provisioning operations
pub type Result<T> = std::result::Result<T, ProvisionError>;

/// Provisioning error types
///
/// These surface only infrastructure problems. Business-level rejections
/// (invalid SKU metadata, gateway refusals) are outcomes, not errors; the
/// handlers report them through their outcome enums and order notes.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Order could not be loaded for an event that references it
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Subscription could not be loaded for a renewal event
    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(SubscriptionId),

    /// Subscription has no parent order to source deposit references from
    #[error("Could not find parent order for subscription {subscription_id}")]
    ParentOrderMissing { subscription_id: SubscriptionId },

    /// Order platform failure
    #[error("Store error: {0}")]
    Store(#[from] CommerceError),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl ProvisionError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ProvisionError::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<anyhow::Error> for ProvisionError {
    fn from(err: anyhow::Error) -> Self {
        ProvisionError::Other(err.to_string())
    }
}
