//! # ilok-eden
//!
//! Client crate for the Eden licensing API: the [`LicenseService`] trait the
//! provisioning handlers depend on, the `reqwest`-backed [`EdenClient`], and
//! a programmable [`MockLicenseService`] for tests.
//!
//! A deliberate quirk of this seam: any HTTP exchange that completes is an
//! `Ok(ApiResponse)`, including 4xx and 5xx answers. `Err(EdenError)` means
//! the exchange itself failed (timeout, connection refused, bad config).
//! Callers branch on [`ApiResponse::is_success`] for business outcomes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ilok_eden::{EdenClient, EdenConfig, LicenseService};
//!
//! let client = EdenClient::new(EdenConfig::from_env())?;
//! let skus = vec!["a1b2c3d4e5".to_string()];
//!
//! let response = client.deposit_skus(&skus, "user@example.com", 1001).await?;
//! if response.is_success() {
//!     let guids = response.license_guids()?;
//! }
//! ```

mod client;
mod mock;
mod service;
mod error;

/// Order identifier as the commerce side knows it
pub type OrderId = u64;

pub use client::{EdenClient, EdenConfig};
pub use error::{EdenError, Result};
pub use mock::{DepositCall, MockLicenseService, RefreshCall};
pub use service::{ApiResponse, LicenseService};
