//! License Service Seam
//!
//! The trait the provisioning handlers call instead of a concrete HTTP
//! client, plus the response envelope both implementations share.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::OrderId;

/// Raw exchange outcome from the licensing API
///
/// Carries the status code and unparsed body of any completed HTTP exchange.
/// Non-2xx answers arrive here too; only transport failures become errors.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    /// HTTP status code of the exchange
    pub httpcode: u16,

    /// Raw response body
    pub body: String,
}

#[derive(Deserialize)]
struct DepositBody {
    licenses: Vec<LicenseRecord>,
}

#[derive(Deserialize)]
struct LicenseRecord {
    #[serde(rename = "licenseGuid")]
    license_guid: String,
}

impl ApiResponse {
    pub fn new(httpcode: u16, body: impl Into<String>) -> Self {
        Self {
            httpcode,
            body: body.into(),
        }
    }

    /// Whether the exchange succeeded
    pub fn is_success(&self) -> bool {
        self.httpcode == 200
    }

    /// License GUIDs from a deposit response, in response order
    ///
    /// Order is significant: callers align these positionally with the SKU
    /// list they sent. Only meaningful on a successful deposit exchange.
    pub fn license_guids(&self) -> Result<Vec<String>> {
        let parsed: DepositBody = serde_json::from_str(&self.body)?;
        Ok(parsed.licenses.into_iter().map(|l| l.license_guid).collect())
    }
}

/// Licensing gateway operations
///
/// Implementations must be safe to share across tasks. All methods return an
/// [`ApiResponse`] envelope for any completed exchange; `Err` is reserved for
/// transport and configuration failures.
#[async_trait]
pub trait LicenseService: Send + Sync {
    /// Deposit one license per SKU GUID into the holder's account
    ///
    /// `sku_guids` carries one entry per unit, so a quantity-3 line item
    /// contributes its GUID three times.
    async fn deposit_skus(
        &self,
        sku_guids: &[String],
        account_id: &str,
        order_id: OrderId,
    ) -> Result<ApiResponse>;

    /// Extend a previously deposited license for another billing period
    async fn refresh_subscription(
        &self,
        account_id: Option<&str>,
        deposit_reference: &str,
    ) -> Result<ApiResponse>;

    /// Service name for log attribution
    fn name(&self) -> &str;
}
