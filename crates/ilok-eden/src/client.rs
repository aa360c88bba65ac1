//! Eden HTTP Client
//!
//! `reqwest`-backed [`LicenseService`] implementation against the Eden
//! licensing API. Any completed HTTP exchange becomes an [`ApiResponse`],
//! whatever the status code; only transport failures surface as errors.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{EdenError, Result};
use crate::service::{ApiResponse, LicenseService};
use crate::OrderId;

/// Eden client configuration
#[derive(Clone, Debug)]
pub struct EdenConfig {
    /// Base URL of the Eden API
    pub base_url: String,

    /// Bearer token for API authentication
    pub api_token: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EdenConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".into(),
            api_token: String::new(),
            timeout_secs: 30,
        }
    }
}

impl EdenConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("EDEN_API_URL")
            .unwrap_or_else(|_| "http://localhost:8080".into());
        let api_token = std::env::var("EDEN_API_TOKEN").unwrap_or_default();
        let timeout_secs = std::env::var("EDEN_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(30);

        Self {
            base_url,
            api_token,
            timeout_secs,
        }
    }
}

/// HTTP client for the Eden licensing API
pub struct EdenClient {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl EdenClient {
    /// Create a new client from configuration
    pub fn new(config: EdenConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(EdenError::Config("base URL must not be empty".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::AUTHORIZATION,
                    reqwest::header::HeaderValue::from_str(&format!(
                        "Bearer {}",
                        config.api_token
                    ))
                    .map_err(|_| {
                        EdenError::Config("invalid API token characters".into())
                    })?,
                );
                headers.insert(
                    reqwest::header::CONTENT_TYPE,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers
            })
            .build()
            .map_err(|e| EdenError::Config(format!("failed to build HTTP client: {e}")))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(EdenConfig::from_env())
    }

    /// POST a JSON body and capture whatever comes back
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<ApiResponse> {
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EdenError::Timeout(self.timeout_secs)
                } else {
                    EdenError::Transport(e.to_string())
                }
            })?;

        let httpcode = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| EdenError::Transport(e.to_string()))?;

        Ok(ApiResponse::new(httpcode, body))
    }
}

#[async_trait]
impl LicenseService for EdenClient {
    async fn deposit_skus(
        &self,
        sku_guids: &[String],
        account_id: &str,
        order_id: OrderId,
    ) -> Result<ApiResponse> {
        let url = format!("{}/api/v1/licenses/deposit", self.base_url);
        let body = json!({
            "skuGuids": sku_guids,
            "accountId": account_id,
            "orderId": order_id,
        });

        tracing::debug!(
            endpoint = %url,
            sku_count = sku_guids.len(),
            order_id,
            "Depositing licenses"
        );
        let response = self.post_json(&url, &body).await?;
        tracing::debug!(httpcode = response.httpcode, order_id, "Deposit response received");

        Ok(response)
    }

    async fn refresh_subscription(
        &self,
        account_id: Option<&str>,
        deposit_reference: &str,
    ) -> Result<ApiResponse> {
        let url = format!("{}/api/v1/licenses/refresh", self.base_url);
        let body = json!({
            "depositReference": deposit_reference,
            "accountId": account_id,
        });

        tracing::debug!(endpoint = %url, deposit_reference, "Refreshing license");
        let response = self.post_json(&url, &body).await?;
        tracing::debug!(
            httpcode = response.httpcode,
            deposit_reference,
            "Refresh response received"
        );

        Ok(response)
    }

    fn name(&self) -> &str {
        "EdenClient"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = EdenConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.api_token.is_empty());
    }

    #[test]
    fn test_client_builds_with_valid_config() {
        let config = EdenConfig {
            base_url: "https://eden.example.com".into(),
            api_token: "secret-token".into(),
            timeout_secs: 10,
        };
        let client = EdenClient::new(config).expect("client should build");
        assert_eq!(client.name(), "EdenClient");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = EdenConfig {
            base_url: "https://eden.example.com/".into(),
            ..Default::default()
        };
        let client = EdenClient::new(config).expect("client should build");
        assert_eq!(client.base_url, "https://eden.example.com");
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let config = EdenConfig {
            base_url: "  ".into(),
            ..Default::default()
        };
        assert!(matches!(EdenClient::new(config), Err(EdenError::Config(_))));
    }

    #[test]
    fn test_invalid_token_characters_rejected() {
        let config = EdenConfig {
            base_url: "https://eden.example.com".into(),
            api_token: "bad\ntoken".into(),
            ..Default::default()
        };
        assert!(matches!(EdenClient::new(config), Err(EdenError::Config(_))));
    }

    #[test]
    fn test_client_is_trait_object_safe() {
        let client = EdenClient::new(EdenConfig::default()).expect("client should build");
        let _boxed: Box<dyn LicenseService> = Box::new(client);
    }
}
