//! Mock License Service
//!
//! For testing and demo purposes. Programmable status codes and response
//! bodies, with call recording so tests can assert on exactly what the
//! handlers sent.

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{EdenError, Result};
use crate::service::{ApiResponse, LicenseService};
use crate::OrderId;

/// A recorded deposit call
#[derive(Clone, Debug)]
pub struct DepositCall {
    pub sku_guids: Vec<String>,
    pub account_id: String,
    pub order_id: OrderId,
}

/// A recorded refresh call
#[derive(Clone, Debug)]
pub struct RefreshCall {
    pub account_id: Option<String>,
    pub deposit_reference: String,
}

struct MockState {
    deposit_status: u16,
    refresh_status: u16,
    failing_refs: HashSet<String>,
    queued_deposits: VecDeque<Vec<String>>,
    transport_failure: bool,
    deposits: Vec<DepositCall>,
    refreshes: Vec<RefreshCall>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            deposit_status: 200,
            refresh_status: 200,
            failing_refs: HashSet::new(),
            queued_deposits: VecDeque::new(),
            transport_failure: false,
            deposits: Vec::new(),
            refreshes: Vec::new(),
        }
    }
}

/// Programmable licensing service double
///
/// Successful deposits answer with one license GUID per requested SKU unless
/// a response has been queued via [`queue_deposit_guids`], which lets tests
/// exercise short or reordered gateway responses.
///
/// [`queue_deposit_guids`]: MockLicenseService::queue_deposit_guids
#[derive(Default)]
pub struct MockLicenseService {
    state: Mutex<MockState>,
}

impl MockLicenseService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status code returned by subsequent deposit calls
    pub async fn set_deposit_status(&self, status: u16) {
        self.state.lock().await.deposit_status = status;
    }

    /// Status code returned by subsequent refresh calls
    pub async fn set_refresh_status(&self, status: u16) {
        self.state.lock().await.refresh_status = status;
    }

    /// Make refreshes of one specific reference fail with a 500
    pub async fn fail_refresh_for(&self, reference: impl Into<String>) {
        self.state.lock().await.failing_refs.insert(reference.into());
    }

    /// Queue an explicit GUID list for the next successful deposit
    pub async fn queue_deposit_guids(&self, guids: Vec<String>) {
        self.state.lock().await.queued_deposits.push_back(guids);
    }

    /// Simulate connection-level failure on every call
    pub async fn set_transport_failure(&self, failing: bool) {
        self.state.lock().await.transport_failure = failing;
    }

    /// Deposit calls recorded so far, oldest first
    pub async fn deposits(&self) -> Vec<DepositCall> {
        self.state.lock().await.deposits.clone()
    }

    /// Refresh calls recorded so far, oldest first
    pub async fn refreshes(&self) -> Vec<RefreshCall> {
        self.state.lock().await.refreshes.clone()
    }
}

#[async_trait]
impl LicenseService for MockLicenseService {
    async fn deposit_skus(
        &self,
        sku_guids: &[String],
        account_id: &str,
        order_id: OrderId,
    ) -> Result<ApiResponse> {
        let mut state = self.state.lock().await;
        if state.transport_failure {
            return Err(EdenError::Transport("simulated connection failure".into()));
        }

        state.deposits.push(DepositCall {
            sku_guids: sku_guids.to_vec(),
            account_id: account_id.to_string(),
            order_id,
        });

        if state.deposit_status != 200 {
            return Ok(ApiResponse::new(
                state.deposit_status,
                r#"{"error":"deposit rejected"}"#,
            ));
        }

        let guids = state.queued_deposits.pop_front().unwrap_or_else(|| {
            sku_guids
                .iter()
                .map(|_| uuid::Uuid::new_v4().to_string())
                .collect()
        });
        let licenses: Vec<serde_json::Value> = guids
            .iter()
            .map(|g| serde_json::json!({ "licenseGuid": g }))
            .collect();
        let body = serde_json::json!({ "licenses": licenses }).to_string();

        Ok(ApiResponse::new(200, body))
    }

    async fn refresh_subscription(
        &self,
        account_id: Option<&str>,
        deposit_reference: &str,
    ) -> Result<ApiResponse> {
        let mut state = self.state.lock().await;
        if state.transport_failure {
            return Err(EdenError::Transport("simulated connection failure".into()));
        }

        state.refreshes.push(RefreshCall {
            account_id: account_id.map(str::to_string),
            deposit_reference: deposit_reference.to_string(),
        });

        let status = if state.failing_refs.contains(deposit_reference) {
            500
        } else {
            state.refresh_status
        };
        let body = if status == 200 {
            r#"{"status":"refreshed"}"#
        } else {
            r#"{"error":"refresh rejected"}"#
        };

        Ok(ApiResponse::new(status, body))
    }

    fn name(&self) -> &str {
        "MockLicenseService"
    }
}
