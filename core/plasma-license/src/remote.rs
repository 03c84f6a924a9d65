//! Validator that forwards to a remote license server.
//!
//! One attempt per call with a fixed timeout. Any transport failure,
//! non-success status or unparseable body fails closed.

use crate::api::{
    ApiReply, CheckAccessRequest, CheckAccessResponse, HealthResponse, ValidateRequest,
    ValidateResponse,
};
use crate::error::{LicenseError, LicenseResult};
use crate::store::{Access, Validation, ValidationReason};
use crate::validator::LicenseValidator;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Per-request timeout for the license server.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the admin API of a license server.
#[derive(Debug, Clone)]
pub struct RemoteValidator {
    client: Client,
    base_url: String,
    token: String,
}

impl RemoteValidator {
    /// Creates a client for the server at `base_url` using [`REQUEST_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Config`] if the url or token is empty.
    pub fn new(base_url: &str, token: &str) -> LicenseResult<Self> {
        Self::with_timeout(base_url, token, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, token: &str, timeout: Duration) -> LicenseResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(LicenseError::Config("license server url is empty".to_string()));
        }
        if token.trim().is_empty() {
            return Err(LicenseError::Config("license server token is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LicenseError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            token: token.trim().to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns true if the server answers `/health` with `"healthy"`.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("License server health check failed: {}", e);
                return false;
            }
        };
        match response.error_for_status() {
            Ok(response) => response
                .json::<HealthResponse>()
                .await
                .map(|health| health.status == "healthy")
                .unwrap_or(false),
            Err(e) => {
                warn!("License server reported unhealthy: {}", e);
                false
            }
        }
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> LicenseResult<ApiReply<T>>
    where
        B: serde::Serialize + Sync,
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| LicenseError::Network(e.to_string()))?;

        response
            .json::<ApiReply<T>>()
            .await
            .map_err(|e| LicenseError::Network(e.to_string()))
    }
}

#[async_trait]
impl LicenseValidator for RemoteValidator {
    async fn validate(&self, key: &str, identity: Option<&str>) -> Validation {
        let request = ValidateRequest {
            license_key: Some(key.trim().to_string()),
            user_identifier: identity.map(str::to_string),
        };
        match self.post::<_, ValidateResponse>("/api/validate", &request).await {
            Ok(ApiReply::Success(response)) => response.into(),
            Ok(ApiReply::Failure(failure)) => Validation::rejected(ValidationReason::Remote(
                format!("Validation error: {}", failure.error),
            )),
            Err(e) => {
                warn!("Remote validation failed: {}", e);
                Validation::rejected(ValidationReason::ServerUnreachable)
            }
        }
    }

    async fn check_access(&self, identity: Option<&str>) -> Access {
        let request = CheckAccessRequest {
            user_identifier: identity.map(str::to_string),
        };
        match self
            .post::<_, CheckAccessResponse>("/api/check_access", &request)
            .await
        {
            Ok(ApiReply::Success(response)) => response.into(),
            Ok(ApiReply::Failure(failure)) => {
                warn!("Remote access check rejected: {}", failure.error);
                Access::denied()
            }
            Err(e) => {
                warn!("Remote access check failed: {}", e);
                Access::denied()
            }
        }
    }
}
