use crate::client::{FetchFuture, JsonFetcher, QueryParams};
use crate::config::FlashbladeConfig;
use crate::error::ClientError;
use log::{debug, info};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;

/// Header carrying the long-lived API token on login
const API_TOKEN_HEADER: &str = "api-token";

/// Header carrying the session token on every other request
const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Default REST API version used for data requests
pub const DEFAULT_API_VERSION: &str = "1.8";

/// Authenticated client for the FlashBlade REST API
///
/// Exchanges an API token for a session token on [`login`](Self::login) and
/// sends that session token with every GET issued through [`JsonFetcher`].
pub struct FlashbladeClient {
    client: Client,
    base_url: String,
    api_version: String,
    api_token: String,
    session_token: Option<String>,
}

impl FlashbladeClient {
    /// Create a client for the array at `endpoint` with default settings
    ///
    /// # Arguments
    /// * `endpoint` - Array host name or URL (e.g., "flashblade.example.com")
    /// * `api_token` - API token issued for a FlashBlade admin user
    ///
    /// # Example
    /// ```
    /// use fbusage::client::FlashbladeClient;
    ///
    /// let client = FlashbladeClient::new(
    ///     "flashblade.example.com",
    ///     "T-0123".to_string(),
    /// ).unwrap();
    /// assert!(!client.is_authenticated());
    /// ```
    pub fn new(endpoint: &str, api_token: String) -> Result<Self, ClientError> {
        Self::from_config(&FlashbladeConfig {
            endpoint: endpoint.to_string(),
            api_token: Some(api_token),
            ..FlashbladeConfig::default()
        })
    }

    /// Create a client from the `[flashblade]` configuration section
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Build` if the endpoint is empty or the underlying
    /// HTTP client cannot be constructed, and `ClientError::Auth` if no API
    /// token is configured.
    pub fn from_config(config: &FlashbladeConfig) -> Result<Self, ClientError> {
        if config.endpoint.trim().is_empty() {
            return Err(ClientError::Build("FlashBlade endpoint is empty".to_string()));
        }

        let api_token = config
            .api_token
            .clone()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ClientError::Auth("no API token configured".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            // Arrays usually present self-signed certificates
            .danger_accept_invalid_certs(config.insecure)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            client,
            base_url: Self::normalize_base_url(&config.endpoint),
            api_version: config.api_version.clone(),
            api_token,
            session_token: None,
        })
    }

    /// Turn a bare host name into an https URL without a trailing slash
    fn normalize_base_url(endpoint: &str) -> String {
        let endpoint = endpoint.trim().trim_end_matches('/');
        if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("https://{}", endpoint)
        }
    }

    fn login_url(&self) -> String {
        format!("{}/api/login", self.base_url)
    }

    fn logout_url(&self) -> String {
        format!("{}/api/logout", self.base_url)
    }

    /// Versioned URL of a data endpoint such as `file-systems`
    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/api/{}/{}",
            self.base_url,
            self.api_version,
            endpoint.trim_start_matches('/')
        )
    }

    /// Whether a session token is currently held
    pub fn is_authenticated(&self) -> bool {
        self.session_token.is_some()
    }

    /// Exchange the API token for a session token
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` if the array rejects the token and
    /// `ClientError::Auth` if the response carries no session token.
    pub async fn login(&mut self) -> Result<(), ClientError> {
        info!("Logging in to FlashBlade at {}", self.base_url);

        let response = self
            .client
            .post(self.login_url())
            .header(API_TOKEN_HEADER, &self.api_token)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let session_token = response
            .headers()
            .get(AUTH_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ClientError::Auth(format!(
                    "login response did not include an {} header",
                    AUTH_TOKEN_HEADER
                ))
            })?;

        self.session_token = Some(session_token);
        debug!("FlashBlade session established");
        Ok(())
    }

    /// End the current session; a no-op when not logged in
    pub async fn logout(&mut self) -> Result<(), ClientError> {
        let Some(session_token) = self.session_token.take() else {
            return Ok(());
        };

        let response = self
            .client
            .post(self.logout_url())
            .header(AUTH_TOKEN_HEADER, session_token)
            .send()
            .await?;
        Self::check_status(response).await?;

        debug!("FlashBlade session closed");
        Ok(())
    }

    /// Authenticated GET of a versioned endpoint, returning the JSON body
    async fn get(
        &self,
        endpoint: &str,
        params: Option<&QueryParams>,
    ) -> Result<Value, ClientError> {
        let session_token = self
            .session_token
            .as_deref()
            .ok_or(ClientError::NotAuthenticated)?;

        let url = self.api_url(endpoint);
        debug!("GET {} params={:?}", url, params);

        let mut request = self.client.get(url).header(AUTH_TOKEN_HEADER, session_token);
        if let Some(params) = params {
            request = request.query(params);
        }

        let response = Self::check_status(request.send().await?).await?;
        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)?;
        Ok(value)
    }

    /// Map non-2xx responses to `ClientError::Status`
    async fn check_status(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

impl JsonFetcher for FlashbladeClient {
    fn fetch_json<'a>(
        &'a self,
        endpoint: &'a str,
        params: Option<&'a QueryParams>,
    ) -> FetchFuture<'a> {
        Box::pin(self.get(endpoint, params))
    }
}
