//! JSON GET with a timeout and bounded retries

use crate::error::RegistryError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff before the first retry; doubled per attempt, capped at [`MAX_BACKOFF`]
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// HTTP client shared by the registry and caption clients
#[derive(Debug, Clone)]
pub struct JsonClient {
    client: Client,
    attempts: usize,
    backoff: Duration,
}

impl JsonClient {
    pub fn new(timeout_secs: u64, attempts: usize) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("keyhoist/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RegistryError::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            attempts: attempts.max(1),
            backoff: DEFAULT_BACKOFF,
        })
    }

    /// Override the initial retry backoff
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// GET `url` and decode the JSON body, retrying transient failures
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        bearer: Option<&str>,
    ) -> Result<T, RegistryError> {
        let mut attempt = 1;
        loop {
            match self.get_once(url, bearer).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.attempts => {
                    let backoff = self
                        .backoff
                        .saturating_mul(2u32.saturating_pow(attempt as u32 - 1))
                        .min(MAX_BACKOFF);
                    warn!(
                        "GET {url} failed: {e}. Retrying in {backoff:?} (attempt {attempt}/{})",
                        self.attempts
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        url: &str,
        bearer: Option<&str>,
    ) -> Result<T, RegistryError> {
        debug!("GET {url}");
        let mut request = self.client.get(url).header("Accept", "application/json");
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(RegistryError::from_reqwest)?;
        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await.map_err(RegistryError::from_reqwest)?;
        serde_json::from_str(&body).map_err(|e| RegistryError::Decode(format!("{url}: {e}")))
    }
}
