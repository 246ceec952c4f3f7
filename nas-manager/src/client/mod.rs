//! HTTP client for the TrueNAS SCALE REST API (`/api/v2.0`).
//!
//! Every call maps transport errors, non-2xx statuses and undecodable bodies
//! to a [`NasError`]; callers only see typed records.

mod dataset;
mod replication;
mod snapshot;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::TrueNasConfig;
use crate::models::{Alert, Disk, Pool, Service, SystemInfo};
use crate::{NasError, Result};

#[derive(Debug, Clone)]
pub struct TrueNasClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

/// TrueNAS error bodies look like `{"message": "..."}` or a validation map.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl TrueNasClient {
    pub fn new(config: &TrueNasConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_ssl)
            .user_agent(concat!("nas-manager/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: config.base_url(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn system_info(&self) -> Result<SystemInfo> {
        self.get("system/info").await
    }

    pub async fn pools(&self) -> Result<Vec<Pool>> {
        self.get("pool").await
    }

    pub async fn pool(&self, name: &str) -> Result<Pool> {
        self.pools()
            .await?
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| NasError::NotFound(format!("pool '{}'", name)))
    }

    pub async fn alerts(&self) -> Result<Vec<Alert>> {
        self.get("alert/list").await
    }

    pub async fn services(&self) -> Result<Vec<Service>> {
        self.get("service").await
    }

    pub async fn disks(&self) -> Result<Vec<Disk>> {
        self.get("disk").await
    }

    // --- Private ---

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.request(Method::GET, endpoint, None).await
    }

    async fn post<T: DeserializeOwned>(&self, endpoint: &str, body: Option<Value>) -> Result<T> {
        self.request(Method::POST, endpoint, body).await
    }

    async fn put<T: DeserializeOwned>(&self, endpoint: &str, body: Value) -> Result<T> {
        self.request(Method::PUT, endpoint, Some(body)).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%method, %url, "TrueNAS request");

        let mut req = self.client.request(method, &url).bearer_auth(&self.api_key);
        if let Some(ref b) = body {
            req = req.json(b);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| {
                    if text.is_empty() {
                        format!("HTTP {}", status.as_u16())
                    } else {
                        text.clone()
                    }
                });
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(NasError::NotFound(endpoint.to_string()));
            }
            return Err(NasError::Api {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
                message,
            });
        }

        // DELETE and some actions return an empty body
        if text.trim().is_empty() {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Percent-encode an id for use as a single path segment
/// (snapshot ids contain `/` and `@`).
fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_credentials() {
        let err = TrueNasClient::new(&TrueNasConfig::default()).unwrap_err();
        assert!(matches!(err, NasError::Config(_)));
    }

    #[test]
    fn test_new_builds_base_url() {
        let client = TrueNasClient::new(&TrueNasConfig {
            host: "nas.local".to_string(),
            api_key: "1-key".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.base_url(), "https://nas.local/api/v2.0");
    }

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("tank/data@auto-1"), "tank%2Fdata%40auto-1");
    }
}
