use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Errors surfaced by the record store, split so callers can tell a
/// business conflict from a transient infrastructure failure.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Timeout or connection failure. The only retryable category;
    /// retries are the caller's decision, never performed here.
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected a conditional write (uniqueness violation).
    #[error("record store conflict: {0}")]
    Conflict(String),

    #[error("record store error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to decode record store response: {0}")]
    Decode(String),
}

/// HTTP client for the external record store. Collection-style CRUD plus
/// filtered equality queries, PostgREST conventions on the wire. All calls
/// are bounded by the configured timeout.
pub struct RecordStoreClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RecordStoreClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.store_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.record_store_url.clone(),
            api_key: config.record_store_api_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, bearer);
            }
        }

        headers
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, auth_token, body, None)
            .await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Record store request: {} {}", method, url);

        let mut headers = self.get_headers(auth_token);
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await.map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            error!("Record store error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::CONFLICT => StoreError::Conflict(error_text),
                StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
                    StoreError::Unavailable(error_text)
                }
                _ => StoreError::Api {
                    status: status.as_u16(),
                    message: error_text,
                },
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Insert a record and return the created representation. A uniqueness
    /// violation at the store comes back as `StoreError::Conflict`, which is
    /// how check-then-create stays a single logical unit under concurrency.
    pub async fn insert_returning(
        &self,
        collection_path: &str,
        auth_token: Option<&str>,
        record: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        self.request_with_headers(Method::POST, collection_path, auth_token, Some(record), Some(headers))
            .await
    }

    /// Conditional update: PATCH against a filtered path and return the rows
    /// actually updated. An empty result means the filter matched nothing,
    /// which callers use as a compare-and-swap failure signal.
    pub async fn update_where(
        &self,
        filtered_path: &str,
        auth_token: Option<&str>,
        changes: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        self.request_with_headers(Method::PATCH, filtered_path, auth_token, Some(changes), Some(headers))
            .await
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

fn classify_transport_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() || e.is_connect() {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Api {
            status: 0,
            message: e.to_string(),
        }
    }
}
