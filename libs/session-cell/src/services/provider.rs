// libs/session-cell/src/services/provider.rs
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::{JoinCredentials, SessionError};

/// Client for the external media session provider. Mints per-participant,
/// per-room join tokens; room membership decisions never live here.
pub struct SessionProviderClient {
    client: Client,
    base_url: String,
    api_token: String,
}

impl SessionProviderClient {
    pub fn new(config: &AppConfig) -> Result<Self, SessionError> {
        if !config.is_session_provider_configured() {
            return Err(SessionError::NotConfigured);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.store_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self {
            client,
            base_url: config.session_provider_url.clone(),
            api_token: config.session_provider_api_token.clone(),
        })
    }

    /// Issue join credentials for one participant in one room.
    /// POST /v1/rooms/{room_id}/tokens
    pub async fn issue_join_token(
        &self,
        room_id: &str,
        participant_id: &Uuid,
    ) -> Result<JoinCredentials, SessionError> {
        let url = format!("{}/v1/rooms/{}/tokens", self.base_url, room_id);
        debug!("Requesting join token from session provider: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&json!({ "participant_id": participant_id }))
            .send()
            .await
            .map_err(|e| SessionError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            error!("Session provider rejected token request ({}): {}", status, body);
            return Err(SessionError::Provider(format!("HTTP {}: {}", status, body)));
        }

        let token: ProviderTokenResponse = response
            .json()
            .await
            .map_err(|e| SessionError::Provider(format!("failed to parse token response: {}", e)))?;

        info!(
            "Join token issued for participant {} in room {}",
            participant_id, room_id
        );
        Ok(JoinCredentials {
            room_id: room_id.to_string(),
            token: token.token,
            expires_in_secs: token.expires_in_secs,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProviderTokenResponse {
    token: String,
    expires_in_secs: Option<u64>,
}
