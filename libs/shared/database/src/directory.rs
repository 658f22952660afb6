use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use shared_config::AppConfig;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("user not found in directory")]
    NotFound,

    #[error("directory service unavailable: {0}")]
    Unavailable(String),

    #[error("directory service error ({status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Doctor,
    Patient,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryUser {
    pub id: String,
    pub role: UserRole,
    pub display_name: Option<String>,
}

/// Client for the external identity directory. The directory owns roles and
/// display names; this core only reads them.
pub struct DirectoryClient {
    client: Client,
    base_url: String,
}

impl DirectoryClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.store_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.directory_service_url.clone(),
        }
    }

    pub async fn get_user(
        &self,
        user_id: &str,
        auth_token: &str,
    ) -> Result<DirectoryUser, DirectoryError> {
        let url = format!("{}/v1/users/{}", self.base_url, user_id);
        debug!("Directory lookup: {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(auth_token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    DirectoryError::Unavailable(e.to_string())
                } else {
                    DirectoryError::Api {
                        status: 0,
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(DirectoryError::NotFound);
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(DirectoryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<DirectoryUser>()
            .await
            .map_err(|e| DirectoryError::Api {
                status: status.as_u16(),
                message: format!("failed to parse directory user: {}", e),
            })
    }

    pub async fn get_user_role(
        &self,
        user_id: &str,
        auth_token: &str,
    ) -> Result<UserRole, DirectoryError> {
        Ok(self.get_user(user_id, auth_token).await?.role)
    }
}
