use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub record_store_url: String,
    pub record_store_api_key: String,
    pub jwt_secret: String,
    pub directory_service_url: String,
    pub session_provider_url: String,
    pub session_provider_api_token: String,
    pub store_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            record_store_url: env::var("RECORD_STORE_URL")
                .unwrap_or_else(|_| {
                    warn!("RECORD_STORE_URL not set, using empty value");
                    String::new()
                }),
            record_store_api_key: env::var("RECORD_STORE_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("RECORD_STORE_API_KEY not set, using empty value");
                    String::new()
                }),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            directory_service_url: env::var("DIRECTORY_SERVICE_URL")
                .unwrap_or_else(|_| {
                    warn!("DIRECTORY_SERVICE_URL not set, using empty value");
                    String::new()
                }),
            session_provider_url: env::var("SESSION_PROVIDER_URL")
                .unwrap_or_else(|_| {
                    warn!("SESSION_PROVIDER_URL not set, using empty value");
                    String::new()
                }),
            session_provider_api_token: env::var("SESSION_PROVIDER_API_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("SESSION_PROVIDER_API_TOKEN not set, using empty value");
                    String::new()
                }),
            store_timeout_secs: env::var("STORE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.record_store_url.is_empty()
            && !self.record_store_api_key.is_empty()
            && !self.jwt_secret.is_empty()
    }

    pub fn is_session_provider_configured(&self) -> bool {
        !self.session_provider_url.is_empty()
            && !self.session_provider_api_token.is_empty()
    }
}
