use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub record_store_url: String,
    pub record_store_api_key: String,
    pub directory_service_url: String,
    pub session_provider_url: String,
    pub session_provider_api_token: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            record_store_url: "http://localhost:54321".to_string(),
            record_store_api_key: "test-api-key".to_string(),
            directory_service_url: "http://localhost:54322".to_string(),
            session_provider_url: "http://localhost:54323".to_string(),
            session_provider_api_token: "test-provider-token".to_string(),
        }
    }
}

impl TestConfig {
    /// Config pointing every outbound client at a mock server.
    pub fn with_mock_server(url: &str) -> Self {
        Self {
            record_store_url: url.to_string(),
            directory_service_url: url.to_string(),
            session_provider_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            record_store_url: self.record_store_url.clone(),
            record_store_api_key: self.record_store_api_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            directory_service_url: self.directory_service_url.clone(),
            session_provider_url: self.session_provider_url.clone(),
            session_provider_api_token: self.session_provider_api_token.clone(),
            store_timeout_secs: 2,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "patient".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::validate_token;

    #[test]
    fn valid_token_resolves_caller() {
        let config = TestConfig::default();
        let user = TestUser::doctor("dr@example.com");
        let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);

        let resolved = validate_token(&token, &config.jwt_secret).unwrap();
        assert_eq!(resolved.id, user.id);
        assert_eq!(resolved.role.as_deref(), Some("doctor"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = TestConfig::default();
        let user = TestUser::patient("p@example.com");
        let token = JwtTestUtils::create_expired_token(&user, &config.jwt_secret);

        assert!(validate_token(&token, &config.jwt_secret).is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let config = TestConfig::default();
        let user = TestUser::patient("p@example.com");
        let mut token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);
        token.push('x');

        assert!(validate_token(&token, &config.jwt_secret).is_err());
    }
}
