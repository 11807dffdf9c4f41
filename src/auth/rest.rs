//! Hosted auth: resolve the user behind an access token

use super::{AuthError, AuthProvider, UserIdentity};
use crate::config::RemoteConfig;
use crate::http::{error_message, HttpClient, HttpError};
use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

/// Resolves the session through `GET /auth/v1/user`
#[derive(Clone)]
pub struct RestAuth {
    http: HttpClient,
    base: String,
    anon_key: String,
    access_token: Option<String>,
}

impl RestAuth {
    pub fn new(config: &RemoteConfig) -> Result<Self, AuthError> {
        let http =
            HttpClient::new(config.timeout).map_err(|e| AuthError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base: config.base().to_string(),
            anon_key: config.anon_key.clone(),
            access_token: config.access_token.clone(),
        })
    }

    fn user_url(&self) -> String {
        format!("{}/auth/v1/user", self.base)
    }
}

fn parse_user(body: &str) -> Result<UserIdentity, AuthError> {
    let identity: UserIdentity = serde_json::from_str(body)
        .map_err(|e| AuthError::InvalidSession(format!("unreadable user payload: {}", e)))?;
    if identity.id.as_str().is_empty() {
        return Err(AuthError::InvalidSession("user payload without id".to_string()));
    }
    Ok(identity)
}

#[async_trait]
impl AuthProvider for RestAuth {
    async fn current_user(&self) -> Result<UserIdentity, AuthError> {
        let token = self.access_token.as_deref().ok_or(AuthError::NoSession)?;

        let request = self
            .http
            .request(Method::GET, &self.user_url())
            .header("apikey", &self.anon_key)
            .bearer_auth(token);

        let body = self
            .http
            .execute(request, "auth user")
            .await
            .map_err(|e| match e {
                HttpError::Status { status, body } if status == 401 || status == 403 => {
                    AuthError::InvalidSession(error_message(&body))
                }
                HttpError::Status { status, body } => {
                    AuthError::Transport(format!("HTTP {}: {}", status, error_message(&body)))
                }
                other => AuthError::Transport(other.to_string()),
            })?;

        let user = parse_user(&body)?;
        debug!(user = %user.id, "resolved session user");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ENV_ANON_KEY, ENV_URL};

    fn config() -> RemoteConfig {
        RemoteConfig::from_lookup(|key| match key {
            ENV_URL => Some("https://project.supabase.co".to_string()),
            ENV_ANON_KEY => Some("anon".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_parse_user_payload() {
        let body = r#"{
            "id": "0b7e2c4a-1111-4222-8333-944455556666",
            "aud": "authenticated",
            "email": "guest@example.com",
            "role": "authenticated"
        }"#;
        let user = parse_user(body).unwrap();
        assert_eq!(user.id.as_str(), "0b7e2c4a-1111-4222-8333-944455556666");
        assert_eq!(user.email.as_deref(), Some("guest@example.com"));

        assert!(matches!(
            parse_user(r#"{"id": ""}"#),
            Err(AuthError::InvalidSession(_))
        ));
        assert!(parse_user("[]").is_err());
    }

    #[test]
    fn test_user_url() {
        let auth = RestAuth::new(&config()).unwrap();
        assert_eq!(auth.user_url(), "https://project.supabase.co/auth/v1/user");
    }

    #[tokio::test]
    async fn test_missing_token_is_no_session() {
        let auth = RestAuth::new(&config()).unwrap();
        assert_eq!(auth.current_user().await, Err(AuthError::NoSession));
    }
}
