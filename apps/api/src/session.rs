//! Per-request session context resolved from the auth service.
//!
//! Every operation receives a `SessionContext` explicitly; nothing reads the
//! current user from ambient state.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Candidate,
    Recruiter,
    Admin,
}

/// Bearer token forwarded to collaborators that require the caller's identity.
#[derive(Clone)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_id: Uuid,
    pub role: Role,
    pub token: BearerToken,
}

impl SessionContext {
    pub fn new(identity: Identity, token: BearerToken) -> Self {
        Self {
            user_id: identity.user_id,
            role: identity.role,
            token,
        }
    }

    /// Admins pass every role check.
    pub fn require(&self, role: Role) -> Result<(), AppError> {
        if self.role == role || self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "this action requires the {role:?} role"
            )))
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("token rejected by auth service")]
    Rejected,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("auth service returned status {0}")]
    Status(u16),
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Resolves the identity behind a bearer token.
    async fn current_user(&self, token: &BearerToken) -> Result<Identity, AuthError>;
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
    #[serde(default)]
    app_metadata: AuthMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct AuthMetadata {
    #[serde(default)]
    role: Option<Role>,
}

/// Hosted auth service client: `GET {auth_url}/user` with the caller's token.
#[derive(Clone)]
pub struct HttpAuthService {
    client: Client,
    auth_url: String,
    api_key: String,
}

impl HttpAuthService {
    pub fn new(auth_url: String, api_key: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()?,
            auth_url: auth_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl AuthService for HttpAuthService {
    async fn current_user(&self, token: &BearerToken) -> Result<Identity, AuthError> {
        let response = self
            .client
            .get(format!("{}/user", self.auth_url))
            .header("apikey", &self.api_key)
            .bearer_auth(token.as_str())
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(AuthError::Rejected);
        }
        if !status.is_success() {
            return Err(AuthError::Status(status.as_u16()));
        }

        let user: AuthUser = response.json().await?;
        let role = user.app_metadata.role.unwrap_or_default();
        debug!("Resolved session for user {} as {:?}", user.id, role);
        Ok(Identity {
            user_id: user.id,
            role,
        })
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Result<BearerToken, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;
    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)?;
    Ok(BearerToken::new(token))
}

#[axum::async_trait]
impl FromRequestParts<AppState> for SessionContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let identity = state.auth.current_user(&token).await?;
        Ok(SessionContext::new(identity, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parsed_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap().as_str(), "abc.def");
    }

    #[test]
    fn test_missing_or_basic_header_is_rejected() {
        let mut headers = HeaderMap::new();
        assert!(matches!(bearer_token(&headers), Err(AuthError::MissingToken)));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert!(matches!(bearer_token(&headers), Err(AuthError::MissingToken)));
    }

    #[test]
    fn test_admin_passes_role_checks() {
        let session = SessionContext::new(
            Identity {
                user_id: Uuid::new_v4(),
                role: Role::Admin,
            },
            BearerToken::new("t"),
        );
        assert!(session.require(Role::Recruiter).is_ok());
        assert!(session.require(Role::Candidate).is_ok());
    }

    #[test]
    fn test_candidate_cannot_act_as_recruiter() {
        let session = SessionContext::new(
            Identity {
                user_id: Uuid::new_v4(),
                role: Role::Candidate,
            },
            BearerToken::new("t"),
        );
        assert!(matches!(
            session.require(Role::Recruiter),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = BearerToken::new("secret");
        assert_eq!(format!("{token:?}"), "BearerToken(***)");
    }
}
