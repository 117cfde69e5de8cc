//! Supabase (GoTrue) identity provider.
//!
//! REST client for the hosted auth service the marketplace uses. The provider
//! owns the only cached copy of the session; every other component reaches it
//! through the gate. A cached session is revalidated against the provider on
//! `current_user`, so staleness is caught on the next call rather than
//! trusted indefinitely.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{IdentityProvider, Session, SignUpOutcome, UserIdentity};
use crate::types::{Result, TrustCartError};

/// GoTrue REST provider.
pub struct SupabaseAuth {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    /// Provider-owned session cache; `None` means signed out.
    session: RwLock<Option<Session>>,
}

// =============================================================================
// GoTrue wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    user_metadata: serde_json::Value,
}

impl GoTrueUser {
    fn into_identity(self) -> UserIdentity {
        let display_name = self
            .user_metadata
            .get("display_name")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        UserIdentity {
            id: self.id,
            email: self.email,
            display_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueSession {
    access_token: String,
    #[serde(default)]
    expires_at: u64,
    user: GoTrueUser,
}

impl GoTrueSession {
    fn into_session(self) -> Session {
        Session {
            access_token: self.access_token,
            expires_at: self.expires_at,
            user: self.user.into_identity(),
        }
    }
}

/// Error body shapes GoTrue answers with, depending on endpoint and version.
fn provider_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["msg", "error_description", "message", "error"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    "identity provider rejected the request".to_string()
}

impl SupabaseAuth {
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            session: RwLock::new(None),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    async fn cached_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }
}

#[async_trait::async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn current_user(&self) -> Result<Option<UserIdentity>> {
        let Some(token) = self.cached_token().await else {
            return Ok(None);
        };

        // Revalidate against the provider; the cached session may have been
        // revoked or expired since the last call.
        let resp = self
            .http
            .get(self.auth_url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| TrustCartError::Provider(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            debug!("cached session no longer valid, clearing");
            *self.session.write().await = None;
            return Ok(None);
        }

        let body = resp
            .text()
            .await
            .map_err(|e| TrustCartError::Provider(e.to_string()))?;

        if !status.is_success() {
            return Err(TrustCartError::Provider(provider_error_message(&body)));
        }

        let user: GoTrueUser = serde_json::from_str(&body)
            .map_err(|e| TrustCartError::Provider(format!("unexpected user payload: {e}")))?;

        Ok(Some(user.into_identity()))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let resp = self
            .http
            .post(self.auth_url("token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| TrustCartError::Provider(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| TrustCartError::Provider(e.to_string()))?;

        if status == reqwest::StatusCode::BAD_REQUEST
            || status == reqwest::StatusCode::UNAUTHORIZED
        {
            return Err(TrustCartError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(TrustCartError::Provider(provider_error_message(&body)));
        }

        let session: GoTrueSession = serde_json::from_str(&body)
            .map_err(|e| TrustCartError::Provider(format!("unexpected session payload: {e}")))?;
        let session = session.into_session();

        info!(user = %session.user.email, "signed in");
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<SignUpOutcome> {
        let resp = self
            .http
            .post(self.auth_url("signup"))
            .header("apikey", &self.anon_key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "display_name": display_name },
            }))
            .send()
            .await
            .map_err(|e| TrustCartError::Provider(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| TrustCartError::Provider(e.to_string()))?;

        if !status.is_success() {
            let msg = provider_error_message(&body);
            let lowered = msg.to_lowercase();
            if lowered.contains("registered") || lowered.contains("already exists") {
                return Err(TrustCartError::EmailInUse);
            }
            if lowered.contains("password") {
                return Err(TrustCartError::WeakCredential(msg));
            }
            return Err(TrustCartError::Provider(msg));
        }

        // With email confirmation enabled GoTrue returns only the user; with
        // autoconfirm it returns a full session.
        if let Ok(session) = serde_json::from_str::<GoTrueSession>(&body) {
            let session = session.into_session();
            info!(user = %session.user.email, "signed up with active session");
            *self.session.write().await = Some(session.clone());
            return Ok(SignUpOutcome {
                user: session.user.clone(),
                session: Some(session),
            });
        }

        let user: GoTrueUser = serde_json::from_str(&body)
            .map_err(|e| TrustCartError::Provider(format!("unexpected signup payload: {e}")))?;
        let user = user.into_identity();
        info!(user = %user.email, "signed up, verification pending");

        Ok(SignUpOutcome {
            user,
            session: None,
        })
    }

    async fn sign_out(&self) -> Result<()> {
        let token = self.session.write().await.take().map(|s| s.access_token);

        let Some(token) = token else {
            return Ok(());
        };

        let resp = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| TrustCartError::Provider(e.to_string()))?;

        if !resp.status().is_success() {
            warn!(status = %resp.status(), "provider logout returned failure");
            return Err(TrustCartError::Provider(format!(
                "logout returned {}",
                resp.status()
            )));
        }

        Ok(())
    }

    async fn session_token(&self) -> Result<Option<String>> {
        Ok(self.cached_token().await)
    }
}
