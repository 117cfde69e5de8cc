//! Identity gate - the single source of truth for "is the user signed in".
//!
//! Wraps the external identity provider behind the [`IdentityProvider`] trait
//! so the rest of the crate never talks to the provider directly. The session
//! is owned by the provider; the gate fetches it fresh on every call instead
//! of caching trust.

pub mod supabase;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{Result, TrustCartError};

pub use supabase::SupabaseAuth;

/// Authenticated user identity as reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Provider-issued user id
    pub id: String,

    /// Email the account was registered with
    pub email: String,

    /// Display name from provider metadata (if set)
    pub display_name: Option<String>,
}

impl UserIdentity {
    /// Name to greet the user with: display name, else the email.
    pub fn greeting_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

/// An active provider session: bearer credential plus the identity it proves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer token attached to authenticated backend calls
    pub access_token: String,

    /// Session expiry as unix seconds (0 if the provider did not report one)
    #[serde(default)]
    pub expires_at: u64,

    /// Identity the session belongs to
    pub user: UserIdentity,
}

/// Outcome of a sign-up: the identity always exists, the session only when
/// the provider did not require email verification first.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: UserIdentity,
    pub session: Option<Session>,
}

/// Boundary of the external identity provider.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current identity, or `None` when no session exists. Errors only for
    /// provider-communication failure, never for the "no session" case.
    async fn current_user(&self) -> Result<Option<UserIdentity>>;

    /// Password sign-in. Input is validated by the caller beforehand.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Account creation. The returned outcome may lack a session when the
    /// provider holds it until email verification.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<SignUpOutcome>;

    /// Provider-side sign-out. May fail on transport; the gate decides how
    /// much of that to surface.
    async fn sign_out(&self) -> Result<()>;

    /// Bearer token for the current session, or `None` without one.
    async fn session_token(&self) -> Result<Option<String>>;
}

/// Thin wrapper enforcing the contract the rest of the crate relies on.
pub struct IdentityGate {
    provider: Arc<dyn IdentityProvider>,
}

impl IdentityGate {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Current identity or `None`; provider-communication failure propagates.
    pub async fn current_user(&self) -> Result<Option<UserIdentity>> {
        self.provider.current_user().await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.provider.sign_in(email, password).await
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<SignUpOutcome> {
        self.provider.sign_up(email, password, display_name).await
    }

    /// Sign out. Always succeeds from the caller's perspective: the local
    /// logout must proceed even when the provider is unreachable, so a
    /// provider-side failure is logged and discarded.
    pub async fn sign_out(&self) {
        if let Err(e) = self.provider.sign_out().await {
            warn!(error = %e, "provider sign-out failed, proceeding with local logout");
        } else {
            debug!("provider sign-out completed");
        }
    }

    /// Bearer token for the current session. Signals `Unauthenticated` when
    /// no session exists so callers abort before any network traffic.
    pub async fn session_token(&self) -> Result<String> {
        match self.provider.session_token().await? {
            Some(token) => Ok(token),
            None => Err(TrustCartError::Unauthenticated(
                "no active session".to_string(),
            )),
        }
    }
}

/// Syntactic email check: something, an '@', something, a '.', something.
pub fn valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.contains(char::is_whitespace) {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty()
        && !tld.is_empty()
        && !domain.contains(char::is_whitespace)
        && !domain.contains('@')
}

/// Minimum password length accepted before hitting the provider.
pub const MIN_PASSWORD_LEN: usize = 6;

pub fn valid_password(password: &str) -> bool {
    password.len() >= MIN_PASSWORD_LEN
}
