//! Shared error type and result alias for TrustCart.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TrustCartError>;

/// Error taxonomy for the client runtime.
///
/// Every variant is recoverable: the worst user-visible outcome anywhere in
/// the crate is a notification plus an unchanged view.
#[derive(Debug, Error)]
pub enum TrustCartError {
    /// No active session when an authenticated backend call was attempted.
    /// The call aborts before any network traffic.
    #[error("not authenticated: {0}")]
    Unauthenticated(String),

    /// Navigation attempted while the root view state is unauthenticated.
    #[error("sign in to continue")]
    NotAuthenticated,

    /// Malformed user input, caught before any network call.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Identity provider unreachable or returned an unexpected failure.
    #[error("identity provider error: {0}")]
    Provider(String),

    /// Sign-in rejected by the identity provider.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Sign-up rejected because the email is already registered.
    #[error("email already registered")]
    EmailInUse,

    /// Sign-up rejected because the credential does not meet provider policy.
    #[error("credential rejected: {0}")]
    WeakCredential(String),

    /// Non-2xx from the application backend, with whatever detail it supplied.
    #[error("backend error ({status}): {detail}")]
    Backend { status: u16, detail: String },

    /// Backend reply was not parseable as JSON. Carries the raw status and
    /// body text for diagnosis.
    #[error("malformed backend response ({status}): {body}")]
    MalformedResponse { status: u16, body: String },

    /// The create_link_token response omitted the setup token.
    #[error("link setup token missing from backend response")]
    SetupTokenMissing,

    /// The exchange endpoint answered with a non-ok status payload.
    #[error("bank link exchange rejected: {0}")]
    ExchangeRejected(String),

    /// Transport or parse failure during the exchange phase.
    #[error("bank link exchange failed: {0}")]
    ExchangeFailed(String),

    /// HTTP transport failure (connection, TLS, timeout).
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Anything that indicates a bug rather than an environmental failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TrustCartError {
    /// Short user-facing message for notification rendering.
    pub fn user_message(&self) -> String {
        match self {
            TrustCartError::Unauthenticated(_) | TrustCartError::NotAuthenticated => {
                "Please sign in first".to_string()
            }
            TrustCartError::Validation(msg) => msg.clone(),
            TrustCartError::InvalidCredentials => "Invalid email or password".to_string(),
            TrustCartError::EmailInUse => "That email is already registered".to_string(),
            TrustCartError::WeakCredential(msg) => msg.clone(),
            TrustCartError::SetupTokenMissing => "Could not initialize bank linking".to_string(),
            TrustCartError::ExchangeRejected(_) | TrustCartError::ExchangeFailed(_) => {
                "Error saving bank connection".to_string()
            }
            TrustCartError::Provider(_) => "Sign-in service is unavailable".to_string(),
            TrustCartError::Backend { .. }
            | TrustCartError::MalformedResponse { .. }
            | TrustCartError::Http(_)
            | TrustCartError::Internal(_) => "Something went wrong, please try again".to_string(),
        }
    }
}
