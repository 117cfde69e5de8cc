//! TrustCart - session-gated marketplace client runtime
//!
//! Client-side core for a small marketplace: users authenticate, merchants
//! list items, buyers fill carts, and merchants link a bank account through
//! an external widget to receive payouts. Everything visual stays behind
//! trait boundaries; this crate owns the session gating, the backend
//! protocol, and the state machines in between.
//!
//! ## Components
//!
//! - **Identity gate** (`identity`): wraps the external identity provider,
//!   the single source of truth for "is the user signed in"
//! - **Backend client** (`backend`): bearer-authenticated JSON/multipart
//!   calls to the application backend
//! - **Link flow** (`link`): one-shot lifecycle of the external bank-link
//!   widget and the two-phase token exchange
//! - **View state** (`view`): authentication-gated region machine driving
//!   the render hooks
//! - **App** (`app`): one orchestrated entry point per user action

pub mod app;
pub mod backend;
pub mod config;
pub mod identity;
pub mod link;
pub mod types;
pub mod view;

pub use config::Args;
pub use types::{Result, TrustCartError};
