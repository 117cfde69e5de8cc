//! Bank-link flow controller.
//!
//! Drives the external link widget through its one-shot lifecycle:
//!
//! ```text
//! Uninitialized -> Initializing -> Ready -> Exchanging -> Linked
//!                                     |           |
//!                                     +- Canceled +- (back to Ready on failure)
//! ```
//!
//! The widget has a hard non-reentrancy constraint on construction, so
//! `initialize` is guarded by the state flag and is a no-op on every call
//! after the first - per page lifetime there is at most one widget and one
//! `create_link_token` round trip. The widget's success/exit callbacks are
//! modeled as the two-case [`LinkOutcome`], consumed at a single resumption
//! point in [`LinkController::open`].

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backend::BackendApi;
use crate::types::{Result, TrustCartError};

/// Lifecycle of the link widget within one page lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No widget yet; `initialize` has not run.
    Uninitialized,
    /// Setup-token request or widget construction in flight (or failed -
    /// initialization is never retried within a page lifetime).
    Initializing,
    /// Widget constructed and waiting for the user.
    Ready,
    /// Widget handed back a public token; backend exchange in flight.
    Exchanging,
    /// Exchange confirmed by the backend. Terminal.
    Linked,
    /// User backed out of the widget; no exchange was attempted.
    Canceled,
}

/// What the widget reports when it hands control back.
#[derive(Debug, Clone)]
pub enum LinkOutcome {
    /// User completed the widget flow; exchange the public token.
    Completed {
        public_token: String,
        metadata: Value,
    },
    /// User exited, or the widget failed internally.
    Exited {
        error: Option<String>,
        metadata: Value,
    },
}

/// The constructed external widget. Presentation is entirely widget-owned;
/// `open` resolves once the widget hands control back.
#[async_trait::async_trait]
pub trait LinkWidget: Send + Sync {
    async fn open(&self) -> LinkOutcome;
}

/// One-shot constructor for the widget, bound to a setup token.
#[async_trait::async_trait]
pub trait LinkWidgetFactory: Send + Sync {
    async fn create(&self, link_token: &str) -> Result<Box<dyn LinkWidget>>;
}

/// Controller owning the link lifecycle and the exchange protocol.
pub struct LinkController {
    backend: Arc<dyn BackendApi>,
    factory: Arc<dyn LinkWidgetFactory>,
    state: LinkState,
    widget: Option<Box<dyn LinkWidget>>,
}

impl LinkController {
    pub fn new(backend: Arc<dyn BackendApi>, factory: Arc<dyn LinkWidgetFactory>) -> Self {
        Self {
            backend,
            factory,
            state: LinkState::Uninitialized,
            widget: None,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Fetch the setup token and construct the widget. Exactly once per page
    /// lifetime: any call after the first is a no-op, including after a
    /// failed first attempt (the widget does not tolerate repeated
    /// construction, so recovery is a page reload, not a retry here).
    pub async fn initialize(&mut self) -> Result<()> {
        if self.state != LinkState::Uninitialized {
            debug!(state = ?self.state, "link already initialized, ignoring");
            return Ok(());
        }

        self.state = LinkState::Initializing;

        let link_token = self.backend.create_link_token().await?;
        let widget = self.factory.create(&link_token).await?;

        self.widget = Some(widget);
        self.state = LinkState::Ready;
        info!("link widget ready");

        Ok(())
    }

    /// Present the widget and run the exchange protocol on completion.
    ///
    /// Logged no-op before `Ready` and while an exchange is in flight or
    /// already confirmed. Exchange failures are recoverable: the controller
    /// returns to `Ready` so the user can re-open the widget.
    pub async fn open(&mut self) -> Result<LinkState> {
        match self.state {
            LinkState::Uninitialized | LinkState::Initializing => {
                warn!(state = ?self.state, "link widget not ready, ignoring open");
                return Ok(self.state);
            }
            LinkState::Exchanging | LinkState::Linked => {
                debug!(state = ?self.state, "link flow already settled, ignoring open");
                return Ok(self.state);
            }
            LinkState::Ready | LinkState::Canceled => {}
        }

        let widget = self
            .widget
            .as_ref()
            .ok_or_else(|| TrustCartError::Internal("link state ready without widget".into()))?;

        match widget.open().await {
            LinkOutcome::Completed {
                public_token,
                metadata,
            } => {
                self.state = LinkState::Exchanging;
                match self.exchange(&public_token, metadata).await {
                    Ok(()) => {
                        self.state = LinkState::Linked;
                        info!("bank link exchange confirmed");
                        Ok(LinkState::Linked)
                    }
                    Err(e) => {
                        // Recoverable: keep the widget, allow another attempt.
                        self.state = LinkState::Ready;
                        Err(e)
                    }
                }
            }
            LinkOutcome::Exited { error, metadata: _ } => {
                if let Some(reason) = error {
                    warn!(%reason, "link widget exited with error");
                } else {
                    debug!("link widget dismissed by user");
                }
                self.state = LinkState::Canceled;
                Ok(LinkState::Canceled)
            }
        }
    }

    /// Two-phase exchange: a non-ok payload status is a rejection, transport
    /// or parse trouble is a failure. Neither may leave the state `Linked`.
    async fn exchange(&self, public_token: &str, metadata: Value) -> Result<()> {
        let response = self
            .backend
            .exchange_public_token(public_token, metadata)
            .await
            .map_err(|e| TrustCartError::ExchangeFailed(e.to_string()))?;

        if !response.is_ok() {
            return Err(TrustCartError::ExchangeRejected(response.status));
        }

        Ok(())
    }
}
