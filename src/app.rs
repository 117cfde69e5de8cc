//! Application orchestration - one entry point per user-triggered action.
//!
//! Event handlers in the DOM layer call into these methods; each one runs the
//! whole action sequence, converts any failure into a notification through
//! the surface, and guarantees that a failed action leaves the view exactly
//! as it was. Validation failures are caught here, before any network call.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use crate::backend::{BackendApi, NewItem};
use crate::identity::{valid_email, valid_password, IdentityGate, UserIdentity, MIN_PASSWORD_LEN};
use crate::types::{Result, TrustCartError};
use crate::view::{Region, Severity, UiSurface, ViewController};

/// Raw form input for a new listing.
#[derive(Debug, Clone)]
pub struct ListingForm {
    pub title: String,
    pub price: f64,
    pub description: String,
    pub file_path: String,
    pub file: Bytes,
}

/// Top-level application state: the identity gate, the backend client, the
/// view controller, and whoever is currently signed in.
pub struct App {
    gate: Arc<IdentityGate>,
    backend: Arc<dyn BackendApi>,
    surface: Arc<dyn UiSurface>,
    view: ViewController,
    current: Option<UserIdentity>,
}

impl App {
    pub fn new(
        gate: Arc<IdentityGate>,
        backend: Arc<dyn BackendApi>,
        surface: Arc<dyn UiSurface>,
        view: ViewController,
    ) -> Self {
        Self {
            gate,
            backend,
            surface,
            view,
            current: None,
        }
    }

    pub fn current_user(&self) -> Option<&UserIdentity> {
        self.current.as_ref()
    }

    pub fn view(&self) -> &ViewController {
        &self.view
    }

    /// Page-load resolution: ask the provider who is signed in and pick the
    /// root view state accordingly. Provider trouble degrades to the
    /// unauthenticated view rather than blocking the page.
    pub async fn on_page_load(&mut self) {
        match self.gate.current_user().await {
            Ok(Some(user)) => {
                self.surface.notify(
                    Severity::Success,
                    &format!("Welcome back, {}", user.greeting_name()),
                );
                self.resume_session(user).await;
            }
            Ok(None) => {
                self.view.enter_unauthenticated();
            }
            Err(e) => {
                warn!(error = %e, "session check failed on page load");
                self.view.enter_unauthenticated();
            }
        }
    }

    /// Sign in with validated credentials, record the login with the backend
    /// and enter the authenticated view.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<()> {
        let email = email.trim();
        let password = password.trim();

        if !valid_email(email) {
            return Err(self.reject(TrustCartError::Validation(
                "Enter a valid email".to_string(),
            )));
        }
        if !valid_password(password) {
            return Err(self.reject(TrustCartError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            ))));
        }

        let session = match self.gate.sign_in(email, password).await {
            Ok(session) => session,
            Err(e) => return Err(self.reject(e)),
        };

        self.surface.notify(Severity::Success, "Logged in!");
        self.resume_session(session.user).await;
        Ok(())
    }

    /// Create an account. With email verification enabled the provider holds
    /// the session back, so the user stays on the sign-in form.
    pub async fn register(&mut self, name: &str, email: &str, password: &str) -> Result<()> {
        let name = name.trim();
        let email = email.trim();
        let password = password.trim();

        if name.len() < 2 {
            return Err(self.reject(TrustCartError::Validation(
                "Enter your full name".to_string(),
            )));
        }
        if !valid_email(email) {
            return Err(self.reject(TrustCartError::Validation(
                "Enter a valid email".to_string(),
            )));
        }
        if !valid_password(password) {
            return Err(self.reject(TrustCartError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            ))));
        }

        let outcome = match self.gate.sign_up(email, password, name).await {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.reject(e)),
        };

        match outcome.session {
            Some(session) => {
                self.surface.notify(Severity::Success, "Account created!");
                self.resume_session(session.user).await;
            }
            None => {
                self.surface.notify(
                    Severity::Success,
                    "Account created! Verify your email.",
                );
            }
        }
        Ok(())
    }

    /// Sign out. Local logout always proceeds; the gate swallows provider
    /// failures.
    pub async fn sign_out(&mut self) {
        self.gate.sign_out().await;
        self.current = None;
        self.view.enter_unauthenticated();
        self.surface.notify(Severity::Success, "Logged out");
    }

    /// Navigation handler for the region tabs.
    pub fn navigate(&mut self, target: Region) -> Result<()> {
        self.view.navigate(target)
    }

    /// Add a catalog item to the cart, then reload so the rendered cart
    /// reflects the backend's view.
    pub async fn add_to_cart(&mut self, title: &str) -> Result<()> {
        let user_id = match &self.current {
            Some(user) => user.id.clone(),
            None => {
                return Err(self.reject(TrustCartError::Unauthenticated(
                    "add_to_cart without session".to_string(),
                )))
            }
        };

        if let Err(e) = self.backend.add_to_cart(&user_id, title).await {
            return Err(self.reject(e));
        }

        self.surface.notify(Severity::Success, "Added to cart");
        let _ = self.view.refresh(&user_id).await;
        Ok(())
    }

    /// Publish a new listing (multipart upload), then reload.
    pub async fn create_item(&mut self, form: ListingForm) -> Result<()> {
        let user_id = match &self.current {
            Some(user) => user.id.clone(),
            None => {
                return Err(self.reject(TrustCartError::Unauthenticated(
                    "create_item without session".to_string(),
                )))
            }
        };

        if form.title.trim().is_empty() {
            return Err(self.reject(TrustCartError::Validation(
                "Enter a title for your item".to_string(),
            )));
        }
        if form.price <= 0.0 {
            return Err(self.reject(TrustCartError::Validation(
                "Price must be greater than zero".to_string(),
            )));
        }
        if form.file.is_empty() {
            return Err(self.reject(TrustCartError::Validation(
                "Choose an image for your item".to_string(),
            )));
        }

        let item = NewItem {
            user_id: user_id.clone(),
            title: form.title.trim().to_string(),
            price: form.price,
            description: form.description,
            file_path: form.file_path,
            file: form.file,
        };

        if let Err(e) = self.backend.create_item(item).await {
            return Err(self.reject(e));
        }

        self.surface.notify(Severity::Success, "Item listed");
        let _ = self.view.refresh(&user_id).await;
        Ok(())
    }

    /// Present the bank-link widget.
    pub async fn link_bank(&mut self) {
        self.view.open_link().await;
    }

    /// Common path for any freshly acquired session: record the login with
    /// the backend (idempotent upsert) and enter the authenticated view.
    async fn resume_session(&mut self, user: UserIdentity) {
        let description = user.greeting_name().to_string();
        if let Err(e) = self.backend.record_login(&user.id, &description).await {
            // Bookkeeping only; the session itself is fine.
            warn!(error = %e, "login record failed");
        }

        info!(user = %user.email, "session active");
        self.current = Some(user.clone());
        self.view.enter_authenticated(&user).await;
    }

    /// Notify-and-return for the per-action error boundary.
    fn reject(&self, error: TrustCartError) -> TrustCartError {
        self.surface.notify(Severity::Error, &error.user_message());
        error
    }
}
