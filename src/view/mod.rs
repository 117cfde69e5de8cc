//! View-state controller.
//!
//! Owns the two pieces of process-wide UI state - the authentication gate and
//! the active region - and funnels every mutation through its transition
//! methods. Rendering itself stays behind the [`UiSurface`] hooks; this
//! module only decides what is visible and when data loads happen.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backend::{BackendApi, UserData};
use crate::identity::UserIdentity;
use crate::link::{LinkController, LinkState};
use crate::types::{Result, TrustCartError};

/// Root gate over the whole UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
}

/// The authenticated sub-regions. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Home,
    Dashboard,
    Cart,
    Sell,
    Marketplace,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Home => write!(f, "home"),
            Region::Dashboard => write!(f, "dashboard"),
            Region::Cart => write!(f, "cart"),
            Region::Sell => write!(f, "sell"),
            Region::Marketplace => write!(f, "marketplace"),
        }
    }
}

/// Notification severity, rendered by the surface as a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// Render hooks into the DOM layer. The surface owns all visual concerns;
/// the controller only tells it what changed.
pub trait UiSurface: Send + Sync {
    /// Reveal or hide the authenticated region (and its inverse, the
    /// sign-in/register region).
    fn set_authenticated_visible(&self, visible: bool);

    /// Make `region` the single visible sub-region.
    fn set_active_region(&self, region: Region);

    /// Re-render all data-driven sections from a fresh aggregated dataset.
    fn render_data(&self, data: &UserData);

    /// Show a transient notification.
    fn notify(&self, severity: Severity, message: &str);
}

/// Controller over [`AuthState`] and [`Region`], plus the last successfully
/// rendered dataset.
pub struct ViewController {
    surface: Arc<dyn UiSurface>,
    backend: Arc<dyn BackendApi>,
    link: LinkController,
    auth: AuthState,
    active: Region,
    data: Option<UserData>,
}

impl ViewController {
    pub fn new(
        surface: Arc<dyn UiSurface>,
        backend: Arc<dyn BackendApi>,
        link: LinkController,
    ) -> Self {
        Self {
            surface,
            backend,
            link,
            auth: AuthState::Unauthenticated,
            active: Region::Dashboard,
            data: None,
        }
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth
    }

    pub fn active_region(&self) -> Region {
        self.active
    }

    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    /// Last dataset that rendered successfully, if any.
    pub fn data(&self) -> Option<&UserData> {
        self.data.as_ref()
    }

    /// Entry transition for a signed-in user: reveal the authenticated
    /// region, bring the link widget up (once), load data, land on the
    /// dashboard. Link and load failures are surfaced as notifications and
    /// do not abort the transition.
    pub async fn enter_authenticated(&mut self, user: &UserIdentity) {
        info!(user = %user.email, "entering authenticated view");
        self.auth = AuthState::Authenticated;
        self.surface.set_authenticated_visible(true);

        if let Err(e) = self.link.initialize().await {
            warn!(error = %e, "link initialization failed");
            self.surface.notify(Severity::Error, &e.user_message());
        }

        if let Err(e) = self.refresh(&user.id).await {
            debug!(error = %e, "initial data load failed");
        }

        self.active = Region::Dashboard;
        self.surface.set_active_region(Region::Dashboard);
    }

    /// Exit transition: hide everything gated, reset the default selection
    /// for the next entry.
    pub fn enter_unauthenticated(&mut self) {
        info!("entering unauthenticated view");
        self.auth = AuthState::Unauthenticated;
        self.active = Region::Dashboard;
        self.surface.set_authenticated_visible(false);
    }

    /// Switch the active sub-region. Rejected (with a notification) while
    /// unauthenticated; the current state is left untouched.
    pub fn navigate(&mut self, target: Region) -> Result<()> {
        if self.auth != AuthState::Authenticated {
            self.surface
                .notify(Severity::Error, "Please sign in first");
            return Err(TrustCartError::NotAuthenticated);
        }

        debug!(from = %self.active, to = %target, "navigating");
        self.active = target;
        self.surface.set_active_region(target);
        Ok(())
    }

    /// Aggregated load: one round trip for all four collections, rendered
    /// atomically. On failure the previously rendered dataset stays in place
    /// and the user sees an error notification instead of a blank view.
    pub async fn refresh(&mut self, user_id: &str) -> Result<()> {
        match self.backend.user_data(user_id).await {
            Ok(data) => {
                self.surface.render_data(&data);
                self.data = Some(data);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "aggregated load failed, keeping prior data");
                self.surface
                    .notify(Severity::Error, "Could not refresh marketplace data");
                Err(e)
            }
        }
    }

    /// Present the link widget and translate the outcome into notifications.
    pub async fn open_link(&mut self) {
        match self.link.open().await {
            Ok(LinkState::Linked) => {
                self.surface.notify(Severity::Success, "Bank linked!");
            }
            Ok(LinkState::Canceled) => {
                self.surface
                    .notify(Severity::Error, "Bank connection canceled");
            }
            Ok(state) => {
                debug!(?state, "link open was a no-op");
            }
            Err(e) => {
                self.surface.notify(Severity::Error, &e.user_message());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CartEntry, CatalogItem, ExchangeResponse, NewItem};
    use crate::link::{LinkOutcome, LinkWidget, LinkWidgetFactory};
    use crate::types::TrustCartError;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum SurfaceEvent {
        AuthVisible(bool),
        ActiveRegion(Region),
        Rendered(usize),
        Notice(Severity, String),
    }

    #[derive(Default)]
    struct RecordingSurface {
        events: Mutex<Vec<SurfaceEvent>>,
    }

    impl RecordingSurface {
        fn events(&self) -> Vec<SurfaceEvent> {
            self.events.lock().unwrap().clone()
        }

        fn notices(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    SurfaceEvent::Notice(_, msg) => Some(msg),
                    _ => None,
                })
                .collect()
        }
    }

    impl UiSurface for RecordingSurface {
        fn set_authenticated_visible(&self, visible: bool) {
            self.events
                .lock()
                .unwrap()
                .push(SurfaceEvent::AuthVisible(visible));
        }

        fn set_active_region(&self, region: Region) {
            self.events
                .lock()
                .unwrap()
                .push(SurfaceEvent::ActiveRegion(region));
        }

        fn render_data(&self, data: &UserData) {
            self.events
                .lock()
                .unwrap()
                .push(SurfaceEvent::Rendered(data.all_items.len()));
        }

        fn notify(&self, severity: Severity, message: &str) {
            self.events
                .lock()
                .unwrap()
                .push(SurfaceEvent::Notice(severity, message.to_string()));
        }
    }

    #[derive(Default)]
    struct MockBackend {
        user_data_calls: AtomicUsize,
        fail_user_data: AtomicBool,
        dataset: Mutex<UserData>,
    }

    impl MockBackend {
        fn with_catalog() -> Self {
            let backend = Self::default();
            backend.dataset.lock().unwrap().all_items = vec![CatalogItem {
                id: "p1".to_string(),
                title: "Widget".to_string(),
                price: 9.5,
                description: "A widget".to_string(),
                image_url: None,
                created_at: None,
            }];
            backend
        }
    }

    #[async_trait::async_trait]
    impl BackendApi for MockBackend {
        async fn create_link_token(&self) -> Result<String> {
            Ok("link-sandbox-token".to_string())
        }

        async fn exchange_public_token(
            &self,
            _public_token: &str,
            _metadata: Value,
        ) -> Result<ExchangeResponse> {
            Ok(ExchangeResponse {
                status: "ok".to_string(),
                item_id: None,
            })
        }

        async fn record_login(&self, _id: &str, _description: &str) -> Result<Value> {
            Ok(json!({}))
        }

        async fn create_item(&self, _item: NewItem) -> Result<Value> {
            Ok(json!({}))
        }

        async fn add_to_cart(&self, _user_id: &str, title: &str) -> Result<Value> {
            self.dataset.lock().unwrap().cart_items.push(CartEntry {
                product_id: "p1".to_string(),
                quantity: 1,
                price: 9.5,
                title: Some(title.to_string()),
            });
            Ok(json!({ "status": "ok" }))
        }

        async fn user_data(&self, _user_id: &str) -> Result<UserData> {
            self.user_data_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_user_data.load(Ordering::SeqCst) {
                return Err(TrustCartError::Backend {
                    status: 500,
                    detail: "internal server error".to_string(),
                });
            }
            Ok(self.dataset.lock().unwrap().clone())
        }

        async fn liveness(&self) -> Result<Value> {
            Ok(json!({}))
        }
    }

    struct IdleWidget;

    #[async_trait::async_trait]
    impl LinkWidget for IdleWidget {
        async fn open(&self) -> LinkOutcome {
            LinkOutcome::Exited {
                error: None,
                metadata: json!({}),
            }
        }
    }

    struct IdleFactory;

    #[async_trait::async_trait]
    impl LinkWidgetFactory for IdleFactory {
        async fn create(&self, _link_token: &str) -> Result<Box<dyn LinkWidget>> {
            Ok(Box::new(IdleWidget))
        }
    }

    fn controller(
        surface: Arc<RecordingSurface>,
        backend: Arc<MockBackend>,
    ) -> ViewController {
        let link = LinkController::new(backend.clone(), Arc::new(IdleFactory));
        ViewController::new(surface, backend, link)
    }

    fn user() -> UserIdentity {
        UserIdentity {
            id: "u1".to_string(),
            email: "a@b.com".to_string(),
            display_name: Some("Alice".to_string()),
        }
    }

    #[tokio::test]
    async fn test_navigation_gated_while_unauthenticated() {
        let surface = Arc::new(RecordingSurface::default());
        let backend = Arc::new(MockBackend::with_catalog());
        let mut view = controller(surface.clone(), backend);

        for target in [Region::Cart, Region::Sell, Region::Marketplace] {
            assert!(matches!(
                view.navigate(target),
                Err(TrustCartError::NotAuthenticated)
            ));
            assert_eq!(view.active_region(), Region::Dashboard);
        }

        // One notification per rejected attempt, no region changes.
        assert_eq!(surface.notices().len(), 3);
        assert!(!surface
            .events()
            .iter()
            .any(|e| matches!(e, SurfaceEvent::ActiveRegion(_))));
    }

    #[tokio::test]
    async fn test_enter_authenticated_full_transition() {
        let surface = Arc::new(RecordingSurface::default());
        let backend = Arc::new(MockBackend::with_catalog());
        let mut view = controller(surface.clone(), backend.clone());

        view.enter_authenticated(&user()).await;

        assert_eq!(view.auth_state(), AuthState::Authenticated);
        assert_eq!(view.active_region(), Region::Dashboard);
        assert_eq!(view.link_state(), LinkState::Ready);
        assert_eq!(backend.user_data_calls.load(Ordering::SeqCst), 1);

        let events = surface.events();
        assert!(events.contains(&SurfaceEvent::AuthVisible(true)));
        assert!(events.contains(&SurfaceEvent::ActiveRegion(Region::Dashboard)));
        assert!(events.contains(&SurfaceEvent::Rendered(1)));
    }

    #[tokio::test]
    async fn test_exactly_one_active_region_after_navigation() {
        let surface = Arc::new(RecordingSurface::default());
        let backend = Arc::new(MockBackend::with_catalog());
        let mut view = controller(surface.clone(), backend);

        view.enter_authenticated(&user()).await;

        view.navigate(Region::Cart).unwrap();
        assert_eq!(view.active_region(), Region::Cart);

        view.navigate(Region::Marketplace).unwrap();
        assert_eq!(view.active_region(), Region::Marketplace);

        // The surface saw each activation exactly once, in order.
        let activations: Vec<Region> = surface
            .events()
            .into_iter()
            .filter_map(|e| match e {
                SurfaceEvent::ActiveRegion(r) => Some(r),
                _ => None,
            })
            .collect();
        assert_eq!(
            activations,
            vec![Region::Dashboard, Region::Cart, Region::Marketplace]
        );
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_prior_data() {
        let surface = Arc::new(RecordingSurface::default());
        let backend = Arc::new(MockBackend::with_catalog());
        let mut view = controller(surface.clone(), backend.clone());

        view.enter_authenticated(&user()).await;
        assert_eq!(view.data().unwrap().all_items.len(), 1);

        backend.fail_user_data.store(true, Ordering::SeqCst);
        assert!(view.refresh("u1").await.is_err());

        // Prior dataset untouched, error notification shown, nothing new
        // rendered.
        assert_eq!(view.data().unwrap().all_items.len(), 1);
        assert!(surface
            .notices()
            .iter()
            .any(|m| m.contains("Could not refresh")));
        let renders = surface
            .events()
            .into_iter()
            .filter(|e| matches!(e, SurfaceEvent::Rendered(_)))
            .count();
        assert_eq!(renders, 1);
    }

    #[tokio::test]
    async fn test_unauthenticated_entry_hides_region() {
        let surface = Arc::new(RecordingSurface::default());
        let backend = Arc::new(MockBackend::with_catalog());
        let mut view = controller(surface.clone(), backend);

        view.enter_unauthenticated();

        assert_eq!(view.auth_state(), AuthState::Unauthenticated);
        assert_eq!(view.active_region(), Region::Dashboard);
        assert!(surface.events().contains(&SurfaceEvent::AuthVisible(false)));
    }

    #[tokio::test]
    async fn test_open_link_maps_cancel_to_notice() {
        let surface = Arc::new(RecordingSurface::default());
        let backend = Arc::new(MockBackend::with_catalog());
        let mut view = controller(surface.clone(), backend);

        view.enter_authenticated(&user()).await;
        view.open_link().await;

        assert_eq!(view.link_state(), LinkState::Canceled);
        assert!(surface
            .notices()
            .iter()
            .any(|m| m.contains("canceled")));
    }
}
