//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{BackendClient, BackendError};
use crate::checkout::{CheckoutGateway, SessionStore};
use crate::config::{CheckoutConfig, StorefrontConfig};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// checkout gateway and the live checkout sessions.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    gateway: Arc<dyn CheckoutGateway>,
    sessions: SessionStore,
    checkout: CheckoutConfig,
}

impl AppState {
    /// Create a new application state around any gateway implementation.
    #[must_use]
    pub fn new(gateway: Arc<dyn CheckoutGateway>, checkout: CheckoutConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                gateway,
                sessions: SessionStore::new(checkout.session_ttl),
                checkout,
            }),
        }
    }

    /// Build state backed by the hosted backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend client cannot be built.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, BackendError> {
        let client = BackendClient::new(&config.backend)?;
        Ok(Self::new(Arc::new(client), config.checkout))
    }

    /// Get the checkout gateway.
    #[must_use]
    pub fn gateway(&self) -> &Arc<dyn CheckoutGateway> {
        &self.inner.gateway
    }

    /// Get the live checkout sessions.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// Get the checkout configuration.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutConfig {
        &self.inner.checkout
    }
}
