//! Application state shared across handlers.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::RefillConfig;
use crate::store::DocumentStore;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RefillConfig,
    store: Arc<dyn DocumentStore>,
    /// Held around referral ledger read-modify-write.
    ledger_lock: Mutex<()>,
    /// Held around delivery status read-modify-write.
    delivery_lock: Mutex<()>,
}

impl AppState {
    #[must_use]
    pub fn new(config: RefillConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                ledger_lock: Mutex::new(()),
                delivery_lock: Mutex::new(()),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &RefillConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn ledger_lock(&self) -> &Mutex<()> {
        &self.inner.ledger_lock
    }

    #[must_use]
    pub fn delivery_lock(&self) -> &Mutex<()> {
        &self.inner.delivery_lock
    }
}
