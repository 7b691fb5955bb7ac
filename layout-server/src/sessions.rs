//! Open designer sessions, one [`LayoutEngine`] per menu.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use layout_core::{CatalogProvider, EngineConfig, LayoutEngine, LayoutResult, LayoutStore};
use tokio::sync::Mutex;

use crate::metrics;

/// Store shared by every session.
pub type SharedStore = Arc<dyn LayoutStore>;

/// Engine as held by the server.
pub type Engine = LayoutEngine<SharedStore>;

/// Handle to one session; lock it to edit.
pub type SessionHandle = Arc<Mutex<Engine>>;

/// Registry of open sessions keyed by menu.
#[derive(Clone)]
pub struct SessionRegistry {
    store: SharedStore,
    catalog: Arc<dyn CatalogProvider>,
    config: EngineConfig,
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new(
        store: SharedStore,
        catalog: Arc<dyn CatalogProvider>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Layout store.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Catalog collaborator.
    pub fn catalog(&self) -> &Arc<dyn CatalogProvider> {
        &self.catalog
    }

    /// Engine settings applied to new sessions.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no session is open.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Menu keys of open sessions.
    pub fn menu_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Return the open session for `menu_key`, or open and reconcile one.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout or catalog cannot be read.
    pub async fn session(&self, menu_key: &str) -> LayoutResult<SessionHandle> {
        if let Some(handle) = self.get(menu_key) {
            return Ok(handle);
        }

        let mut engine = LayoutEngine::open(self.store.clone(), menu_key, self.config).await?;
        let report = engine.refresh_catalog(self.catalog.as_ref()).await?;
        metrics::record_reconcile(report.added.len(), report.pruned.len(), report.unplaced.len());
        tracing::info!(
            "Opened session for {menu_key} ({} sections)",
            engine.sections().len()
        );

        let handle = {
            let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
            // A concurrent request may have opened the same menu meanwhile.
            sessions
                .entry(menu_key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(engine)))
                .clone()
        };
        metrics::set_sessions_active(self.len());
        Ok(handle)
    }

    /// Return the open session for `menu_key` without opening one.
    pub fn get(&self, menu_key: &str) -> Option<SessionHandle> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(menu_key)
            .cloned()
    }

    /// Close a session, flushing unsaved edits first.
    ///
    /// # Errors
    ///
    /// Returns the save error; the session stays open in that case.
    pub async fn close(&self, menu_key: &str) -> LayoutResult<bool> {
        let Some(handle) = self.get(menu_key) else {
            return Ok(false);
        };
        handle.lock().await.flush().await?;
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(menu_key);
        metrics::set_sessions_active(self.len());
        Ok(true)
    }

    fn handles(&self) -> Vec<(String, SessionHandle)> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(key, handle)| (key.clone(), handle.clone()))
            .collect()
    }

    /// Write every session whose debounce window has elapsed.
    ///
    /// Failures are logged and left pending for the next pass. Returns the
    /// number of layouts written.
    pub async fn flush_due_all(&self) -> usize {
        let flushes = self.handles().into_iter().map(|(key, handle)| async move {
            let mut engine = handle.lock().await;
            match engine.flush_due().await {
                Ok(true) => {
                    metrics::record_save("success");
                    true
                }
                Ok(false) => false,
                Err(err) => {
                    record_save_error(&err);
                    tracing::warn!("Debounced save of {key} failed: {err}");
                    false
                }
            }
        });
        futures::future::join_all(flushes)
            .await
            .into_iter()
            .filter(|written| *written)
            .count()
    }

    /// Write every pending session now, ignoring debounce windows.
    pub async fn flush_all(&self) -> usize {
        let mut written = 0;
        for (key, handle) in self.handles() {
            match handle.lock().await.flush().await {
                Ok(true) => {
                    metrics::record_save("success");
                    written += 1;
                }
                Ok(false) => {}
                Err(err) => {
                    record_save_error(&err);
                    tracing::error!("Final save of {key} failed: {err}");
                }
            }
        }
        written
    }
}

/// Record a failed save with the right outcome label.
pub fn record_save_error(err: &layout_core::LayoutError) {
    let outcome = match err {
        layout_core::LayoutError::Persistence(
            layout_core::PersistenceError::VersionConflict { .. },
        ) => "conflict",
        _ => "failure",
    };
    metrics::record_save(outcome);
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("config", &self.config)
            .field("sessions", &self.menu_keys())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layout_core::{
        CatalogItem, Category, GridPosition, GridSize, MemoryCatalog, MemoryLayoutStore,
        SectionContent, SectionKind,
    };

    fn registry() -> (SessionRegistry, MemoryLayoutStore) {
        let store = MemoryLayoutStore::new();
        let catalog = MemoryCatalog::new();
        catalog.set_menu(
            "dinner",
            vec![Category::new("mains", "Mains", 0)],
            vec![CatalogItem::new("1", "mains", "Steak")],
        );
        let config = EngineConfig {
            save_debounce_ms: 0,
            ..EngineConfig::default()
        };
        (
            SessionRegistry::new(Arc::new(store.clone()), Arc::new(catalog), config),
            store,
        )
    }

    #[tokio::test]
    async fn test_session_opens_once_and_reconciles() {
        let (registry, _) = registry();
        let first = registry.session("dinner").await.expect("open");
        let second = registry.session("dinner").await.expect("reuse");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert_eq!(first.lock().await.sections().len(), 2);
    }

    #[tokio::test]
    async fn test_flush_due_all_writes_pending_sessions() {
        let (registry, store) = registry();
        let handle = registry.session("dinner").await.expect("open");
        handle
            .lock()
            .await
            .add_section(
                SectionKind::Promotion,
                GridPosition::new(4, 0),
                GridSize::new(1, 2),
                SectionContent::text("promo"),
            )
            .expect("add");

        assert_eq!(registry.flush_due_all().await, 1);
        assert!(store.raw("dinner").is_some());
        assert_eq!(registry.flush_due_all().await, 0);
    }

    #[tokio::test]
    async fn test_close_flushes_and_forgets() {
        let (registry, store) = registry();
        registry.session("dinner").await.expect("open");
        assert!(registry.close("dinner").await.expect("close"));
        assert!(registry.is_empty());
        assert!(store.raw("dinner").is_some());
        assert!(!registry.close("dinner").await.expect("already closed"));
    }
}
