//! Test server harness for integration tests.
//!
//! Spins up the real designer router on a random port, backed by a temporary
//! data directory, for HTTP clients to talk to.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use layout_core::{CatalogItem, Category, EngineConfig, FileLayoutStore};
use layout_server::{api_router, AppState, CatalogFile, FileCatalogProvider};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A test server instance with control handles.
pub struct TestServer {
    addr: SocketAddr,
    state: AppState,
    catalog: FileCatalogProvider,
    data_dir: tempfile::TempDir,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with the default engine settings.
    pub async fn start() -> Self {
        Self::start_with(EngineConfig::default()).await
    }

    /// Start a new test server on a random available port.
    ///
    /// # Panics
    ///
    /// Panics if no port is available or server fails to bind.
    pub async fn start_with(config: EngineConfig) -> Self {
        let port = portpicker::pick_unused_port().expect("no available port");
        let addr = SocketAddr::from(([127, 0, 0, 1], port));

        let data_dir = tempfile::tempdir().expect("tempdir");
        let store = FileLayoutStore::new(data_dir.path().join("layouts")).expect("store");
        let catalog = FileCatalogProvider::new(data_dir.path());
        let state = AppState::new(Arc::new(store), Arc::new(catalog.clone()), config);
        let app = api_router(state.clone());

        let listener = TcpListener::bind(addr).await.expect("failed to bind");
        let actual_addr = listener.local_addr().expect("failed to get local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("server error");
        });

        // Give the server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        Self {
            addr: actual_addr,
            state,
            catalog,
            data_dir,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// URL of an API path.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// URL under `/api/menus/{menu_key}`.
    pub fn menu_url(&self, menu_key: &str, path: &str) -> String {
        self.url(&format!("/api/menus/{menu_key}{path}"))
    }

    /// Shared state (for test assertions).
    #[allow(dead_code)]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Temporary data directory.
    #[allow(dead_code)]
    pub fn data_dir(&self) -> &Path {
        self.data_dir.path()
    }

    /// Write a catalog with `(id, name, item count)` categories.
    pub async fn seed_catalog(&self, menu_key: &str, categories: &[(&str, &str, usize)]) {
        let mut file = CatalogFile::default();
        for (order, (id, name, count)) in categories.iter().enumerate() {
            file.categories
                .push(Category::new(*id, *name, i32::try_from(order).expect("order")));
            for i in 0..*count {
                file.items
                    .push(CatalogItem::new(format!("{id}-{i}"), *id, format!("{name} {i}")));
            }
        }
        self.catalog.write(menu_key, &file).await.expect("write catalog");
    }

    /// Gracefully shut down the server.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}
