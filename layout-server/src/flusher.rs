//! Background task writing debounced saves.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::sessions::SessionRegistry;

/// Handle to the running flusher.
#[derive(Debug)]
pub struct FlusherHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl FlusherHandle {
    /// Stop the flusher after a final save of every pending session.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(err) = self.handle.await {
            tracing::error!("Flusher task failed: {err}");
        }
    }
}

/// Spawn a task that calls `flush_due` on every session each `period`.
pub fn spawn_flusher(registry: SessionRegistry, period: Duration) -> FlusherHandle {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let written = registry.flush_due_all().await;
                    if written > 0 {
                        tracing::debug!("Flushed {written} layouts");
                    }
                }
                _ = &mut shutdown_rx => break,
            }
        }
        let written = registry.flush_all().await;
        tracing::info!("Flusher stopped after final save of {written} layouts");
    });
    FlusherHandle {
        shutdown_tx: Some(shutdown_tx),
        handle,
    }
}
