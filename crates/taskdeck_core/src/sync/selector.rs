//! Per-operation strategy selection.

use crate::connectivity::Connectivity;
use crate::remote::document_store::DocumentStore;
use crate::sync::strategy::{LocalOnly, RemoteBacked, SyncStrategy};
use log::debug;
use std::sync::Arc;

/// Picks the remote-backed or local-only strategy from the connectivity
/// signal each time an operation starts.
#[derive(Clone)]
pub struct StrategySelector {
    remote: Arc<dyn SyncStrategy>,
    local: Arc<dyn SyncStrategy>,
    connectivity: Arc<dyn Connectivity>,
}

impl StrategySelector {
    pub fn new(store: Arc<dyn DocumentStore>, connectivity: Arc<dyn Connectivity>) -> Self {
        Self::with_strategies(
            Arc::new(RemoteBacked::new(store)),
            Arc::new(LocalOnly),
            connectivity,
        )
    }

    /// Builds a selector over caller-provided strategies.
    pub fn with_strategies(
        remote: Arc<dyn SyncStrategy>,
        local: Arc<dyn SyncStrategy>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        Self {
            remote,
            local,
            connectivity,
        }
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Returns the strategy for an operation starting now.
    pub fn select(&self) -> Arc<dyn SyncStrategy> {
        let strategy = if self.is_online() {
            Arc::clone(&self.remote)
        } else {
            Arc::clone(&self.local)
        };
        debug!(
            "event=strategy_select module=sync status=ok strategy={}",
            strategy.name()
        );
        strategy
    }
}
