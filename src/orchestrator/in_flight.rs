//! Tracks documents currently being processed.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::warn;
use uuid::Uuid;

/// Set of document ids with a processing run in progress.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    ids: Arc<Mutex<HashSet<Uuid>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id`. Returns `None` when another run already holds it.
    pub fn try_acquire(&self, id: Uuid) -> Option<InFlightGuard> {
        let mut ids = match self.ids.lock() {
            Ok(ids) => ids,
            Err(poisoned) => poisoned.into_inner(),
        };

        ids.insert(id).then(|| InFlightGuard {
            registry: self.clone(),
            id,
        })
    }

    pub fn contains(&self, id: Uuid) -> bool {
        match self.ids.lock() {
            Ok(ids) => ids.contains(&id),
            Err(poisoned) => poisoned.into_inner().contains(&id),
        }
    }
}

/// Releases the claim on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    registry: InFlightRegistry,
    id: Uuid,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut ids = match self.registry.ids.lock() {
            Ok(ids) => ids,
            Err(poisoned) => {
                warn!("In-flight registry lock was poisoned");
                poisoned.into_inner()
            }
        };
        ids.remove(&self.id);
    }
}
