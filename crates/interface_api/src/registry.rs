//! In-process registry of running import sessions
//!
//! Each wizard sits behind its own `tokio::sync::Mutex`, so requests against
//! one session are serialized while different sessions proceed in parallel.
//! The map itself is only locked long enough to clone an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use core_kernel::ImportSessionId;
use domain_import::ImportWizard;

use crate::error::ApiError;

pub type SharedWizard = Arc<Mutex<ImportWizard>>;

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<ImportSessionId, SharedWizard>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a wizard under its session id
    pub async fn insert(&self, wizard: ImportWizard) -> ImportSessionId {
        let id = wizard.id();
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(wizard)));
        id
    }

    pub async fn get(&self, id: ImportSessionId) -> Result<SharedWizard, ApiError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("import session {} not found", id)))
    }

    /// Drops a session; running extractions are aborted with the wizard
    pub async fn remove(&self, id: ImportSessionId) -> Option<SharedWizard> {
        self.sessions.write().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry").finish_non_exhaustive()
    }
}
