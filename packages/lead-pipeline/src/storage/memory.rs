use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::traits::StateStore;
use crate::types::ScanState;

/// Process-local store; state is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<Option<ScanState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an existing record.
    pub fn with_state(state: ScanState) -> Self {
        Self {
            state: RwLock::new(Some(state)),
        }
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self) -> Result<ScanState, StoreError> {
        Ok(self.state.read().await.clone().unwrap_or_default())
    }

    async fn save(&self, state: &ScanState) -> Result<(), StoreError> {
        *self.state.write().await = Some(state.clone());
        Ok(())
    }
}
