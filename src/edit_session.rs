use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::errors::ServiceError;

/// Table-wide token serialising product field updates.
///
/// While any permit is alive every other update is refused, regardless of the
/// row it targets. There is no timeout: a store request that never resolves
/// keeps its permit, and editing stays disabled until that future is dropped.
#[derive(Debug, Clone)]
pub struct EditSession {
    permits: Arc<Semaphore>,
}

/// Proof that the holder owns the edit session. Released on drop.
#[derive(Debug)]
pub struct EditPermit {
    _permit: OwnedSemaphorePermit,
}

impl EditSession {
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn try_begin(&self) -> Result<EditPermit, ServiceError> {
        self.permits
            .clone()
            .try_acquire_owned()
            .map(|permit| EditPermit { _permit: permit })
            .map_err(|_| ServiceError::EditInProgress)
    }

    /// True while an update is in flight; editable inputs check this.
    pub fn is_active(&self) -> bool {
        self.permits.available_permits() == 0
    }
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new()
    }
}
