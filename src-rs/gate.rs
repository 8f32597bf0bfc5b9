use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("all {0} parse slots are busy")]
    Full(usize),

    #[error("admission gate closed")]
    Closed,
}

/// Bounded-concurrency limiter in front of the parser.
///
/// Capacity is fixed at construction. A slot is held for as long as the
/// returned [`AdmissionPermit`] lives, so every exit path releases it.
#[derive(Clone)]
pub struct AdmissionGate {
    slots: Arc<Semaphore>,
    capacity: usize,
}

pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionGate {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of permits currently out. Informational only; never use it to
    /// decide whether to acquire.
    pub fn held(&self) -> usize {
        self.capacity - self.slots.available_permits()
    }

    /// Test-and-reserve in one step. Never waits.
    pub fn try_acquire(&self) -> Result<AdmissionPermit, GateError> {
        match self.slots.clone().try_acquire_owned() {
            Ok(permit) => Ok(AdmissionPermit { _permit: permit }),
            Err(TryAcquireError::NoPermits) => Err(GateError::Full(self.capacity)),
            Err(TryAcquireError::Closed) => Err(GateError::Closed),
        }
    }

    /// Waits for a free slot. Waiters are served in arrival order.
    pub async fn acquire(&self) -> Result<AdmissionPermit, GateError> {
        self.slots
            .clone()
            .acquire_owned()
            .await
            .map(|permit| AdmissionPermit { _permit: permit })
            .map_err(|_| GateError::Closed)
    }
}
