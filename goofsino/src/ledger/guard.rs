//! The single reader/writer lock in front of the ledger.
//!
//! Tokio's `RwLock` queues waiters in FIFO order, so a steady stream of
//! readers cannot starve a settlement waiting for exclusive access.

use std::time::Duration;
use tokio::{
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::timeout,
};

use super::errors::{LedgerError, LedgerResult};

#[derive(Debug)]
pub struct LedgerGuard {
    lock: RwLock<()>,
    timeout: Duration,
}

impl LedgerGuard {
    pub fn new(timeout: Duration) -> Self {
        Self {
            lock: RwLock::new(()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Waits for shared access, giving up with `Busy` after the timeout.
    pub async fn shared(&self) -> LedgerResult<RwLockReadGuard<'_, ()>> {
        timeout(self.timeout, self.lock.read()).await.map_err(|_| {
            log::warn!("Timed out after {:?} waiting to read the ledger", self.timeout);
            LedgerError::Busy(self.timeout)
        })
    }

    /// Waits for exclusive access, giving up with `Busy` after the timeout.
    pub async fn exclusive(&self) -> LedgerResult<RwLockWriteGuard<'_, ()>> {
        timeout(self.timeout, self.lock.write()).await.map_err(|_| {
            log::warn!("Timed out after {:?} waiting to write the ledger", self.timeout);
            LedgerError::Busy(self.timeout)
        })
    }
}
