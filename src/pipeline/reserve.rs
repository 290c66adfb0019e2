//! Engine reservation table shared by in-flight jobs.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;
use tracing::{debug, trace};

use crate::comp::EngineMask;

#[derive(Default)]
struct Inner {
    busy: Mutex<EngineMask>,
    released: Notify,
}

impl Inner {
    fn busy(&self) -> MutexGuard<'_, EngineMask> {
        // The mask is a plain bitset, a poisoned lock still holds a valid value.
        self.busy.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Jobs whose engine masks intersect never run at the same time.
#[derive(Clone, Default)]
pub struct EngineReservations {
    inner: Arc<Inner>,
}

/// Held engines; released when dropped.
#[must_use = "engines are released as soon as the reservation is dropped"]
pub struct Reservation {
    mask: EngineMask,
    inner: Arc<Inner>,
}

impl EngineReservations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `mask` if no held engine intersects it.
    pub fn try_reserve(&self, mask: EngineMask) -> Option<Reservation> {
        let mut busy = self.inner.busy();
        if busy.intersects(mask) {
            return None;
        }
        *busy |= mask;
        debug!("Reserved engines {}", mask);
        Some(Reservation {
            mask,
            inner: Arc::clone(&self.inner),
        })
    }

    /// Wait until `mask` is free, then claim it.
    pub async fn reserve(&self, mask: EngineMask) -> Reservation {
        loop {
            let released = self.inner.released.notified();
            tokio::pin!(released);
            // Register before checking so a release in between is not missed.
            released.as_mut().enable();

            if let Some(reservation) = self.try_reserve(mask) {
                return reservation;
            }
            trace!("Engines {} busy, waiting", mask);
            released.await;
        }
    }

    pub fn busy(&self) -> EngineMask {
        *self.inner.busy()
    }
}

impl Reservation {
    pub fn mask(&self) -> EngineMask {
        self.mask
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.inner.busy().remove(self.mask);
        debug!("Released engines {}", self.mask);
        self.inner.released.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::comp::CompId;

    #[test]
    fn test_try_reserve_conflicts() {
        let table = EngineReservations::new();
        let a = table
            .try_reserve(CompId::Rdma0.bit() | CompId::Rsz1.bit())
            .unwrap();
        assert!(table.try_reserve(CompId::Rsz1.bit()).is_none());

        let b = table.try_reserve(CompId::Wdma.bit()).unwrap();
        assert_eq!(table.busy(), a.mask() | b.mask());

        drop(a);
        assert!(table.try_reserve(CompId::Rsz1.bit()).is_some());
    }

    #[tokio::test]
    async fn test_reserve_waits_for_release() {
        let table = EngineReservations::new();
        let held = table.reserve(CompId::Wrot0.bit()).await;

        let waiter = {
            let table = table.clone();
            tokio::spawn(async move { table.reserve(CompId::Wrot0.bit()).await.mask() })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(held);
        let mask = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mask, CompId::Wrot0.bit());
        assert!(table.busy().is_empty());
    }
}
