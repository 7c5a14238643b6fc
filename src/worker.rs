//! Bounded pool of in-flight scoring requests.

use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Caps concurrent requests and lets shutdown wait for the ones in flight.
///
/// Each request task holds a permit until its response is published.
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    capacity: u32,
}

impl WorkerPool {
    /// Create a pool allowing `workers` concurrent requests (at least one).
    pub fn new(workers: usize) -> Self {
        let capacity = u32::try_from(workers.max(1)).unwrap_or(u32::MAX);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity as usize)),
            capacity,
        }
    }

    /// Wait for a free slot. Fails once the pool has been drained.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        self.semaphore.clone().acquire_owned().await
    }

    /// Requests currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.capacity as usize - self.semaphore.available_permits()
    }

    /// Wait until every in-flight request has released its slot, then close
    /// the pool to new work.
    pub async fn drain(&self) -> Result<(), AcquireError> {
        let all = self.semaphore.acquire_many(self.capacity).await?;
        self.semaphore.close();
        drop(all);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_drain_waits_for_in_flight_requests() {
        let pool = WorkerPool::new(2);
        let published = Arc::new(AtomicBool::new(false));

        let permit = pool.acquire().await.unwrap();
        assert_eq!(pool.in_flight(), 1);

        let flag = published.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
            drop(permit);
        });

        pool.drain().await.unwrap();

        assert!(published.load(Ordering::SeqCst));
        assert!(pool.acquire().await.is_err());
    }

    #[tokio::test]
    async fn test_drain_idle_pool() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.in_flight(), 0);

        tokio::time::timeout(Duration::from_secs(1), pool.drain())
            .await
            .unwrap()
            .unwrap();
    }
}
