use std::time::Instant;

use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Process-wide serialization point for datastore mutations.
///
/// Every gated operation holds the guard across all of its driver calls, so a
/// fetch-verify-delete sequence can never interleave with another request.
#[derive(Debug, Default)]
pub struct RequestGate {
    lock: Mutex<()>,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enter(&self, operation: &'static str) -> GateGuard<'_> {
        let waiting = Instant::now();
        let guard = self.lock.lock().await;
        debug!(
            "gate: {} entered after waiting {:?}",
            operation,
            waiting.elapsed()
        );

        GateGuard {
            _guard: guard,
            operation,
            entered: Instant::now(),
        }
    }
}

/// Released on drop, whichever way the operation exits
pub struct GateGuard<'a> {
    _guard: MutexGuard<'a, ()>,
    operation: &'static str,
    entered: Instant,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        debug!(
            "gate: {} released after {:?}",
            self.operation,
            self.entered.elapsed()
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_guard_releases_on_drop() {
        let gate = RequestGate::new();
        {
            let _guard = gate.enter("insert").await;
            assert!(gate.lock.try_lock().is_err());
        }
        assert!(gate.lock.try_lock().is_ok());
    }

    #[tokio::test]
    async fn test_guard_releases_on_early_return() {
        async fn failing(gate: &RequestGate) -> Result<(), &'static str> {
            let _guard = gate.enter("update").await;
            Err::<(), _>("boom")?;
            Ok(())
        }

        let gate = RequestGate::new();
        assert!(failing(&gate).await.is_err());
        assert!(gate.lock.try_lock().is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_holders_never_overlap() {
        let gate = Arc::new(RequestGate::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let gate = gate.clone();
                let inside = inside.clone();
                let peak = peak.clone();
                tokio::spawn(async move {
                    let _guard = gate.enter("delete").await;
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
