use std::time::Duration;

use crate::services::delivery_service::DeliveryService;

/// Fixed cadence between delivery cycles. Not configurable.
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Long-lived delivery loop, spawned once at process startup. Runs a
/// catch-up sweep immediately, then one cycle per interval, forever. Cycle
/// errors are logged and never break the loop; the only way out is process
/// shutdown.
pub async fn run(delivery: DeliveryService) {
    tracing::info!(
        interval_secs = POLL_INTERVAL.as_secs(),
        "Message delivery scheduler started"
    );

    loop {
        match delivery.run_cycle().await {
            Ok(outcome) if outcome.eligible > 0 => {
                tracing::info!(
                    eligible = outcome.eligible,
                    delivered = outcome.delivered,
                    failed = outcome.failed,
                    "Delivery cycle complete"
                );
            }
            Ok(_) => {
                tracing::debug!("No messages due for delivery");
            }
            Err(e) => {
                tracing::error!(error = %e, "Delivery cycle failed, retrying next interval");
            }
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::models::message::DueMessage;
    use crate::services::email_service::MockMailer;
    use crate::services::message_store::MessageStore;
    use async_trait::async_trait;
    use chrono::NaiveDateTime;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingStore {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl MessageStore for CountingStore {
        async fn due_messages(&self, _now: NaiveDateTime) -> Result<Vec<DueMessage>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Error::Internal("store unreachable".to_string()))
            } else {
                Ok(vec![])
            }
        }

        async fn set_delivered(&self, _id: i64, _delivered: bool) -> Result<()> {
            Ok(())
        }
    }

    fn service(store: Arc<CountingStore>) -> DeliveryService {
        DeliveryService::new(store, Arc::new(MockMailer::new()), false)
    }

    #[tokio::test(start_paused = true)]
    async fn catch_up_sweep_runs_before_first_interval() {
        let store = Arc::new(CountingStore {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let handle = tokio::spawn(run(service(store.clone())));

        // Yielding does not advance the paused clock, so any observed cycle
        // happened before the first interval elapsed.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn loop_keeps_cadence_through_store_errors() {
        let store = Arc::new(CountingStore {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let handle = tokio::spawn(run(service(store.clone())));

        tokio::time::sleep(POLL_INTERVAL * 3).await;
        assert!(store.calls.load(Ordering::SeqCst) >= 2);
        handle.abort();
    }
}
