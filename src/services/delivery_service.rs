use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::models::message::DueMessage;
use crate::services::email_service::{self, Mailer};
use crate::services::message_store::MessageStore;
use crate::utils::time::reference_now;

/// Summary of one delivery cycle, returned to the scheduler loop and to the
/// manual admin trigger.
#[derive(Debug, Default, Serialize)]
pub struct CycleOutcome {
    pub eligible: usize,
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct DeliveryService {
    store: Arc<dyn MessageStore>,
    mailer: Arc<dyn Mailer>,
    send_confirmations: bool,
}

impl DeliveryService {
    pub fn new(
        store: Arc<dyn MessageStore>,
        mailer: Arc<dyn Mailer>,
        send_confirmations: bool,
    ) -> Self {
        Self {
            store,
            mailer,
            send_confirmations,
        }
    }

    /// One full cycle: select every due message and attempt each delivery in
    /// ascending-id order. A failure on one message never aborts the rest;
    /// only a failed selection (store unreachable) surfaces as `Err`.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let now = reference_now();
        let due = self.store.due_messages(now).await?;

        let mut outcome = CycleOutcome {
            eligible: due.len(),
            ..Default::default()
        };

        for msg in &due {
            match self.deliver(msg).await {
                Ok(true) => outcome.delivered += 1,
                Ok(false) => outcome.failed += 1,
                Err(e) => {
                    outcome.failed += 1;
                    tracing::error!(message_id = msg.id, error = %e, "Error delivering message");
                }
            }
        }
        Ok(outcome)
    }

    /// Deliver a single snapshot. Returns `Ok(true)` once the delivered flag
    /// has been persisted, `Ok(false)` when the send failed and the row was
    /// re-asserted undelivered so the next cycle retries it.
    async fn deliver(&self, msg: &DueMessage) -> Result<bool> {
        let Some(recipient) = msg.recipient_email.as_deref() else {
            tracing::warn!(message_id = msg.id, "Message has no recipient email, skipping");
            return Ok(false);
        };

        let email = email_service::delivery_email(msg);
        let sent = self
            .mailer
            .send(recipient, &email.subject, &email.text, &email.html)
            .await;

        if !sent {
            // Explicit re-assertion: the row stays visible to the next cycle.
            self.store.set_delivered(msg.id, false).await?;
            tracing::error!(
                message_id = msg.id,
                recipient,
                "Delivery failed, message will be retried next cycle"
            );
            return Ok(false);
        }

        self.store.set_delivered(msg.id, true).await?;
        tracing::info!(message_id = msg.id, recipient, "Message delivered");

        if self.send_confirmations {
            let confirmation =
                email_service::confirmation_email(recipient, &msg.title, msg.delivery_date);
            let confirmed = self
                .mailer
                .send(
                    recipient,
                    &confirmation.subject,
                    &confirmation.text,
                    &confirmation.html,
                )
                .await;
            if !confirmed {
                tracing::warn!(message_id = msg.id, "Delivery confirmation could not be sent");
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::email_service::MockMailer;
    use async_trait::async_trait;
    use chrono::NaiveDateTime;
    use std::sync::Mutex;

    fn due(id: i64, title: &str) -> DueMessage {
        DueMessage {
            id,
            title: title.to_string(),
            content: format!("content of {}", title),
            recipient_email: Some("recipient@example.com".to_string()),
            delivery_date: NaiveDateTime::parse_from_str("2030-01-01 00:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            is_delivered: false,
        }
    }

    /// In-memory store scripted per test: `due` is what the selector
    /// returns, `flag_writes` records every `set_delivered` call.
    #[derive(Default)]
    struct MemStore {
        due: Vec<DueMessage>,
        flag_writes: Mutex<Vec<(i64, bool)>>,
        fail_query: bool,
        fail_update_for: Option<i64>,
    }

    #[async_trait]
    impl MessageStore for MemStore {
        async fn due_messages(&self, _now: NaiveDateTime) -> Result<Vec<DueMessage>> {
            if self.fail_query {
                return Err(crate::error::Error::Internal("store unreachable".to_string()));
            }
            Ok(self.due.clone())
        }

        async fn set_delivered(&self, id: i64, delivered: bool) -> Result<()> {
            if self.fail_update_for == Some(id) {
                return Err(crate::error::Error::Internal("row update failed".to_string()));
            }
            self.flag_writes.lock().unwrap().push((id, delivered));
            Ok(())
        }
    }

    #[tokio::test]
    async fn successful_delivery_marks_message_delivered() {
        let store = Arc::new(MemStore {
            due: vec![due(1, "Goodbye")],
            ..Default::default()
        });
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|to, subject, _, _| {
                to == "recipient@example.com" && subject == "Your AfterLife Message: Goodbye"
            })
            .times(1)
            .returning(|_, _, _, _| true);

        let service = DeliveryService::new(store.clone(), Arc::new(mailer), false);
        let outcome = service.run_cycle().await.unwrap();

        assert_eq!(outcome.eligible, 1);
        assert_eq!(outcome.delivered, 1);
        assert_eq!(outcome.failed, 0);
        assert_eq!(*store.flag_writes.lock().unwrap(), vec![(1, true)]);
    }

    #[tokio::test]
    async fn failed_send_reasserts_undelivered() {
        let store = Arc::new(MemStore {
            due: vec![due(4, "Flaky")],
            ..Default::default()
        });
        let mut mailer = MockMailer::new();
        mailer.expect_send().times(1).returning(|_, _, _, _| false);

        let service = DeliveryService::new(store.clone(), Arc::new(mailer), false);
        let outcome = service.run_cycle().await.unwrap();

        assert_eq!(outcome.delivered, 0);
        assert_eq!(outcome.failed, 1);
        assert_eq!(*store.flag_writes.lock().unwrap(), vec![(4, false)]);
    }

    #[tokio::test]
    async fn snapshot_without_recipient_is_skipped_without_side_effects() {
        let mut msg = due(9, "Orphan");
        msg.recipient_email = None;
        let store = Arc::new(MemStore {
            due: vec![msg],
            ..Default::default()
        });
        // No expectations: any send call panics the test.
        let mailer = MockMailer::new();

        let service = DeliveryService::new(store.clone(), Arc::new(mailer), false);
        let outcome = service.run_cycle().await.unwrap();

        assert_eq!(outcome.delivered, 0);
        assert!(store.flag_writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn confirmation_failure_does_not_undo_delivery() {
        let store = Arc::new(MemStore {
            due: vec![due(2, "Confirmed")],
            ..Default::default()
        });
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|_, subject, _, _| subject.starts_with("Your AfterLife Message:"))
            .times(1)
            .returning(|_, _, _, _| true);
        mailer
            .expect_send()
            .withf(|_, subject, _, _| subject.contains("has been delivered"))
            .times(1)
            .returning(|_, _, _, _| false);

        let service = DeliveryService::new(store.clone(), Arc::new(mailer), true);
        let outcome = service.run_cycle().await.unwrap();

        assert_eq!(outcome.delivered, 1);
        assert_eq!(outcome.failed, 0);
        assert_eq!(*store.flag_writes.lock().unwrap(), vec![(2, true)]);
    }

    #[tokio::test]
    async fn one_failing_update_does_not_abort_sibling_deliveries() {
        let store = Arc::new(MemStore {
            due: vec![due(1, "Poisoned"), due(2, "Healthy")],
            fail_update_for: Some(1),
            ..Default::default()
        });
        let mut mailer = MockMailer::new();
        mailer.expect_send().times(2).returning(|_, _, _, _| true);

        let service = DeliveryService::new(store.clone(), Arc::new(mailer), false);
        let outcome = service.run_cycle().await.unwrap();

        assert_eq!(outcome.eligible, 2);
        assert_eq!(outcome.delivered, 1);
        assert_eq!(outcome.failed, 1);
        assert_eq!(*store.flag_writes.lock().unwrap(), vec![(2, true)]);
    }

    #[tokio::test]
    async fn unreachable_store_surfaces_as_cycle_error() {
        let store = Arc::new(MemStore {
            fail_query: true,
            ..Default::default()
        });
        let mailer = MockMailer::new();

        let service = DeliveryService::new(store, Arc::new(mailer), false);
        assert!(service.run_cycle().await.is_err());
    }
}
