//! Order notification emails: rendering, outbox and the delivery seam
//!
//! Delivery itself belongs to the external mail provider; this module only
//! renders the messages and drains them through an in-process outbox so a
//! provider failure is logged and retried instead of silently swallowed,
//! and never fails the order that triggered it.

pub mod render;

use crate::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), AppError>;
}

/// Delivery stub: logs the rendered message. Stands in for the external
/// mail provider in development.
pub struct TracingMailer;

#[async_trait]
impl Mailer for TracingMailer {
    async fn send(&self, email: &Email) -> Result<(), AppError> {
        tracing::info!(to = %email.to, subject = %email.subject, "email ready for delivery");
        Ok(())
    }
}

/// In-process outbox: an unbounded queue drained by a spawned worker.
/// `enqueue` never blocks the caller and never surfaces delivery errors.
#[derive(Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<Email>,
}

impl Outbox {
    pub fn spawn(mailer: Arc<dyn Mailer>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Email>();
        tokio::spawn(async move {
            while let Some(email) = rx.recv().await {
                if let Err(e) = mailer.send(&email).await {
                    tracing::warn!(error = %e, to = %email.to, "email delivery failed, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                    if let Err(e) = mailer.send(&email).await {
                        tracing::error!(
                            error = %e,
                            to = %email.to,
                            subject = %email.subject,
                            "email delivery failed after retry, dropping"
                        );
                    }
                }
            }
        });
        Self { tx }
    }

    pub fn enqueue(&self, email: Email) {
        if self.tx.send(email).is_err() {
            tracing::warn!("outbox worker gone, dropping email");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    struct FlakyMailer {
        attempts: AtomicUsize,
        delivered: Mutex<Option<mpsc::UnboundedSender<Email>>>,
    }

    #[async_trait]
    impl Mailer for FlakyMailer {
        async fn send(&self, email: &Email) -> Result<(), AppError> {
            // first attempt fails, the retry goes through
            if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(AppError::Internal("provider unavailable".into()));
            }
            if let Some(tx) = self.delivered.lock().await.as_ref() {
                let _ = tx.send(email.clone());
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn retries_once_then_delivers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mailer = Arc::new(FlakyMailer {
            attempts: AtomicUsize::new(0),
            delivered: Mutex::new(Some(tx)),
        });
        let outbox = Outbox::spawn(mailer.clone());

        outbox.enqueue(Email {
            to: "buyer@example.com".into(),
            subject: "Confirmación de pedido".into(),
            html: "<p>ok</p>".into(),
        });

        let delivered = rx.recv().await.expect("email should arrive after retry");
        assert_eq!(delivered.to, "buyer@example.com");
        assert_eq!(mailer.attempts.load(Ordering::SeqCst), 2);
    }
}
