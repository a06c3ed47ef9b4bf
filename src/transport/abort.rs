//! Cooperative cancellation for in-flight exchanges.
//!
//! An [`AbortHandle`]/[`AbortToken`] pair wraps a `watch` channel: the
//! handle flips the flag, the token turns it into an await point the
//! transport can race against the network future. Aborting surfaces as
//! [`ClientError::Aborted`](super::error::ClientError::Aborted), never as a
//! phantom HTTP status.

use tokio::sync::watch;

/// Caller-side trigger for cancelling an exchange.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

/// Transport-side await point observing the abort flag.
#[derive(Debug, Clone)]
pub struct AbortToken {
    rx: watch::Receiver<bool>,
}

impl AbortHandle {
    /// Creates a connected handle/token pair.
    #[must_use]
    pub fn new() -> (Self, AbortToken) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, AbortToken { rx })
    }

    /// Requests cancellation. Idempotent; late calls after the exchange
    /// finished are harmless no-ops.
    pub fn abort(&self) {
        let _ = self.tx.send(true);
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }
}

impl AbortToken {
    /// Resolves once cancellation has been requested.
    ///
    /// If every handle is dropped without aborting, this future never
    /// resolves; the racing network future decides the outcome.
    pub async fn aborted(&mut self) {
        if self.rx.wait_for(|aborted| *aborted).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }
}
