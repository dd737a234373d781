//! Cooperative cancellation
//!
//! One cancellation signal per batch, settable from outside (the CLI signal
//! handler) at any time. The orchestrator checks it before starting each new
//! combination; the writer observes it between internal chunks of a very
//! large stream write. A combination already in flight is never forcibly
//! aborted.

use tokio::sync::watch;

/// Sending half of the cancellation signal; held by the shutdown handler
#[derive(Debug, Clone)]
pub struct CancelTrigger {
    tx: watch::Sender<bool>,
}

impl CancelTrigger {
    /// Signal cancellation; idempotent
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiving half of the cancellation signal; cloned into the orchestrator
/// and the writer
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Non-blocking check, used at combination boundaries and between write
    /// chunks
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Adapt an existing shutdown channel (e.g. the process signal handler)
    pub fn from_watch(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    /// A token that can never be cancelled, for contexts without a batch
    pub fn never() -> Self {
        // The sender drops here; the receiver keeps reporting the last
        // value sent, which stays false forever.
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }
}

/// Create a connected trigger/token pair for one batch
pub fn cancel_pair() -> (CancelTrigger, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelTrigger { tx }, CancelToken { rx })
}
