//! Cancellable one-shot timer for auto-advance.
//!
//! [`AdvanceTimer::arm`] spawns a task that sleeps and then runs a callback
//! unless its [`CancellationToken`] fires first. Re-arming cancels whatever
//! was pending, so at most one callback is outstanding per timer.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// A single pending scheduled callback, or nothing.
#[derive(Debug, Default)]
pub struct AdvanceTimer {
    pending: Option<CancellationToken>,
}

impl AdvanceTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `on_fire` after `delay`, replacing any pending callback.
    pub fn arm<F>(&mut self, delay: Duration, on_fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let token = CancellationToken::new();
        let guard = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = guard.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    guard.cancel();
                    on_fire.await;
                }
            }
        });

        self.pending = Some(token);
    }

    /// Drop the pending callback, if any. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(token) => {
                let was_pending = !token.is_cancelled();
                token.cancel();
                was_pending
            }
            None => false,
        }
    }

    /// Whether a callback is waiting to fire.
    pub fn is_armed(&self) -> bool {
        self.pending.as_ref().is_some_and(|t| !t.is_cancelled())
    }
}

impl Drop for AdvanceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
