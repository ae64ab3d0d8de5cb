//! Wakeup signals shared by blocking and async waiters

use std::sync::{Condvar, MutexGuard, PoisonError};
use std::time::Duration;

#[cfg(feature = "async")]
use tokio::sync::Notify;

/// One condition, observable from threads and from tasks
///
/// Blocking readers park on the condvar, which must be paired with the
/// stream's state mutex. Async readers must register interest through
/// [`notified`](Self::notified) *before* checking state, so a raise that
/// lands between the check and the await is not lost.
#[derive(Debug, Default)]
pub struct Signal {
    condvar: Condvar,
    #[cfg(feature = "async")]
    notify: Notify,
}

impl Signal {
    /// Signal with no waiters
    pub fn new() -> Self {
        Self::default()
    }

    /// Wake every current waiter; raising with no waiters is a no-op
    pub fn raise(&self) {
        self.condvar.notify_all();
        #[cfg(feature = "async")]
        self.notify.notify_waiters();
    }

    /// Block until raised; poisoning is ignored
    pub fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        self.condvar
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until raised or `timeout` elapses
    pub fn wait_timeout<'a, T>(
        &self,
        guard: MutexGuard<'a, T>,
        timeout: Duration,
    ) -> MutexGuard<'a, T> {
        let (guard, _) = self
            .condvar
            .wait_timeout(guard, timeout)
            .unwrap_or_else(PoisonError::into_inner);
        guard
    }

    #[cfg(feature = "async")]
    pub fn notified(&self) -> tokio::sync::futures::Notified<'_> {
        self.notify.notified()
    }
}
