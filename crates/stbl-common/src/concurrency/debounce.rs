use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex};
use tokio::time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Debounced {
    /// The delay elapsed without a newer call.
    Fired,
    /// A newer call (or an explicit cancel) arrived before the delay elapsed.
    Cancelled,
}

struct Pending {
    id: u64,
    cancel: oneshot::Sender<()>,
}

#[derive(Default)]
struct Slot {
    next_id: u64,
    pending: Option<Pending>,
}

/// Trailing-edge debouncer. Every call to [`Debouncer::wait`] cancels the timer of the
/// previous call and starts a fresh one; only the last call of a burst resolves to
/// [`Debounced::Fired`].
#[derive(Clone)]
pub struct Debouncer {
    delay: Duration,
    slot: Arc<Mutex<Slot>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slot: Arc::default(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn wait(&self) -> Debounced {
        let (sender, receiver) = oneshot::channel();

        let id = {
            let mut slot = self.slot.lock().await;
            slot.next_id += 1;

            let id = slot.next_id;
            if let Some(previous) = slot.pending.replace(Pending { id, cancel: sender }) {
                let _ = previous.cancel.send(());
            }

            id
        };

        tokio::select! {
            _ = time::sleep(self.delay) => {
                let mut slot = self.slot.lock().await;
                if slot.pending.as_ref().is_some_and(|x| x.id == id) {
                    slot.pending = None;
                }

                Debounced::Fired
            },
            _ = receiver => Debounced::Cancelled,
        }
    }

    /// Cancels the pending timer, if any, before it expires.
    pub async fn cancel(&self) {
        if let Some(pending) = self.slot.lock().await.pending.take() {
            let _ = pending.cancel.send(());
        }
    }
}
