use tokio::sync::oneshot;

use crate::PublishError;

/// Final state of one publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed(PublishError),
    /// Reserved for upstream cancellation. The publisher never produces it.
    Canceled,
}

enum Notify {
    Channel(oneshot::Sender<Outcome>),
    Callback(Box<dyn FnOnce(Outcome) + Send>),
    Noop,
}

/// One-shot completion notifier handed to every publish call.
///
/// All methods take `self`, so a signal can fire at most once. Dropping a
/// channel-backed signal without firing it is observed by its `Completion`
/// as `Canceled`.
pub struct Signal {
    notify: Notify,
}

impl Signal {
    /// A signal paired with the receiver that observes it.
    pub fn channel() -> (Signal, Completion) {
        let (tx, rx) = oneshot::channel();
        (Signal { notify: Notify::Channel(tx) }, Completion { rx })
    }

    /// Run `f` with the outcome.
    pub fn from_fn(f: impl FnOnce(Outcome) + Send + 'static) -> Signal {
        Signal { notify: Notify::Callback(Box::new(f)) }
    }

    /// A signal nobody listens to.
    pub fn noop() -> Signal {
        Signal { notify: Notify::Noop }
    }

    pub fn completed(self) {
        self.fire(Outcome::Completed);
    }

    pub fn failed(self, err: PublishError) {
        self.fire(Outcome::Failed(err));
    }

    pub fn canceled(self) {
        self.fire(Outcome::Canceled);
    }

    pub fn fire(self, outcome: Outcome) {
        match self.notify {
            // The receiver may be gone; the publish result is still returned.
            Notify::Channel(tx) => {
                let _ = tx.send(outcome);
            }
            Notify::Callback(f) => f(outcome),
            Notify::Noop => {}
        }
    }
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.notify {
            Notify::Channel(_) => "channel",
            Notify::Callback(_) => "callback",
            Notify::Noop => "noop",
        };
        f.debug_struct("Signal").field("notify", &kind).finish()
    }
}

/// Receiving half of `Signal::channel`.
#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<Outcome>,
}

impl Completion {
    /// Wait for the outcome. A signal dropped unfired reads as `Canceled`.
    pub async fn wait(self) -> Outcome {
        self.rx.await.unwrap_or(Outcome::Canceled)
    }

    /// Non-blocking check: `None` while the signal has not fired yet.
    pub fn try_outcome(&mut self) -> Option<Outcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Outcome::Canceled),
        }
    }
}
