//! Ballot-event subscription with scoped release.

use tally_types::BallotCast;
use tokio::sync::mpsc;

/// Capacity of the event channel between a gateway and its subscriber.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Gateway-side cleanup invoked exactly once when a subscription drops.
pub struct ReleaseGuard(Option<Box<dyn FnOnce() + Send>>);

impl ReleaseGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(release)))
    }

    /// A guard that does nothing on release.
    pub fn noop() -> Self {
        Self(None)
    }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        if let Some(release) = self.0.take() {
            release();
        }
    }
}

/// A live attachment to the gateway's ballot-cast event stream.
///
/// Dropping the subscription releases the gateway-side attachment via the
/// [`ReleaseGuard`]. Release is idempotent and never fails, which gives the
/// engine its guaranteed-release contract on every teardown path.
pub struct BallotSubscription {
    events: mpsc::Receiver<BallotCast>,
    _guard: ReleaseGuard,
}

impl BallotSubscription {
    pub fn new(events: mpsc::Receiver<BallotCast>, guard: ReleaseGuard) -> Self {
        Self {
            events,
            _guard: guard,
        }
    }

    /// Receive the next event; `None` once the gateway closes the stream.
    pub async fn recv(&mut self) -> Option<BallotCast> {
        self.events.recv().await
    }
}
