//! State-change notification abstraction for the façade.
//!
//! The façade depends on this trait rather than a concrete channel type, so
//! adapters (desktop-bus, local socket) can subscribe without the façade
//! knowing anything about their transport.

use crate::models::PlayerState;

/// Receives player-state snapshots emitted by the façade's background poll
/// loop. A listener failing (panicking inside, or simply being slow) must
/// never prevent other listeners from being notified — the façade enforces
/// this by notifying each listener independently and logging failures.
pub trait StateListener: Send + Sync {
    fn on_state_changed(&self, state: &PlayerState);
}

/// No-op listener, useful as a default subscriber count of zero without an
/// `Option` at every call site.
pub struct NoopStateListener;

impl StateListener for NoopStateListener {
    fn on_state_changed(&self, _state: &PlayerState) {}
}

/// Logs every snapshot at debug level. Useful during development or when no
/// real adapter is attached yet.
pub struct LoggingStateListener;

impl StateListener for LoggingStateListener {
    fn on_state_changed(&self, state: &PlayerState) {
        tracing::debug!(status = ?state.status, track = %state.track.title, "player_state_changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingListener {
        count: AtomicUsize,
    }

    impl StateListener for CountingListener {
        fn on_state_changed(&self, _state: &PlayerState) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn counting_listener_tracks_notifications() {
        let listener = CountingListener {
            count: AtomicUsize::new(0),
        };
        listener.on_state_changed(&PlayerState::default());
        listener.on_state_changed(&PlayerState::default());
        assert_eq!(listener.count.load(Ordering::SeqCst), 2);
    }
}
