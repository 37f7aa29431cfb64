//! Controller Façade — the single public entry point adapters use. Owns the
//! orchestrator behind a mutex, runs the background poll loop, and fans
//! derived state out to subscribers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex as SyncMutex;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::BridgeResult;
use crate::events::StateListener;
use crate::models::PlayerState;
use crate::orchestrator::SessionOrchestrator;

/// Coordinates one [`SessionOrchestrator`] with a poll loop and a set of
/// state-change subscribers. `start`/`stop` are idempotent; `subscribe` is
/// additive-only, matching the original controller's lifecycle.
pub struct BridgeController {
    orchestrator: Arc<AsyncMutex<SessionOrchestrator>>,
    listeners: SyncMutex<Vec<Arc<dyn StateListener>>>,
    poll_interval: Duration,
    running: AtomicBool,
    cancel: SyncMutex<Option<CancellationToken>>,
    poll_task: SyncMutex<Option<JoinHandle<()>>>,
}

impl BridgeController {
    /// Builds the façade from configuration. The orchestrator is constructed
    /// but nothing is started — no network or subprocess activity happens
    /// until [`Self::start`].
    pub fn new(config: Config) -> BridgeResult<Self> {
        let poll_interval = Duration::from_secs_f64(config.poll_interval_seconds.max(0.1));
        let orchestrator = SessionOrchestrator::new(config)?;
        Ok(Self {
            orchestrator: Arc::new(AsyncMutex::new(orchestrator)),
            listeners: SyncMutex::new(Vec::new()),
            poll_interval,
            running: AtomicBool::new(false),
            cancel: SyncMutex::new(None),
            poll_task: SyncMutex::new(None),
        })
    }

    /// Registers a subscriber for future state-change notifications. Never
    /// removes existing subscribers.
    pub fn subscribe(&self, listener: Arc<dyn StateListener>) {
        self.listeners.lock().push(listener);
    }

    /// Starts the background poll loop. Idempotent: a second call while
    /// already running is a no-op.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let token = CancellationToken::new();
        *self.cancel.lock() = Some(token.clone());

        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            this.sync_loop(token).await;
        });
        *self.poll_task.lock() = Some(handle);
    }

    /// Stops the poll loop and releases the media subprocess. Idempotent.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some(token) = self.cancel.lock().take() {
            token.cancel();
        }
        let handle = self.poll_task.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        self.orchestrator.lock().await.close().await;
    }

    /// Poll loop: fetches state, fans it out, then waits either for the
    /// next tick or for cancellation, whichever comes first. The
    /// cancellable wait is what makes `stop()` return promptly instead of
    /// blocking for up to one full poll interval.
    async fn sync_loop(&self, token: CancellationToken) {
        loop {
            let state = {
                let mut orchestrator = self.orchestrator.lock().await;
                orchestrator.fetch_state().await
            };
            match state {
                Ok(state) => self.emit_state(&state),
                Err(err) => log::warn!("poll tick failed to fetch state: {err}"),
            }

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    /// Notifies every subscriber independently; one listener panicking or
    /// erroring never prevents the others from being notified.
    fn emit_state(&self, state: &PlayerState) {
        let listeners = self.listeners.lock().clone();
        for listener in listeners {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_state_changed(state);
            }));
            if result.is_err() {
                log::warn!("a state listener panicked while handling a player_state_changed notification");
            }
        }
    }

    /// Fetches the current derived state directly, bypassing the poll
    /// cadence. Used by adapters that need a synchronous snapshot (e.g. on
    /// first attach).
    pub async fn state(&self) -> BridgeResult<PlayerState> {
        self.orchestrator.lock().await.fetch_state().await
    }

    pub async fn play(&self) -> BridgeResult<()> {
        self.orchestrator.lock().await.play().await
    }

    pub async fn pause(&self) -> BridgeResult<()> {
        self.orchestrator.lock().await.pause().await
    }

    pub async fn play_pause(&self) -> BridgeResult<()> {
        self.orchestrator.lock().await.play_pause().await
    }

    pub async fn stop_playback(&self) -> BridgeResult<()> {
        self.orchestrator.lock().await.stop().await
    }

    pub async fn next(&self) -> BridgeResult<()> {
        self.orchestrator.lock().await.next().await
    }

    pub async fn previous(&self) -> BridgeResult<()> {
        self.orchestrator.lock().await.previous().await
    }

    pub async fn seek(&self, offset_us: i64) -> BridgeResult<()> {
        self.orchestrator.lock().await.seek(offset_us).await
    }

    pub async fn set_position(&self, track_id: &str, position_us: u64) -> BridgeResult<()> {
        self.orchestrator.lock().await.set_position(track_id, position_us).await
    }

    pub async fn set_volume(&self, volume: f64) -> BridgeResult<()> {
        self.orchestrator.lock().await.set_volume(volume).await
    }

    pub async fn like_current(&self) -> BridgeResult<()> {
        self.orchestrator.lock().await.like_current().await
    }

    pub async fn dislike_current(&self) -> BridgeResult<()> {
        self.orchestrator.lock().await.dislike_current().await
    }

    pub async fn get_rotor_seeds(&self) -> Vec<String> {
        self.orchestrator.lock().await.get_rotor_seeds()
    }

    pub async fn set_rotor_seeds(&self, seeds: Vec<String>) -> BridgeResult<()> {
        self.orchestrator.lock().await.set_rotor_seeds(seeds).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CountingListener(AtomicUsize);

    impl StateListener for CountingListener {
        fn on_state_changed(&self, _state: &PlayerState) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn start_stop_is_idempotent() {
        let controller = Arc::new(BridgeController::new(Config::default()).unwrap());
        controller.start();
        controller.start();
        controller.stop().await;
        controller.stop().await;
    }

    #[tokio::test]
    async fn subscribe_is_additive_and_state_reaches_every_listener() {
        let controller = Arc::new(BridgeController::new(Config::default()).unwrap());
        let counter = Arc::new(CountingListener(AtomicUsize::new(0)));
        controller.subscribe(counter.clone());
        controller.subscribe(counter.clone());

        let state = controller.state().await.unwrap();
        controller.emit_state(&state);

        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn state_without_oauth_token_never_touches_network() {
        let controller = BridgeController::new(Config::default()).unwrap();
        let state = controller.state().await.unwrap();
        assert!(!state.can_control);
    }
}
