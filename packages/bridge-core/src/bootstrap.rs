//! Application bootstrap and dependency wiring.
//!
//! This module is the composition root: the single place where the
//! orchestrator, its transport and media collaborators, and the façade that
//! fronts them are instantiated and wired together. Keeping this apart from
//! [`crate::facade`] means the façade never needs to know how its
//! dependencies get built, and a future embedder (desktop tray app, systemd
//! unit) can call one function instead of duplicating the wiring order.

use std::sync::Arc;

use crate::config::Config;
use crate::error::BridgeResult;
use crate::events::LoggingStateListener;
use crate::facade::BridgeController;

/// Container for the bootstrapped façade. Trivial today, but kept as a
/// struct (rather than returning `Arc<BridgeController>` directly) so
/// additional shared services can be added here without changing every
/// call site's return type.
pub struct BootstrappedServices {
    /// The façade adapters drive: verbs in, state-change notifications out.
    pub controller: Arc<BridgeController>,
}

impl BootstrappedServices {
    /// Stops the poll loop and releases the media subprocess.
    pub async fn shutdown(&self) {
        log::info!("shutting down ym-bridge services");
        self.controller.stop().await;
    }
}

/// Wires up the façade from configuration.
///
/// Wiring order:
/// 1. [`SessionOrchestrator`](crate::orchestrator::SessionOrchestrator) and
///    its owned [`CloudTransport`](crate::transport::CloudTransport) /
///    [`MediaController`](crate::media::MediaController) (built inside
///    `BridgeController::new`).
/// 2. [`BridgeController`] wrapping the orchestrator.
/// 3. A default logging subscriber, so state changes are visible even
///    before a real adapter attaches.
///
/// Does not start the poll loop — call [`BridgeController::start`] once the
/// caller is ready to begin driving the media subprocess.
pub fn bootstrap_services(config: Config) -> BridgeResult<BootstrappedServices> {
    log::info!("bootstrapping ym-bridge services");

    let controller = Arc::new(BridgeController::new(config)?);
    controller.subscribe(Arc::new(LoggingStateListener));

    Ok(BootstrappedServices { controller })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_succeeds_with_default_config() {
        let services = bootstrap_services(Config::default()).unwrap();
        assert!(Arc::strong_count(&services.controller) >= 1);
    }
}
