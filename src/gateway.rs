//! Gateway startup and shutdown lifecycle.
//!
//! Two states: initializing → ready, with ready → stopped on shutdown.
//! Startup optionally spawns the external service, builds the API
//! client, and probes health; a degraded probe is logged but never
//! blocks readiness, since the service may become reachable later.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::LightRagClient;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::supervisor::{Spawner, Supervisor, TokioSpawner};

/// A running gateway: immutable configuration, the shared API client,
/// and the optional supervised subprocess.
pub struct Gateway {
    config: Arc<GatewayConfig>,
    client: Arc<LightRagClient>,
    supervisor: Option<Supervisor>,
}

impl Gateway {
    /// Starts the gateway with the production process spawner.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Spawn`] when autostart is enabled and the
    /// subprocess cannot be launched, or [`GatewayError::Client`] when
    /// the API client cannot be constructed. An unreachable LightRAG API
    /// is not an error.
    pub async fn start(config: GatewayConfig) -> Result<Self, GatewayError> {
        Self::start_with_spawner(config, Box::new(TokioSpawner)).await
    }

    /// Starts the gateway with an injected spawner.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Gateway::start`].
    pub async fn start_with_spawner(
        config: GatewayConfig,
        spawner: Box<dyn Spawner>,
    ) -> Result<Self, GatewayError> {
        info!(base_url = %config.base_url(), autostart = config.autostart, "initializing gateway");

        // The supervisor is created before anything else can fail so its
        // child is reaped (kill_on_drop) even when startup aborts below.
        let supervisor = if config.autostart {
            let mut supervisor = Supervisor::with_spawner(spawner);
            supervisor.start(&config)?;
            Some(supervisor)
        } else {
            None
        };

        let client = Arc::new(LightRagClient::new(&config)?);

        let health = client.check_health().await;
        if health.is_healthy() {
            info!(status = %health.status, "LightRAG API reachable");
        } else {
            warn!(
                status = %health.status,
                message = health.message.as_deref().unwrap_or(""),
                "LightRAG API not reachable yet, proceeding to ready"
            );
        }

        info!("gateway ready");
        Ok(Self {
            config: Arc::new(config),
            client,
            supervisor,
        })
    }

    /// The shared gateway configuration.
    #[must_use]
    pub fn config(&self) -> Arc<GatewayConfig> {
        Arc::clone(&self.config)
    }

    /// The shared LightRAG API client.
    #[must_use]
    pub fn client(&self) -> Arc<LightRagClient> {
        Arc::clone(&self.client)
    }

    /// PID of the supervised subprocess, when autostart spawned one.
    #[must_use]
    pub fn supervised_pid(&self) -> Option<u32> {
        self.supervisor.as_ref().and_then(Supervisor::pid)
    }

    /// Stops the gateway. Terminates the supervised subprocess when
    /// autostart was used; externally managed services are left alone.
    pub async fn shutdown(mut self) {
        if let Some(mut supervisor) = self.supervisor.take() {
            supervisor.stop().await;
        }
        info!("gateway stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervisor::testing::{FailingSpawner, MockSpawner, MockState};

    /// Config pointing at a port that refuses connections, so the health
    /// probe degrades quickly without a live server.
    fn offline_config(autostart: bool) -> GatewayConfig {
        GatewayConfig::builder()
            .api_host("127.0.0.1")
            .api_port(1)
            .autostart(autostart)
            .build()
    }

    #[tokio::test]
    async fn startup_without_autostart_never_spawns() {
        let state = Arc::new(MockState::default());
        let gateway = Gateway::start_with_spawner(
            offline_config(false),
            Box::new(MockSpawner {
                state: Arc::clone(&state),
            }),
        )
        .await
        .unwrap();

        assert_eq!(state.spawn_count(), 0);
        assert!(gateway.supervised_pid().is_none());
    }

    #[tokio::test]
    async fn startup_with_autostart_spawns_exactly_once() {
        let state = Arc::new(MockState::default());
        let gateway = Gateway::start_with_spawner(
            offline_config(true),
            Box::new(MockSpawner {
                state: Arc::clone(&state),
            }),
        )
        .await
        .unwrap();

        assert_eq!(state.spawn_count(), 1);
        assert_eq!(gateway.supervised_pid(), Some(4242));

        let commands = state.commands.lock().unwrap();
        assert!(commands[0].args.contains(&"127.0.0.1".to_string()));
        assert!(commands[0].args.contains(&"1".to_string()));
    }

    #[tokio::test]
    async fn startup_proceeds_to_ready_when_api_unreachable() {
        // Health is degraded (port 1 refuses) yet startup succeeds.
        let gateway = Gateway::start(offline_config(false)).await.unwrap();
        let health = gateway.client().check_health().await;
        assert!(!health.is_healthy());
        gateway.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_terminates_supervised_process() {
        let state = Arc::new(MockState::default());
        let gateway = Gateway::start_with_spawner(
            offline_config(true),
            Box::new(MockSpawner {
                state: Arc::clone(&state),
            }),
        )
        .await
        .unwrap();

        gateway.shutdown().await;
        assert!(state.was_terminated());
    }

    #[tokio::test]
    async fn spawn_failure_aborts_startup() {
        let result =
            Gateway::start_with_spawner(offline_config(true), Box::new(FailingSpawner)).await;
        assert!(matches!(result, Err(GatewayError::Spawn(_))));
    }
}
