//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the telemetry registry
//! - Bind the metrics listener, then the API listener
//! - Spawn both servers wired to one shutdown coordinator

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::ServiceConfig;
use crate::http::{AppState, HttpServer};
use crate::lifecycle::Shutdown;
use crate::observability::{metrics, Telemetry, TelemetryError};
use crate::simulation::Randomness;

/// Errors that abort startup or surface when the servers exit.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Handles to a started service.
pub struct RunningService {
    pub api_addr: SocketAddr,
    pub metrics_addr: SocketAddr,
    pub telemetry: Arc<Telemetry>,
    shutdown: Shutdown,
    api_task: JoinHandle<Result<(), std::io::Error>>,
    metrics_task: JoinHandle<Result<(), std::io::Error>>,
}

impl RunningService {
    /// Coordinator that stops both servers when triggered.
    pub fn shutdown(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Wait for both servers to exit.
    ///
    /// The first server to fail stops the other and its error is returned.
    pub async fn wait(self) -> Result<(), StartupError> {
        let shutdown = self.shutdown.clone();
        let result = tokio::try_join!(join(self.api_task), join(self.metrics_task));
        if let Err(e) = &result {
            tracing::error!(error = %e, "Server exited with error, stopping the other");
            shutdown.trigger();
        }
        result.map(|_| ())
    }

    /// Trigger shutdown and wait for both servers to drain.
    pub async fn stop(self) -> Result<(), StartupError> {
        self.shutdown.trigger();
        self.wait().await
    }
}

/// Start the metrics and API servers described by `config`.
pub async fn start(
    config: &ServiceConfig,
    randomness: Arc<dyn Randomness>,
) -> Result<RunningService, StartupError> {
    let telemetry = Arc::new(Telemetry::new(config.telemetry.service_name.clone())?);
    let shutdown = Shutdown::new();

    let metrics_listener = bind(&config.metrics_address).await?;
    let metrics_addr = metrics_listener.local_addr()?;
    let metrics_task = tokio::spawn(metrics::serve(
        metrics_listener,
        telemetry.metrics().clone(),
        shutdown.subscribe(),
    ));
    tracing::info!(
        service = %telemetry.service_name(),
        "Prometheus metrics server started on port {}.",
        metrics_addr.port()
    );

    let api_listener = bind(&config.bind_address).await?;
    let api_addr = api_listener.local_addr()?;
    let server = HttpServer::new(AppState::new(telemetry.clone(), randomness));
    let api_task = tokio::spawn(server.run(api_listener, shutdown.subscribe()));

    Ok(RunningService {
        api_addr,
        metrics_addr,
        telemetry,
        shutdown,
        api_task,
        metrics_task,
    })
}

async fn join(task: JoinHandle<Result<(), std::io::Error>>) -> Result<(), StartupError> {
    task.await??;
    Ok(())
}

async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn service_with(
        api_task: JoinHandle<Result<(), std::io::Error>>,
        metrics_task: JoinHandle<Result<(), std::io::Error>>,
        shutdown: Shutdown,
    ) -> RunningService {
        RunningService {
            api_addr: "127.0.0.1:0".parse().unwrap(),
            metrics_addr: "127.0.0.1:0".parse().unwrap(),
            telemetry: Arc::new(Telemetry::new("startup-test").unwrap()),
            shutdown,
            api_task,
            metrics_task,
        }
    }

    #[tokio::test]
    async fn test_metrics_failure_surfaces_while_api_runs() {
        let shutdown = Shutdown::new();
        let mut api_stop = shutdown.subscribe();
        let api_task = tokio::spawn(async move {
            let _ = api_stop.recv().await;
            Ok(())
        });
        let metrics_task = tokio::spawn(async {
            Err(std::io::Error::other("scrape listener died"))
        });

        let service = service_with(api_task, metrics_task, shutdown);
        let result = tokio::time::timeout(Duration::from_secs(2), service.wait())
            .await
            .expect("wait should not block on the healthy server");
        assert!(matches!(result, Err(StartupError::Serve(_))));
    }

    #[tokio::test]
    async fn test_wait_returns_after_clean_stop() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.subscribe();
        let api_task = tokio::spawn(async move {
            let _ = a.recv().await;
            Ok(())
        });
        let metrics_task = tokio::spawn(async move {
            let _ = b.recv().await;
            Ok(())
        });

        let service = service_with(api_task, metrics_task, shutdown);
        service.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_start_binds_ephemeral_ports() {
        let mut config = ServiceConfig::default();
        config.bind_address = "127.0.0.1:0".into();
        config.metrics_address = "127.0.0.1:0".into();

        let service = start(&config, Arc::new(crate::simulation::ScriptedRandomness::success(1)))
            .await
            .unwrap();
        assert_ne!(service.api_addr.port(), 0);
        assert_ne!(service.metrics_addr.port(), 0);
        assert_ne!(service.api_addr, service.metrics_addr);
        service.stop().await.unwrap();
    }
}
