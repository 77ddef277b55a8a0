//! A single simulated user.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use url::Url;

use crate::loadgen::stats::{RequestOutcome, RequestStats};
use crate::loadgen::task::{Task, TaskSet};
use crate::loadgen::LoadError;

/// Uniform think time between two actions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitTime {
    min: Duration,
    max: Duration,
}

impl WaitTime {
    /// Think time uniformly distributed in `[min_secs, max_secs]`.
    pub fn between(min_secs: f64, max_secs: f64) -> Result<Self, LoadError> {
        if !(min_secs.is_finite() && max_secs.is_finite()) || min_secs < 0.0 || max_secs < min_secs {
            return Err(LoadError::InvalidWait { min_secs, max_secs });
        }
        Ok(Self {
            min: Duration::from_secs_f64(min_secs),
            max: Duration::from_secs_f64(max_secs),
        })
    }

    pub fn sample(&self, rng: &mut fastrand::Rng) -> Duration {
        self.min + (self.max - self.min).mul_f64(rng.f64())
    }
}

impl Default for WaitTime {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(1000),
            max: Duration::from_millis(2500),
        }
    }
}

/// Loops: wait, pick a weighted task, issue it, record the outcome.
pub struct SimulatedUser {
    id: usize,
    client: reqwest::Client,
    host: Url,
    tasks: Arc<TaskSet>,
    wait: WaitTime,
    stats: Arc<RequestStats>,
    rng: fastrand::Rng,
}

impl SimulatedUser {
    pub fn new(
        id: usize,
        client: reqwest::Client,
        host: Url,
        tasks: Arc<TaskSet>,
        wait: WaitTime,
        stats: Arc<RequestStats>,
    ) -> Self {
        Self {
            id,
            client,
            host,
            tasks,
            wait,
            stats,
            rng: fastrand::Rng::new(),
        }
    }

    /// Run until the shutdown signal fires. Returns the number of requests issued.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> u64 {
        tracing::debug!(user = self.id, "Simulated user started");
        let mut issued = 0;

        loop {
            let pause = self.wait.sample(&mut self.rng);
            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = shutdown.recv() => break,
            }

            let task = self.tasks.pick(&mut self.rng).clone();
            tokio::select! {
                _ = self.execute(&task) => issued += 1,
                _ = shutdown.recv() => break,
            }
        }

        tracing::debug!(user = self.id, issued, "Simulated user stopped");
        issued
    }

    async fn execute(&self, task: &Task) {
        let start = Instant::now();
        let outcome = match self.host.join(&task.path) {
            Ok(url) => self.get(url).await,
            Err(e) => RequestOutcome::Error {
                reason: format!("invalid url: {}", e),
            },
        };
        let latency = start.elapsed();

        if let RequestOutcome::Error { reason } = &outcome {
            tracing::debug!(user = self.id, task = %task.name, error = %reason, "Request failed");
        }
        self.stats.record(&task.name, outcome, latency);
    }

    async fn get(&self, url: Url) -> RequestOutcome {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                match response.bytes().await {
                    Ok(_) => RequestOutcome::Response { status },
                    Err(e) => RequestOutcome::Error {
                        reason: e.to_string(),
                    },
                }
            }
            Err(e) => RequestOutcome::Error {
                reason: e.to_string(),
            },
        }
    }
}
