//! Spawns simulated users and collects their statistics.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use url::Url;

use crate::lifecycle::Shutdown;
use crate::loadgen::stats::{RequestStats, StatsSnapshot};
use crate::loadgen::task::TaskSet;
use crate::loadgen::user::{SimulatedUser, WaitTime};
use crate::loadgen::LoadError;

/// Shape of a load run.
#[derive(Debug, Clone)]
pub struct LoadProfile {
    pub host: Url,
    pub users: usize,
    /// Users started per second while ramping up.
    pub spawn_rate: f64,
    pub wait: WaitTime,
    /// Stop after this long; `None` runs until shutdown.
    pub run_time: Option<Duration>,
    pub tasks: TaskSet,
}

impl LoadProfile {
    pub fn new(host: &str) -> Result<Self, LoadError> {
        Ok(Self {
            host: Url::parse(host)?,
            users: 1,
            spawn_rate: 1.0,
            wait: WaitTime::default(),
            run_time: None,
            tasks: TaskSet::demo_api(),
        })
    }

    fn spawn_interval(&self) -> Duration {
        if self.spawn_rate.is_finite() && self.spawn_rate > 0.0 {
            Duration::from_secs_f64(1.0 / self.spawn_rate)
        } else {
            Duration::ZERO
        }
    }
}

/// Drives a [`LoadProfile`] to completion.
pub struct LoadRunner {
    profile: LoadProfile,
    client: reqwest::Client,
    stats: Arc<RequestStats>,
}

impl LoadRunner {
    pub fn new(profile: LoadProfile) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            profile,
            client,
            stats: Arc::new(RequestStats::new()),
        })
    }

    /// Run until `run_time` elapses or `shutdown` fires.
    pub async fn run(self, shutdown: Shutdown) -> Vec<StatsSnapshot> {
        let LoadProfile {
            host,
            users,
            wait,
            run_time,
            tasks,
            ..
        } = self.profile.clone();
        let interval = self.profile.spawn_interval();
        let tasks = Arc::new(tasks);

        tracing::info!(
            host = %host,
            users,
            spawn_rate = self.profile.spawn_rate,
            run_time_secs = run_time.map(|d| d.as_secs_f64()),
            "Starting load run"
        );

        if let Some(run_time) = run_time {
            let timer = shutdown.clone();
            tokio::spawn(async move {
                tokio::time::sleep(run_time).await;
                tracing::info!("Run time elapsed, stopping users");
                timer.trigger();
            });
        }

        let mut stop = shutdown.subscribe();
        let mut running = JoinSet::new();
        for id in 0..users {
            // subscribe first: a trigger after this point reaches the user,
            // one before it is visible through the flag
            let user_stop = shutdown.subscribe();
            if shutdown.is_triggered() {
                break;
            }
            let user = SimulatedUser::new(
                id,
                self.client.clone(),
                host.clone(),
                tasks.clone(),
                wait,
                self.stats.clone(),
            );
            running.spawn(user.run(user_stop));

            if id + 1 < users && !interval.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = stop.recv() => break,
                }
            }
        }
        tracing::info!(spawned = running.len(), "All users spawned");

        let mut issued = 0;
        while let Some(result) = running.join_next().await {
            match result {
                Ok(count) => issued += count,
                Err(e) => tracing::warn!(error = %e, "Simulated user task failed"),
            }
        }

        tracing::info!(issued, recorded = self.stats.total_requests(), "Load run finished");
        self.stats.snapshot()
    }
}
