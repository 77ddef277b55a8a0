//! Per-route request statistics.
//!
//! Response times are bucketed to whole milliseconds, so memory stays bounded
//! however long a run lasts.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use dashmap::DashMap;

/// Outcome of a single request as seen by a simulated user.
#[derive(Debug, Clone)]
pub enum RequestOutcome {
    /// The server answered; non-2xx statuses still count as failures.
    Response { status: u16 },
    /// Transport-level failure (connect, timeout, body read).
    Error { reason: String },
}

#[derive(Debug, Default)]
struct RouteStats {
    requests: u64,
    failures: u64,
    total_ms: u64,
    min_ms: Option<u64>,
    max_ms: u64,
    response_times: BTreeMap<u64, u64>,
    statuses: BTreeMap<u16, u64>,
    errors: BTreeMap<String, u64>,
}

impl RouteStats {
    fn record(&mut self, outcome: &RequestOutcome, latency: Duration) {
        let ms = latency.as_millis() as u64;
        self.requests += 1;
        self.total_ms += ms;
        self.min_ms = Some(self.min_ms.map_or(ms, |m| m.min(ms)));
        self.max_ms = self.max_ms.max(ms);
        *self.response_times.entry(ms).or_default() += 1;

        match outcome {
            RequestOutcome::Response { status } => {
                *self.statuses.entry(*status).or_default() += 1;
                if !(200..300).contains(status) {
                    self.failures += 1;
                    *self.errors.entry(format!("HTTP {}", status)).or_default() += 1;
                }
            }
            RequestOutcome::Error { reason } => {
                self.failures += 1;
                *self.errors.entry(reason.clone()).or_default() += 1;
            }
        }
    }

    fn percentile(&self, fraction: f64) -> u64 {
        if self.requests == 0 {
            return 0;
        }
        let target = ((self.requests as f64) * fraction).ceil().max(1.0) as u64;
        let mut seen = 0;
        for (ms, count) in &self.response_times {
            seen += count;
            if seen >= target {
                return *ms;
            }
        }
        self.max_ms
    }

    fn snapshot(&self, name: &str) -> StatsSnapshot {
        StatsSnapshot {
            name: name.to_string(),
            requests: self.requests,
            failures: self.failures,
            avg_ms: if self.requests == 0 {
                0.0
            } else {
                self.total_ms as f64 / self.requests as f64
            },
            min_ms: self.min_ms.unwrap_or(0),
            max_ms: self.max_ms,
            median_ms: self.percentile(0.5),
            p95_ms: self.percentile(0.95),
            statuses: self.statuses.clone(),
            errors: self.errors.clone(),
        }
    }
}

/// Point-in-time view of one route's statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub name: String,
    pub requests: u64,
    pub failures: u64,
    pub avg_ms: f64,
    pub min_ms: u64,
    pub max_ms: u64,
    pub median_ms: u64,
    pub p95_ms: u64,
    pub statuses: BTreeMap<u16, u64>,
    pub errors: BTreeMap<String, u64>,
}

impl StatsSnapshot {
    pub fn failure_ratio(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.failures as f64 / self.requests as f64
        }
    }
}

/// Concurrent collector shared by all simulated users.
#[derive(Debug, Default)]
pub struct RequestStats {
    routes: DashMap<String, RouteStats>,
}

impl RequestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: &str, outcome: RequestOutcome, latency: Duration) {
        self.routes
            .entry(name.to_string())
            .or_default()
            .record(&outcome, latency);
    }

    /// Snapshots sorted by route name.
    pub fn snapshot(&self) -> Vec<StatsSnapshot> {
        let mut snapshots: Vec<_> = self
            .routes
            .iter()
            .map(|entry| entry.value().snapshot(entry.key()))
            .collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    pub fn total_requests(&self) -> u64 {
        self.routes.iter().map(|entry| entry.value().requests).sum()
    }
}

/// Render a fixed-width report table with an aggregated row.
pub fn render_report(snapshots: &[StatsSnapshot]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:>8} {:>8} {:>9} {:>8} {:>8} {:>8} {:>8}",
        "Name", "# reqs", "# fails", "Avg (ms)", "Min", "Max", "Median", "p95"
    );
    let _ = writeln!(out, "{}", "-".repeat(82));

    let mut total_requests = 0;
    let mut total_failures = 0;
    let mut weighted_avg = 0.0;
    for s in snapshots {
        let _ = writeln!(
            out,
            "{:<16} {:>8} {:>8} {:>9.1} {:>8} {:>8} {:>8} {:>8}",
            s.name, s.requests, s.failures, s.avg_ms, s.min_ms, s.max_ms, s.median_ms, s.p95_ms
        );
        total_requests += s.requests;
        total_failures += s.failures;
        weighted_avg += s.avg_ms * s.requests as f64;
    }

    let avg = if total_requests == 0 {
        0.0
    } else {
        weighted_avg / total_requests as f64
    };
    let _ = writeln!(out, "{}", "-".repeat(82));
    let _ = writeln!(
        out,
        "{:<16} {:>8} {:>8} {:>9.1}",
        "Aggregated", total_requests, total_failures, avg
    );

    let errors: Vec<_> = snapshots
        .iter()
        .flat_map(|s| s.errors.iter().map(move |(reason, n)| (s.name.as_str(), reason, n)))
        .collect();
    if !errors.is_empty() {
        let _ = writeln!(out, "\nFailures:");
        for (name, reason, count) in errors {
            let _ = writeln!(out, "{:>8}  {:<16} {}", count, name, reason);
        }
    }
    out
}
