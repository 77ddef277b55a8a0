//! Weighted task table.

use crate::http::handlers::{DATA_PATH, HEALTH_PATH};
use crate::loadgen::LoadError;

/// One kind of request a simulated user can issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Logical name statistics are aggregated under.
    pub name: String,
    /// Request path, joined onto the target host.
    pub path: String,
    /// Relative selection weight.
    pub weight: u32,
}

impl Task {
    pub fn get(path: impl Into<String>, weight: u32) -> Self {
        let path = path.into();
        Self {
            name: path.clone(),
            path,
            weight,
        }
    }
}

/// Immutable set of tasks with precomputed total weight.
#[derive(Debug, Clone)]
pub struct TaskSet {
    tasks: Vec<Task>,
    total_weight: u32,
}

impl TaskSet {
    pub fn new(tasks: Vec<Task>) -> Result<Self, LoadError> {
        let total_weight = tasks.iter().map(|t| t.weight).sum();
        if total_weight == 0 {
            return Err(LoadError::EmptyTaskSet);
        }
        Ok(Self {
            tasks,
            total_weight,
        })
    }

    /// Three data requests for every health check.
    pub fn demo_api() -> Self {
        Self {
            tasks: vec![Task::get(DATA_PATH, 3), Task::get(HEALTH_PATH, 1)],
            total_weight: 4,
        }
    }

    /// Pick a task with probability proportional to its weight.
    pub fn pick(&self, rng: &mut fastrand::Rng) -> &Task {
        let mut roll = rng.u32(0..self.total_weight);
        for task in &self.tasks {
            if roll < task.weight {
                return task;
            }
            roll -= task.weight;
        }
        // total_weight is the sum of all weights, so the loop always returns
        &self.tasks[self.tasks.len() - 1]
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }
}
