// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use crate::HarnessError;
use crate::model::ResourceSample;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// One cell of the configuration matrix: which workload to drive, and with how many workers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrialConfig {
    workload_id: String,
    concurrency: usize,
}

impl TrialConfig {
    pub fn new(workload_id: impl Into<String>, concurrency: usize) -> Result<Self, HarnessError> {
        let workload_id = workload_id.into();
        if concurrency == 0 {
            return Err(HarnessError::ZeroConcurrency {
                workload: workload_id,
            });
        }
        Ok(Self {
            workload_id,
            concurrency,
        })
    }

    pub fn workload_id(&self) -> &str {
        &self.workload_id
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }
}

impl Display for TrialConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}", self.workload_id, self.concurrency)
    }
}

/// Latency percentiles over successful requests, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencyPercentiles {
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

/// The reduced, comparable record of exactly one trial.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialResult {
    pub config: TrialConfig,
    /// Element-wise maximum over every resource sample collected in the trial.
    pub peak_resources: ResourceSample,
    /// Number of samples `peak_resources` was computed from. A zero peak with zero samples means
    /// "not measured" rather than "idle".
    pub samples_collected: usize,
    pub avg_latency_ms: f64,
    pub max_latency_ms: f64,
    pub min_latency_ms: f64,
    pub percentiles: LatencyPercentiles,
    pub success_rate_pct: f64,
    pub total_requests: usize,
    pub success_count: usize,
    /// How long the trial actually ran, from worker start until every producer had stopped.
    pub wall_time: Duration,
}

impl TrialResult {
    pub fn failure_count(&self) -> usize {
        self.total_requests - self.success_count
    }

    /// Completed requests (successful or not) per second of trial wall time.
    pub fn throughput_rps(&self) -> f64 {
        let secs = self.wall_time.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.total_requests as f64 / secs
    }
}
