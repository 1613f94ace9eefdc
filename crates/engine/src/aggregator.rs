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

use loadmatrix_common::{
    LatencyPercentiles, RequestOutcome, ResourceSample, TrialConfig, TrialResult,
};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Default)]
struct Accumulator {
    total_requests: usize,
    success_latencies: Vec<Duration>,
    peak: ResourceSample,
    samples: usize,
}

/// Collects request outcomes and resource samples from every producer of a single trial.
///
/// `record_*` may be called concurrently from any number of workers and the sampler. `reduce`
/// must only be called once all producers have been joined.
#[derive(Default)]
pub struct Aggregator {
    inner: Mutex<Accumulator>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    // A producer that panicked while holding the lock can only have left a fully applied
    // record or none at all, so the state is still usable.
    fn lock(&self) -> MutexGuard<'_, Accumulator> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record_outcome(&self, outcome: RequestOutcome) {
        let mut acc = self.lock();
        acc.total_requests += 1;
        if outcome.succeeded() {
            acc.success_latencies.push(outcome.elapsed);
        }
    }

    pub fn record_sample(&self, sample: ResourceSample) {
        let mut acc = self.lock();
        acc.peak = acc.peak.peak(sample);
        acc.samples += 1;
    }

    pub fn total_requests(&self) -> usize {
        self.lock().total_requests
    }

    /// Drain the accumulated state into the trial's result.
    pub fn reduce(&self, config: TrialConfig, wall_time: Duration) -> TrialResult {
        let acc = std::mem::take(&mut *self.lock());

        let success_count = acc.success_latencies.len();
        let success_rate_pct = if acc.total_requests == 0 {
            0.0
        } else {
            success_count as f64 / acc.total_requests as f64 * 100.0
        };

        let (avg, max, min) = calculate_stats(&acc.success_latencies);
        let (p50, p95, p99) = calculate_percentiles(acc.success_latencies);

        TrialResult {
            config,
            peak_resources: acc.peak,
            samples_collected: acc.samples,
            avg_latency_ms: avg,
            max_latency_ms: max,
            min_latency_ms: min,
            percentiles: LatencyPercentiles {
                p50_ms: p50,
                p95_ms: p95,
                p99_ms: p99,
            },
            success_rate_pct,
            total_requests: acc.total_requests,
            success_count,
            wall_time,
        }
    }
}

fn as_ms(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}

/// Returns (avg, max, min) in milliseconds, all zero for an empty set.
fn calculate_stats(latencies: &[Duration]) -> (f64, f64, f64) {
    let (Some(max), Some(min)) = (latencies.iter().max(), latencies.iter().min()) else {
        return (0.0, 0.0, 0.0);
    };
    let total: Duration = latencies.iter().sum();
    let avg = total.as_nanos() as f64 / latencies.len() as f64 / 1_000_000.0;
    (avg, as_ms(*max), as_ms(*min))
}

/// Returns (p50, p95, p99) in milliseconds, all zero for an empty set.
fn calculate_percentiles(mut latencies: Vec<Duration>) -> (f64, f64, f64) {
    if latencies.is_empty() {
        return (0.0, 0.0, 0.0);
    }

    latencies.sort();
    let len = latencies.len();

    let p50 = latencies[len / 2];
    let p95 = latencies[(len * 95) / 100];
    let p99 = latencies[(len * 99) / 100];

    (as_ms(p50), as_ms(p95), as_ms(p99))
}
