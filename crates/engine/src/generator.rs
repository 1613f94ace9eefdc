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

use crate::aggregator::Aggregator;
use crate::issuer::RequestIssuer;
use crate::workload::WorkloadSet;
use loadmatrix_common::{RequestFailure, RequestOutcome, TrialConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep_until, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// What happened to the worker pool of one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GeneratorReport {
    /// Workers started; always the trial's concurrency.
    pub workers_spawned: usize,
    /// Workers which died from a panic rather than observing cancellation.
    pub workers_faulted: usize,
    /// Outcomes recorded by the workers which exited cleanly.
    pub requests_issued: usize,
}

/// Drives a fixed pool of workers which issue requests back to back until the trial ends.
pub struct WorkloadGenerator<I> {
    issuer: Arc<I>,
    workloads: WorkloadSet,
    request_timeout: Duration,
}

impl<I: RequestIssuer> WorkloadGenerator<I> {
    pub fn new(issuer: Arc<I>, workloads: WorkloadSet, request_timeout: Duration) -> Self {
        Self {
            issuer,
            workloads,
            request_timeout,
        }
    }

    /// Run `config.concurrency()` workers against `config.workload_id()` until `deadline` passes
    /// or `cancel` fires, recording every completed attempt into `aggregator`.
    ///
    /// Returns only once every worker has exited, so nothing is recorded after this returns.
    pub async fn run(
        &self,
        config: &TrialConfig,
        deadline: Instant,
        cancel: CancellationToken,
        aggregator: Arc<Aggregator>,
    ) -> GeneratorReport {
        let workload_id: Arc<str> = Arc::from(config.workload_id());
        let mut workers = JoinSet::new();
        for worker in 0..config.concurrency() {
            workers.spawn(worker_loop(
                worker,
                self.issuer.clone(),
                self.workloads.clone(),
                workload_id.clone(),
                self.request_timeout,
                deadline,
                cancel.clone(),
                aggregator.clone(),
            ));
        }

        let mut report = GeneratorReport {
            workers_spawned: config.concurrency(),
            ..Default::default()
        };
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(issued) => report.requests_issued += issued,
                Err(e) => {
                    error!(workload = %workload_id, "Worker terminated abnormally: {e}");
                    report.workers_faulted += 1;
                }
            }
        }
        report
    }
}

#[allow(clippy::too_many_arguments)]
async fn worker_loop<I: RequestIssuer>(
    worker: usize,
    issuer: Arc<I>,
    workloads: WorkloadSet,
    workload_id: Arc<str>,
    request_timeout: Duration,
    deadline: Instant,
    cancel: CancellationToken,
    aggregator: Arc<Aggregator>,
) -> usize {
    let mut issued = 0;
    while !cancel.is_cancelled() && Instant::now() < deadline {
        let prompt = workloads.pick();
        let start = Instant::now();

        // An attempt still in flight when the trial ends is abandoned, not recorded.
        let attempt = select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = sleep_until(deadline) => break,
            attempt = timeout(request_timeout, issuer.send(&workload_id, prompt)) => attempt,
        };
        let elapsed = start.elapsed();

        let outcome = match attempt {
            Ok(Ok(completion)) => {
                debug!(
                    worker,
                    workload = %workload_id,
                    prompt,
                    ?elapsed,
                    response_bytes = completion.response_bytes,
                    "Request completed"
                );
                RequestOutcome::success(elapsed)
            }
            Ok(Err(failure)) => {
                debug!(
                    worker,
                    workload = %workload_id,
                    prompt,
                    ?elapsed,
                    "Request failed: {failure}"
                );
                RequestOutcome::failure(elapsed, failure)
            }
            Err(_) => {
                debug!(
                    worker,
                    workload = %workload_id,
                    prompt,
                    ?elapsed,
                    "Request timed out"
                );
                RequestOutcome::failure(elapsed, RequestFailure::TimedOut(request_timeout))
            }
        };
        aggregator.record_outcome(outcome);
        issued += 1;

        // Keeps the loop preemptible when the issuer completes without ever suspending.
        tokio::task::yield_now().await;
    }
    issued
}
