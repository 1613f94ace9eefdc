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
use crate::config::EngineConfig;
use crate::generator::WorkloadGenerator;
use crate::issuer::RequestIssuer;
use crate::probe::ResourceProbe;
use crate::sampler::ResourceSampler;
use crate::sink::ResultSink;
use crate::workload::WorkloadSet;
use loadmatrix_common::{HarnessError, TrialConfig, TrialResult};
use std::sync::Arc;
use tokio::select;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runs trials one at a time, with a cool-down between them, and collects their results in
/// the order the trials were given.
pub struct TrialController<I, P> {
    generator: WorkloadGenerator<I>,
    sampler: ResourceSampler<P>,
    config: EngineConfig,
    shutdown: CancellationToken,
}

impl<I: RequestIssuer, P: ResourceProbe> TrialController<I, P> {
    pub fn new(
        issuer: Arc<I>,
        probe: Arc<P>,
        workloads: WorkloadSet,
        config: EngineConfig,
    ) -> Result<Self, HarnessError> {
        config.validate()?;
        Ok(Self {
            generator: WorkloadGenerator::new(issuer, workloads, config.request_timeout),
            sampler: ResourceSampler::new(probe, config.sample_interval),
            config,
            shutdown: CancellationToken::new(),
        })
    }

    /// Token which, once cancelled, cuts the running trial short and skips the rest of the
    /// matrix. Results for trials run so far are still returned.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run every trial in `configs`, in order.
    pub async fn run_all(&self, configs: &[TrialConfig]) -> Result<Vec<TrialResult>, HarnessError> {
        if configs.is_empty() {
            return Err(HarnessError::EmptyMatrix);
        }

        let mut results = Vec::with_capacity(configs.len());
        for (idx, config) in configs.iter().enumerate() {
            if self.shutdown.is_cancelled() {
                warn!(
                    "Shutdown requested; skipping {} remaining trial(s)",
                    configs.len() - idx
                );
                break;
            }

            info!(
                "Testing workload {}, concurrency {} ({}/{})",
                config.workload_id(),
                config.concurrency(),
                idx + 1,
                configs.len()
            );
            let result = self.run_trial(config).await;
            info!(
                "@ {}: {} requests, {:.1}% success, avg {:.1}ms (min {:.1}ms / max {:.1}ms), peak CPU {:.1}%, peak GPU {:.1}%",
                result.config,
                result.total_requests,
                result.success_rate_pct,
                result.avg_latency_ms,
                result.min_latency_ms,
                result.max_latency_ms,
                result.peak_resources.cpu_load,
                result.peak_resources.accelerator_load,
            );
            results.push(result);

            if idx + 1 < configs.len() && !self.config.cooldown.is_zero() {
                info!("Cooling down for {:?}...", self.config.cooldown);
                select! {
                    _ = sleep(self.config.cooldown) => {}
                    _ = self.shutdown.cancelled() => {}
                }
            }
        }
        Ok(results)
    }

    /// Run every trial and hand the ordered results to `sink`. The sink is not invoked when the
    /// matrix is rejected.
    pub async fn run_and_report<S: ResultSink + ?Sized>(
        &self,
        configs: &[TrialConfig],
        sink: &mut S,
    ) -> Result<Vec<TrialResult>, HarnessError> {
        let results = self.run_all(configs).await?;
        sink.consume(&results)?;
        Ok(results)
    }

    /// Run a single trial to completion. Never fails: faults in workers or the sampler are
    /// logged and the result is reduced from whatever was recorded before them.
    pub async fn run_trial(&self, config: &TrialConfig) -> TrialResult {
        let aggregator = Arc::new(Aggregator::new());
        let cancel = self.shutdown.child_token();
        let started = Instant::now();
        let deadline = started + self.config.trial_duration;

        let timer = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                select! {
                    _ = sleep_until(deadline) => cancel.cancel(),
                    _ = cancel.cancelled() => {}
                }
            })
        };

        let sampler = {
            let sampler = self.sampler.clone();
            let cancel = cancel.clone();
            let aggregator = aggregator.clone();
            tokio::spawn(async move { sampler.run(cancel, aggregator).await })
        };

        let report = self
            .generator
            .run(config, deadline, cancel.clone(), aggregator.clone())
            .await;

        // Workers may all have exited early (e.g. every one faulted); make sure the sampler and
        // the timer stop too.
        cancel.cancel();
        if let Err(e) = sampler.await {
            warn!(trial = %config, "Resource sampler terminated abnormally: {e}");
        }
        if let Err(e) = timer.await {
            warn!(trial = %config, "Trial timer terminated abnormally: {e}");
        }

        if report.workers_faulted > 0 {
            warn!(
                trial = %config,
                "{} of {} workers faulted; result covers the requests recorded before that",
                report.workers_faulted,
                report.workers_spawned
            );
        }

        aggregator.reduce(config.clone(), started.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::Completion;
    use loadmatrix_common::{ProbeReading, RequestFailure, ResourceSample};
    use std::time::Duration;

    struct FixedLatencyIssuer;

    impl RequestIssuer for FixedLatencyIssuer {
        async fn send(
            &self,
            _workload_id: &str,
            _prompt: &str,
        ) -> Result<Completion, RequestFailure> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(Completion::default())
        }
    }

    struct IdleProbe;

    impl ResourceProbe for IdleProbe {
        async fn sample(&self) -> ProbeReading {
            ProbeReading::complete(ResourceSample::ZERO)
        }
    }

    fn controller(config: EngineConfig) -> TrialController<FixedLatencyIssuer, IdleProbe> {
        TrialController::new(
            Arc::new(FixedLatencyIssuer),
            Arc::new(IdleProbe),
            WorkloadSet::default(),
            config,
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_matrix_rejected() {
        let controller = controller(EngineConfig::default());
        assert_eq!(
            controller.run_all(&[]).await,
            Err(HarnessError::EmptyMatrix)
        );
    }

    #[test]
    fn test_invalid_timing_rejected() {
        let result = TrialController::new(
            Arc::new(FixedLatencyIssuer),
            Arc::new(IdleProbe),
            WorkloadSet::default(),
            EngineConfig {
                trial_duration: Duration::ZERO,
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(HarnessError::InvalidTiming(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_trial_runs_for_its_duration() {
        let controller = controller(EngineConfig {
            trial_duration: Duration::from_secs(2),
            ..Default::default()
        });
        let config = TrialConfig::new("w1", 1).unwrap();
        let result = controller.run_trial(&config).await;
        assert!(result.wall_time >= Duration::from_secs(2));
        assert!(result.wall_time < Duration::from_millis(2100));
        assert_eq!(result.success_rate_pct, 100.0);
        assert!((38..=40).contains(&result.total_requests));
        assert!(result.samples_collected >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_matrix() {
        let controller = controller(EngineConfig {
            trial_duration: Duration::from_secs(10),
            cooldown: Duration::from_secs(5),
            ..Default::default()
        });
        let shutdown = controller.shutdown_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            shutdown.cancel();
        });

        let configs = vec![
            TrialConfig::new("w1", 1).unwrap(),
            TrialConfig::new("w1", 2).unwrap(),
        ];
        let started = Instant::now();
        let results = controller.run_all(&configs).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
