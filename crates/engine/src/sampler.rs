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
use crate::probe::ResourceProbe;
use loadmatrix_common::ProbeReading;
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio::time::{Instant, MissedTickBehavior, interval_at, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Polls a [`ResourceProbe`] on a fixed tick for the lifetime of one trial.
pub struct ResourceSampler<P> {
    probe: Arc<P>,
    interval: Duration,
}

impl<P> Clone for ResourceSampler<P> {
    fn clone(&self) -> Self {
        Self {
            probe: self.probe.clone(),
            interval: self.interval,
        }
    }
}

impl<P: ResourceProbe> ResourceSampler<P> {
    pub fn new(probe: Arc<P>, interval: Duration) -> Self {
        Self { probe, interval }
    }

    /// Sample until `cancel` fires, feeding every sample into `aggregator`. Returns how many
    /// samples were delivered.
    ///
    /// The first sample is taken one interval after start. A probe call already underway when
    /// cancellation arrives is allowed to finish and its sample is recorded; no new call is made
    /// afterwards. A probe call is given at most one interval; one that overruns is abandoned and
    /// recorded as a reading with every dimension missing.
    pub async fn run(&self, cancel: CancellationToken, aggregator: Arc<Aggregator>) -> usize {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut delivered = 0;
        let mut reported_missing = false;
        loop {
            select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let reading = match timeout(self.interval, self.probe.sample()).await {
                Ok(reading) => reading,
                Err(_) => {
                    warn!(
                        "Resource probe did not answer within {:?}; recording an empty sample",
                        self.interval
                    );
                    ProbeReading::default()
                }
            };
            let missing = reading.missing();
            if !missing.is_empty() {
                if reported_missing {
                    debug!(?missing, "Resource probe could not read some dimensions");
                } else {
                    warn!(
                        ?missing,
                        "Resource probe could not read some dimensions; recording them as zero"
                    );
                    reported_missing = true;
                }
            }
            aggregator.record_sample(reading.to_sample());
            delivered += 1;
        }
        delivered
    }
}
