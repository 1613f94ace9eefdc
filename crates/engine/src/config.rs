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

//! Timing knobs for the engine. Created by the driving binary from its CLI flags / config file,
//! and handed to the [`TrialController`](crate::TrialController).

use loadmatrix_common::HarnessError;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long each trial drives load before its workers are cancelled.
    pub trial_duration: Duration,
    /// Idle time between the end of one trial and the start of the next.
    pub cooldown: Duration,
    /// How often the resource sampler polls the probe.
    pub sample_interval: Duration,
    /// Upper bound on a single request; exceeding it records a failed outcome.
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trial_duration: Duration::from_secs(30),
            cooldown: Duration::from_secs(10),
            sample_interval: Duration::from_secs(1),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.trial_duration.is_zero() {
            return Err(HarnessError::InvalidTiming(
                "trial duration must be non-zero".to_string(),
            ));
        }
        if self.sample_interval.is_zero() {
            return Err(HarnessError::InvalidTiming(
                "sample interval must be non-zero".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(HarnessError::InvalidTiming(
                "request timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_zero_sample_interval_rejected() {
        let config = EngineConfig {
            sample_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(HarnessError::InvalidTiming(_))
        ));
    }

    #[test]
    fn test_zero_cooldown_allowed() {
        let config = EngineConfig {
            cooldown: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }
}
