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

/// A point-in-time snapshot of host utilization. Every field is non-negative.
///
/// The same shape is used for the per-trial peak vector, where each field holds the maximum
/// observed across all samples in the trial.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceSample {
    /// Host CPU utilization, percent.
    pub cpu_load: f64,
    /// Host memory in use, percent of total.
    pub memory_used_pct: f64,
    /// Accelerator (GPU) utilization, percent.
    pub accelerator_load: f64,
    /// Accelerator memory in use, MiB.
    pub accelerator_memory_used: f64,
}

impl ResourceSample {
    pub const ZERO: ResourceSample = ResourceSample {
        cpu_load: 0.0,
        memory_used_pct: 0.0,
        accelerator_load: 0.0,
        accelerator_memory_used: 0.0,
    };

    /// Element-wise maximum of `self` and `other`.
    pub fn peak(self, other: ResourceSample) -> ResourceSample {
        ResourceSample {
            cpu_load: self.cpu_load.max(other.cpu_load),
            memory_used_pct: self.memory_used_pct.max(other.memory_used_pct),
            accelerator_load: self.accelerator_load.max(other.accelerator_load),
            accelerator_memory_used: self
                .accelerator_memory_used
                .max(other.accelerator_memory_used),
        }
    }
}

/// What a resource probe managed to read on one attempt. A `None` dimension could not be read.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProbeReading {
    pub cpu_load: Option<f64>,
    pub memory_used_pct: Option<f64>,
    pub accelerator_load: Option<f64>,
    pub accelerator_memory_used: Option<f64>,
}

impl ProbeReading {
    /// A reading where every dimension was read successfully.
    pub fn complete(sample: ResourceSample) -> Self {
        Self {
            cpu_load: Some(sample.cpu_load),
            memory_used_pct: Some(sample.memory_used_pct),
            accelerator_load: Some(sample.accelerator_load),
            accelerator_memory_used: Some(sample.accelerator_memory_used),
        }
    }

    /// Names of the dimensions which could not be read.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("cpu_load", self.cpu_load),
            ("memory_used_pct", self.memory_used_pct),
            ("accelerator_load", self.accelerator_load),
            ("accelerator_memory_used", self.accelerator_memory_used),
        ]
        .into_iter()
        .filter_map(|(name, v)| v.is_none().then_some(name))
        .collect()
    }

    /// Collapse into a sample, recording unreadable, negative or NaN dimensions as zero.
    pub fn to_sample(&self) -> ResourceSample {
        fn clamp(v: Option<f64>) -> f64 {
            match v {
                Some(v) if v.is_finite() && v > 0.0 => v,
                _ => 0.0,
            }
        }
        ResourceSample {
            cpu_load: clamp(self.cpu_load),
            memory_used_pct: clamp(self.memory_used_pct),
            accelerator_load: clamp(self.accelerator_load),
            accelerator_memory_used: clamp(self.accelerator_memory_used),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_peak_is_elementwise() {
        let a = ResourceSample {
            cpu_load: 50.0,
            memory_used_pct: 10.0,
            accelerator_load: 0.0,
            accelerator_memory_used: 2048.0,
        };
        let b = ResourceSample {
            cpu_load: 20.0,
            memory_used_pct: 70.0,
            accelerator_load: 5.0,
            accelerator_memory_used: 1024.0,
        };
        assert_eq!(
            a.peak(b),
            ResourceSample {
                cpu_load: 50.0,
                memory_used_pct: 70.0,
                accelerator_load: 5.0,
                accelerator_memory_used: 2048.0,
            }
        );
    }

    #[test]
    fn test_partial_reading_zeroes_missing_dimensions() {
        let reading = ProbeReading {
            cpu_load: Some(42.0),
            memory_used_pct: Some(61.5),
            accelerator_load: None,
            accelerator_memory_used: None,
        };
        assert_eq!(
            reading.missing(),
            vec!["accelerator_load", "accelerator_memory_used"]
        );
        assert_eq!(
            reading.to_sample(),
            ResourceSample {
                cpu_load: 42.0,
                memory_used_pct: 61.5,
                accelerator_load: 0.0,
                accelerator_memory_used: 0.0,
            }
        );
    }

    #[test]
    fn test_nonsense_values_are_zeroed() {
        let reading = ProbeReading {
            cpu_load: Some(f64::NAN),
            memory_used_pct: Some(-3.0),
            accelerator_load: Some(f64::INFINITY),
            accelerator_memory_used: Some(12.0),
        };
        assert!(reading.missing().is_empty());
        let sample = reading.to_sample();
        assert_eq!(sample.cpu_load, 0.0);
        assert_eq!(sample.memory_used_pct, 0.0);
        assert_eq!(sample.accelerator_load, 0.0);
        assert_eq!(sample.accelerator_memory_used, 12.0);
    }
}
