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

use clap::Parser;
use clap::builder::ValueHint;
use clap_derive::Parser;
use eyre::eyre;
use figment::Figment;
use figment::providers::{Format, Serialized, Yaml};
use loadmatrix_common::HarnessError;
use loadmatrix_engine::{EngineConfig, TrialMatrix, WorkloadSet};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(about = "Load-test an inference service across a matrix of models and concurrency levels")]
pub struct Args {
    #[arg(
        long,
        value_name = "url",
        help = "Generate endpoint of the inference service",
        default_value = "http://localhost:11434/api/generate"
    )]
    pub endpoint: String,

    #[arg(
        long,
        value_name = "models",
        help = "Comma separated list of models to test, in order",
        value_delimiter = ',',
        default_value = "deepseek-r1:1.5b,deepseek-r1:7b,deepseek-r1:8b,deepseek-r1:14b,deepseek-r1:32b"
    )]
    pub models: Vec<String>,

    #[arg(
        long,
        value_name = "levels",
        help = "Comma separated list of concurrency levels to run each model at, in order",
        value_delimiter = ',',
        default_value = "1,2,3,4,5,6"
    )]
    pub concurrency: Vec<usize>,

    #[arg(
        long = "prompt",
        value_name = "prompt",
        help = "Prompt variant to pick from at random for each request. May be repeated. \
                If not specified, a built-in set of three prompts is used."
    )]
    pub prompts: Vec<String>,

    #[arg(
        long,
        help = "How long each trial drives load, in seconds",
        default_value = "30"
    )]
    pub trial_duration_seconds: u64,

    #[arg(
        long,
        help = "Idle time between consecutive trials, in seconds",
        default_value = "10"
    )]
    pub cooldown_seconds: u64,

    #[arg(
        long,
        help = "Interval between host resource samples, in milliseconds",
        default_value = "1000"
    )]
    pub sample_interval_ms: u64,

    #[arg(
        long,
        help = "Per-request timeout, in seconds",
        default_value = "60"
    )]
    pub request_timeout_seconds: u64,

    #[arg(
        long,
        help = "CSV output file for trial results",
        value_hint = ValueHint::FilePath
    )]
    pub output_file: Option<PathBuf>,

    #[arg(long, help = "Enable debug logging", default_value = "false")]
    pub debug: bool,

    #[arg(
        long,
        value_name = "config",
        help = "Path to configuration (YAML) file to use, if any. Values in the file override \
                command line arguments.",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,
}

impl Args {
    /// Parse the command line, then layer the YAML config file (if any) on top of it.
    pub fn load() -> Result<Self, eyre::Report> {
        Self::parse().merge_config_file()
    }

    pub fn merge_config_file(self) -> Result<Self, eyre::Report> {
        let Some(config_path) = self.config_file.clone() else {
            return Ok(self);
        };
        Figment::new()
            .merge(Serialized::defaults(self))
            .merge(Yaml::file(&config_path))
            .extract::<Args>()
            .map_err(|e| {
                eyre!(
                    "Failed to parse configuration from {:?}: {}",
                    config_path,
                    e
                )
            })
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            trial_duration: Duration::from_secs(self.trial_duration_seconds),
            cooldown: Duration::from_secs(self.cooldown_seconds),
            sample_interval: Duration::from_millis(self.sample_interval_ms),
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
        }
    }

    pub fn matrix(&self) -> Result<TrialMatrix, HarnessError> {
        TrialMatrix::cross(&self.models, &self.concurrency)
    }

    pub fn workloads(&self) -> Result<WorkloadSet, HarnessError> {
        if self.prompts.is_empty() {
            return Ok(WorkloadSet::default());
        }
        WorkloadSet::new(self.prompts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadmatrix_engine::DEFAULT_PROMPTS;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["load-matrix"]).unwrap();
        assert_eq!(args.models.len(), 5);
        assert_eq!(args.concurrency, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(args.engine_config(), EngineConfig::default());
        assert_eq!(args.matrix().unwrap().len(), 30);
        assert_eq!(args.workloads().unwrap().len(), DEFAULT_PROMPTS.len());
    }

    #[test]
    fn test_lists_and_prompts() {
        let args = Args::try_parse_from([
            "load-matrix",
            "--models",
            "llama3:8b,qwen2:7b",
            "--concurrency",
            "2,8",
            "--prompt",
            "Hello, world",
            "--prompt",
            "Write a haiku",
        ])
        .unwrap();
        let matrix = args.matrix().unwrap();
        let cells: Vec<String> = matrix.configs().iter().map(|c| c.to_string()).collect();
        assert_eq!(
            cells,
            vec!["llama3:8b @ 2", "llama3:8b @ 8", "qwen2:7b @ 2", "qwen2:7b @ 8"]
        );
        assert_eq!(
            args.workloads().unwrap().prompts(),
            &["Hello, world".to_string(), "Write a haiku".to_string()]
        );
    }

    #[test]
    fn test_zero_concurrency_is_a_config_error() {
        let args = Args::try_parse_from(["load-matrix", "--concurrency", "0"]).unwrap();
        assert!(matches!(
            args.matrix(),
            Err(HarnessError::ZeroConcurrency { .. })
        ));
    }

    #[test]
    fn test_config_file_overrides_cli() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "models:\n  - tiny\ntrial_duration_seconds: 5\ncooldown_seconds: 0"
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = Args::try_parse_from([
            "load-matrix",
            "--trial-duration-seconds",
            "12",
            "--request-timeout-seconds",
            "7",
            "--config-file",
            &path,
        ])
        .unwrap()
        .merge_config_file()
        .unwrap();

        assert_eq!(args.models, vec!["tiny".to_string()]);
        let config = args.engine_config();
        assert_eq!(config.trial_duration, Duration::from_secs(5));
        assert_eq!(config.cooldown, Duration::ZERO);
        assert_eq!(config.request_timeout, Duration::from_secs(7));
    }
}
