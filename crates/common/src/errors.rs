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

use thiserror::Error;

/// Conditions which stop a run before any trial is started, or which prevent results from being
/// delivered. Request, probe and per-trial faults are never represented here; those are recorded
/// into the trial's result instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HarnessError {
    #[error("Configuration matrix is empty")]
    EmptyMatrix,
    #[error("Concurrency for workload {workload:?} must be at least 1")]
    ZeroConcurrency { workload: String },
    #[error("Workload set has no prompt variants")]
    EmptyWorkloadSet,
    #[error("Invalid timing configuration: {0}")]
    InvalidTiming(String),
    #[error("Result sink failed: {0}")]
    Sink(String),
}
