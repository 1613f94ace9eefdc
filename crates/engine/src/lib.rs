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

//! Trial execution engine for load-testing an inference service.
//!
//! A run is a matrix of (workload, concurrency) trials executed strictly one after another. Each
//! trial runs a fixed-size pool of workers hammering the target service until a deadline, while a
//! sampler records host utilization at a fixed interval. Both feed a shared [`Aggregator`], which
//! reduces everything into one [`TrialResult`](loadmatrix_common::TrialResult) per trial once all
//! producers have stopped.
//!
//! The target service and the host measurement mechanism are supplied by the caller through the
//! [`RequestIssuer`] and [`ResourceProbe`] traits.

pub use aggregator::Aggregator;
pub use config::EngineConfig;
pub use controller::TrialController;
pub use generator::{GeneratorReport, WorkloadGenerator};
pub use issuer::{Completion, RequestIssuer};
pub use matrix::TrialMatrix;
pub use probe::ResourceProbe;
pub use sampler::ResourceSampler;
pub use sink::ResultSink;
pub use workload::{DEFAULT_PROMPTS, WorkloadSet};

mod aggregator;
mod config;
mod controller;
mod generator;
mod issuer;
mod matrix;
mod probe;
mod sampler;
mod sink;
mod workload;
