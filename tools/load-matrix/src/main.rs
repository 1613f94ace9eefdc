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

//! Drives an inference service through every (model, concurrency) cell of a matrix, one trial at
//! a time, and reports latency, success rate and peak host utilization per cell.

mod args;
mod host_probe;
mod ollama;
mod report;

use crate::args::Args;
use crate::host_probe::HostProbe;
use crate::ollama::OllamaIssuer;
use crate::report::{CsvSink, TableSink};
use eyre::eyre;
use loadmatrix_engine::{ResultSink, TrialController};
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{info, warn};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), eyre::Error> {
    color_eyre::install()?;
    let args = Args::load()?;

    loadmatrix_common::tracing::init_tracing(args.debug).unwrap_or_else(|e| {
        eprintln!("Unable to configure logging: {e}");
        std::process::exit(1);
    });

    let matrix = args.matrix()?;
    let workloads = args.workloads()?;
    let engine_config = args.engine_config();

    let issuer = Arc::new(OllamaIssuer::new(
        &args.endpoint,
        engine_config.request_timeout,
    )?);
    info!(
        "Load testing {} with {} trial(s) of {:?} each ({} prompt variant(s))",
        issuer.endpoint(),
        matrix.len(),
        engine_config.trial_duration,
        workloads.len()
    );

    let controller =
        TrialController::new(issuer, Arc::new(HostProbe::new()), workloads, engine_config)?;

    let mut stop_signal = signal(SignalKind::interrupt())
        .map_err(|e| eyre!("Unable to register STOP signal handler: {e}"))?;
    let shutdown = controller.shutdown_token();
    tokio::spawn(async move {
        if stop_signal.recv().await.is_none() {
            return;
        }
        warn!("STOP received, finishing with the results gathered so far...");
        shutdown.cancel();
        if stop_signal.recv().await.is_some() {
            warn!("Second STOP received, exiting immediately");
            std::process::exit(130);
        }
    });

    let mut sinks: Vec<Box<dyn ResultSink>> = vec![Box::new(TableSink::stdout())];
    if let Some(output_file) = &args.output_file {
        sinks.push(Box::new(CsvSink::new(output_file)));
    }

    let results = controller
        .run_and_report(matrix.configs(), &mut sinks)
        .await?;
    info!("Completed {} of {} trial(s)", results.len(), matrix.len());

    Ok(())
}
