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

use loadmatrix_common::{HarnessError, TrialResult};
use loadmatrix_engine::ResultSink;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tabled::{Table, Tabled};
use tracing::info;

#[derive(Tabled)]
struct TrialRow {
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Conc")]
    concurrency: usize,
    #[tabled(rename = "CPU Load (%)")]
    cpu_load: String,
    #[tabled(rename = "GPU Load (%)")]
    gpu_load: String,
    #[tabled(rename = "GPU Mem (MB)")]
    gpu_memory: String,
    #[tabled(rename = "Mem Used (%)")]
    memory_used: String,
    #[tabled(rename = "Avg (ms)")]
    avg_latency: String,
    #[tabled(rename = "Max (ms)")]
    max_latency: String,
    #[tabled(rename = "Min (ms)")]
    min_latency: String,
    #[tabled(rename = "p95 (ms)")]
    p95_latency: String,
    #[tabled(rename = "Success (%)")]
    success_rate: String,
    #[tabled(rename = "Requests")]
    requests: usize,
}

impl From<&TrialResult> for TrialRow {
    fn from(r: &TrialResult) -> Self {
        Self {
            model: r.config.workload_id().to_string(),
            concurrency: r.config.concurrency(),
            cpu_load: format!("{:.1}", r.peak_resources.cpu_load),
            gpu_load: format!("{:.1}", r.peak_resources.accelerator_load),
            gpu_memory: format!("{:.0}", r.peak_resources.accelerator_memory_used),
            memory_used: format!("{:.1}", r.peak_resources.memory_used_pct),
            avg_latency: format!("{:.1}", r.avg_latency_ms),
            max_latency: format!("{:.1}", r.max_latency_ms),
            min_latency: format!("{:.1}", r.min_latency_ms),
            p95_latency: format!("{:.1}", r.percentiles.p95_ms),
            success_rate: format!("{:.1}", r.success_rate_pct),
            requests: r.total_requests,
        }
    }
}

pub fn render_table(results: &[TrialResult]) -> String {
    let rows: Vec<TrialRow> = results.iter().map(TrialRow::from).collect();
    Table::new(&rows).to_string()
}

/// Prints the result matrix as a table.
pub struct TableSink<W> {
    out: W,
}

impl TableSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write> TableSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ResultSink for TableSink<W> {
    fn consume(&mut self, results: &[TrialResult]) -> Result<(), HarnessError> {
        writeln!(self.out, "{}", render_table(results))
            .and_then(|_| self.out.flush())
            .map_err(|e| HarnessError::Sink(format!("Unable to write result table: {e}")))
    }
}

/// One CSV record per trial; field names double as the header row.
#[derive(Serialize)]
struct CsvRow<'a> {
    model: &'a str,
    concurrency: usize,
    cpu_load_pct: f64,
    memory_used_pct: f64,
    gpu_load_pct: f64,
    gpu_memory_used_mb: f64,
    samples_collected: usize,
    avg_latency_ms: f64,
    max_latency_ms: f64,
    min_latency_ms: f64,
    p50_latency_ms: f64,
    p95_latency_ms: f64,
    p99_latency_ms: f64,
    success_rate_pct: f64,
    total_requests: usize,
    success_count: usize,
    failure_count: usize,
    wall_time_ms: u64,
    throughput_rps: String,
}

impl<'a> From<&'a TrialResult> for CsvRow<'a> {
    fn from(r: &'a TrialResult) -> Self {
        Self {
            model: r.config.workload_id(),
            concurrency: r.config.concurrency(),
            cpu_load_pct: r.peak_resources.cpu_load,
            memory_used_pct: r.peak_resources.memory_used_pct,
            gpu_load_pct: r.peak_resources.accelerator_load,
            gpu_memory_used_mb: r.peak_resources.accelerator_memory_used,
            samples_collected: r.samples_collected,
            avg_latency_ms: r.avg_latency_ms,
            max_latency_ms: r.max_latency_ms,
            min_latency_ms: r.min_latency_ms,
            p50_latency_ms: r.percentiles.p50_ms,
            p95_latency_ms: r.percentiles.p95_ms,
            p99_latency_ms: r.percentiles.p99_ms,
            success_rate_pct: r.success_rate_pct,
            total_requests: r.total_requests,
            success_count: r.success_count,
            failure_count: r.failure_count(),
            wall_time_ms: u64::try_from(r.wall_time.as_millis()).unwrap_or(u64::MAX),
            throughput_rps: format!("{:.3}", r.throughput_rps()),
        }
    }
}

/// Writes one CSV row per trial to a file.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn write(&self, results: &[TrialResult]) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_path(&self.path)?;
        for r in results {
            writer.serialize(CsvRow::from(r))?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl ResultSink for CsvSink {
    fn consume(&mut self, results: &[TrialResult]) -> Result<(), HarnessError> {
        self.write(results).map_err(|e| {
            HarnessError::Sink(format!("Unable to write {}: {e}", self.path.display()))
        })?;
        info!("Wrote {} trial(s) to {}", results.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadmatrix_common::{LatencyPercentiles, ResourceSample, TrialConfig};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn result(model: &str, concurrency: usize) -> TrialResult {
        TrialResult {
            config: TrialConfig::new(model, concurrency).unwrap(),
            peak_resources: ResourceSample {
                cpu_load: 55.25,
                memory_used_pct: 40.0,
                accelerator_load: 97.0,
                accelerator_memory_used: 6144.0,
            },
            samples_collected: 30,
            avg_latency_ms: 1500.0,
            max_latency_ms: 2500.0,
            min_latency_ms: 800.0,
            percentiles: LatencyPercentiles {
                p50_ms: 1400.0,
                p95_ms: 2400.0,
                p99_ms: 2500.0,
            },
            success_rate_pct: 75.0,
            total_requests: 20,
            success_count: 15,
            wall_time: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_table_has_one_row_per_trial() {
        let mut out = vec![];
        TableSink::new(&mut out)
            .consume(&[result("deepseek-r1:7b", 1), result("deepseek-r1:7b", 2)])
            .unwrap();
        let table = String::from_utf8(out).unwrap();
        assert!(table.contains("GPU Mem (MB)"));
        assert!(table.contains("6144"));
        assert!(table.contains("55.2") || table.contains("55.3"));
        assert_eq!(table.matches("deepseek-r1:7b").count(), 2);
    }

    #[test]
    fn test_csv_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let mut sink = CsvSink::new(&path);
        sink.consume(&[result("a", 1), result("b", 4)]).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 19);
        assert_eq!(&headers[0], "model");
        assert_eq!(&headers[18], "throughput_rps");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "a");
        assert_eq!(&rows[1][0], "b");
        assert_eq!(&rows[1][1], "4");
        assert_eq!(&rows[0][16], "5");
        assert_eq!(&rows[0][17], "30000");
        assert_eq!(&rows[0][18], "0.667");
    }

    #[test]
    fn test_csv_unwritable_path_is_a_sink_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvSink::new(dir.path().join("missing").join("results.csv"));
        assert!(matches!(
            sink.consume(&[result("a", 1)]),
            Err(HarnessError::Sink(_))
        ));
    }
}
