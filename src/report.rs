use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::models::CheckResult;

/// Collects results in execution order while a run is in progress.
#[derive(Debug, Default)]
pub struct Aggregator {
    results: Vec<CheckResult>,
    any_unreachable: bool,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, result: CheckResult) {
        self.any_unreachable |= !result.reachable();
        self.results.push(result);
    }

    pub fn finalize(self) -> Report {
        Report {
            results: self.results,
            any_unreachable: self.any_unreachable,
        }
    }
}

/// Finished transcript of one run.
#[derive(Debug, Clone, Default)]
pub struct Report {
    results: Vec<CheckResult>,
    any_unreachable: bool,
}

impl Report {
    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    pub fn any_unreachable(&self) -> bool {
        self.any_unreachable
    }

    pub fn unreachable_count(&self) -> usize {
        self.results.iter().filter(|r| !r.reachable()).count()
    }

    /// 0 when every check was reachable, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        u8::from(self.any_unreachable)
    }

    pub fn to_output(&self) -> OutputDocument {
        OutputDocument {
            checks: self
                .results
                .iter()
                .map(|r| CheckOutput {
                    number: r.id.clone(),
                    resource: r.target.clone(),
                    available: r.reachable().to_string(),
                    elapsed: format_duration(r.elapsed),
                })
                .collect(),
        }
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.to_output())
            .context("Failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

/// Shape of `output.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDocument {
    pub checks: Vec<CheckOutput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutput {
    pub number: String,
    pub resource: String,
    /// `"true"` when the check was reachable.
    pub available: String,
    pub elapsed: String,
}

/// Renders a duration the way Go's `time.Duration` prints: `0s`, `850ns`,
/// `12.5µs`, `52.123ms`, `1.5s`, `2m3s`, `1h0m0.25s`.
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".into();
    }
    if nanos < 1_000 {
        return format!("{}ns", nanos);
    }
    if nanos < 1_000_000 {
        return format!("{}µs", decimal(nanos, 1_000));
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", decimal(nanos, 1_000_000));
    }

    let total_secs = d.as_secs();
    let (hours, minutes) = (total_secs / 3600, (total_secs / 60) % 60);
    let seconds = decimal(
        u128::from(total_secs % 60) * 1_000_000_000 + u128::from(d.subsec_nanos()),
        1_000_000_000,
    );
    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

fn decimal(value: u128, unit: u128) -> String {
    let (whole, frac) = (value / unit, value % unit);
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", frac, width = unit.ilog10() as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Failure, Protocol};

    fn result(id: &str, failure: Option<Failure>) -> CheckResult {
        CheckResult {
            id: id.into(),
            protocol: Protocol::Http,
            target: format!("http://svc.test/{}", id),
            elapsed: Duration::from_millis(12),
            failure,
            body: None,
        }
    }

    fn down() -> Option<Failure> {
        Some(Failure::Transport("connection refused".into()))
    }

    #[test]
    fn empty_run_is_healthy() {
        let report = Aggregator::new().finalize();
        assert!(report.results().is_empty());
        assert!(!report.any_unreachable());
        assert_eq!(report.exit_code(), 0);
        assert!(report.to_output().checks.is_empty());
    }

    #[test]
    fn keeps_execution_order() {
        let mut agg = Aggregator::new();
        for id in ["2.0", "1.0", "1.1", "1.0"] {
            agg.append(result(id, None));
        }
        let report = agg.finalize();
        let ids: Vec<_> = report.results().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["2.0", "1.0", "1.1", "1.0"]);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn any_unreachable_sticks() {
        let mut agg = Aggregator::new();
        agg.append(result("1.0", None));
        agg.append(result("1.1", down()));
        agg.append(result("1.2", None));
        let report = agg.finalize();
        assert!(report.any_unreachable());
        assert_eq!(report.unreachable_count(), 1);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn output_round_trips() {
        let mut agg = Aggregator::new();
        agg.append(result("1.0", None));
        agg.append(result("1.1", down()));
        let report = agg.finalize();

        let json = serde_json::to_string_pretty(&report.to_output()).unwrap();
        let parsed: OutputDocument = serde_json::from_str(&json).unwrap();

        let tuples: Vec<_> = parsed
            .checks
            .iter()
            .map(|c| (c.number.as_str(), c.resource.as_str(), c.available.as_str(), c.elapsed.as_str()))
            .collect();
        assert_eq!(
            tuples,
            [
                ("1.0", "http://svc.test/1.0", "true", "12ms"),
                ("1.1", "http://svc.test/1.1", "false", "12ms"),
            ]
        );
    }

    #[test]
    fn output_field_names() {
        let mut agg = Aggregator::new();
        agg.append(result("1.0", None));
        let value = serde_json::to_value(agg.finalize().to_output()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "checks": [{
                    "number": "1.0",
                    "resource": "http://svc.test/1.0",
                    "available": "true",
                    "elapsed": "12ms"
                }]
            })
        );
    }

    #[test]
    fn write_json_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.json");
        Aggregator::new().finalize().write_json(&path).unwrap();
        let parsed: OutputDocument =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(parsed.checks.is_empty());
    }

    #[test]
    fn go_style_durations() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_nanos(850)), "850ns");
        assert_eq!(format_duration(Duration::from_nanos(12_500)), "12.5µs");
        assert_eq!(format_duration(Duration::from_micros(52_123)), "52.123ms");
        assert_eq!(format_duration(Duration::from_nanos(1_000_001)), "1.000001ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(123)), "2m3s");
        assert_eq!(format_duration(Duration::from_millis(3_600_250)), "1h0m0.25s");
    }
}
