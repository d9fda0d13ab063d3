//! Runs a declarative list of HTTP and TCP health checks once, in order,
//! and reports whether every target was reachable.

pub mod config;
pub mod console;
pub mod engine;
pub mod models;
pub mod report;

pub use config::{ConfigError, MonitorConfig};
pub use engine::Prober;
pub use models::{CheckDefinition, CheckKind, CheckResult, Failure, Settings};
pub use report::{Aggregator, OutputDocument, Report};
