use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::models::{CheckDefinition, CheckKind, HttpCheck, Settings, TcpCheck};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("check {number:?} is invalid: {source}")]
    InvalidCheck {
        number: String,
        #[source]
        source: DefinitionError,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum DefinitionError {
    #[error("both `url` and `tcp` are set")]
    Ambiguous,
    #[error("HTTP check has no `verbo` (method)")]
    MissingMethod,
    #[error("TCP check has no `port`")]
    MissingPort,
    #[error("`url` {0:?} is not an http:// or https:// URL")]
    UnsupportedUrl(String),
}

/// Document as written on disk.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitorConfig {
    #[serde(default)]
    pub insecure: bool,
    #[serde(default)]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default = "default_tcp_timeout_ms")]
    pub tcp_timeout_ms: u64,
    #[serde(default)]
    pub checks: Vec<CheckEntry>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CheckEntry {
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub url: String,
    pub status_code: Option<u16>,
    #[serde(rename = "match")]
    pub match_body: Option<String>,
    pub response_time: Option<u64>,
    #[serde(default)]
    pub tcp: String,
    pub port: Option<u16>,
    #[serde(default)]
    pub payload: String,
    pub verbo: Option<String>,
}

pub fn default_tcp_timeout_ms() -> u64 { 3500 }

impl CheckEntry {
    /// `Ok(None)` for entries that name neither a URL nor a TCP host.
    pub fn into_definition(self) -> Result<Option<CheckDefinition>, DefinitionError> {
        let kind = match (self.url.is_empty(), self.tcp.is_empty()) {
            (true, true) => return Ok(None),
            (false, false) => return Err(DefinitionError::Ambiguous),
            (false, true) if !is_http_url(&self.url) => {
                return Err(DefinitionError::UnsupportedUrl(self.url))
            }
            (false, true) => CheckKind::Http(HttpCheck {
                url: self.url,
                method: self.verbo.ok_or(DefinitionError::MissingMethod)?,
                payload: self.payload,
                expected_status: self.status_code,
                expected_body: self.match_body,
                max_response_time_ms: self.response_time,
            }),
            (true, false) => CheckKind::Tcp(TcpCheck {
                host: self.tcp,
                port: self.port.ok_or(DefinitionError::MissingPort)?,
                max_response_time_ms: self.response_time,
            }),
        };
        Ok(Some(CheckDefinition { id: self.number, kind }))
    }
}

fn is_http_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

impl MonitorConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn settings(&self) -> Settings {
        Settings {
            insecure_tls: self.insecure,
            request_timeout: (self.timeout_seconds > 0)
                .then(|| Duration::from_secs(self.timeout_seconds)),
            verbose: self.verbose,
            tcp_connect_timeout: Duration::from_millis(self.tcp_timeout_ms),
        }
    }

    /// Typed definitions in file order. Shapeless entries are dropped.
    pub fn definitions(&self) -> Result<Vec<CheckDefinition>, ConfigError> {
        let mut definitions = Vec::with_capacity(self.checks.len());
        for (index, entry) in self.checks.iter().enumerate() {
            let number = entry.number.clone();
            match entry.clone().into_definition() {
                Ok(Some(definition)) => definitions.push(definition),
                Ok(None) => warn!("Skipping check #{} ({:?}): no `url` or `tcp` target", index, number),
                Err(source) => return Err(ConfigError::InvalidCheck { number, source }),
            }
        }
        Ok(definitions)
    }
}
