use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::models::{
    CheckDefinition, CheckKind, CheckResult, Failure, HttpCheck, Protocol, Settings, TcpCheck,
};
use crate::report::{Aggregator, Report};

pub const BODY_EXCERPT_CHARS: usize = 1000;

pub struct Prober {
    settings: Settings,
    http_client: reqwest::Client,
}

impl Prober {
    pub fn new(settings: Settings) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(settings.insecure_tls);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            settings,
            http_client,
        })
    }

    pub async fn run<F>(&self, checks: &[CheckDefinition], mut observe: F) -> Report
    where
        F: FnMut(&CheckDefinition, &CheckResult),
    {
        info!("Running {} checks", checks.len());
        let mut aggregator = Aggregator::new();

        for check in checks {
            let result = self.execute(check).await;
            observe(check, &result);
            aggregator.append(result);
        }

        let report = aggregator.finalize();
        info!(
            "Run completed: {} reachable, {} unreachable",
            report.results().len() - report.unreachable_count(),
            report.unreachable_count()
        );
        report
    }

    pub async fn execute(&self, check: &CheckDefinition) -> CheckResult {
        let result = match &check.kind {
            CheckKind::Http(http) => self.check_http(&check.id, http).await,
            CheckKind::Tcp(tcp) => self.check_tcp(&check.id, tcp).await,
        };
        debug!(
            id = %result.id,
            target = %result.target,
            reachable = result.reachable(),
            elapsed_ms = result.elapsed.as_secs_f64() * 1000.0,
            "check finished"
        );
        result
    }

    async fn check_http(&self, id: &str, check: &HttpCheck) -> CheckResult {
        let start = Instant::now();
        let fetched = self.fetch(check).await;
        let elapsed = start.elapsed();

        let (failure, body) = match fetched {
            Ok((status, body)) => (
                evaluate_http(check, status, &body, elapsed),
                self.settings.verbose.then(|| excerpt(&body)),
            ),
            Err(msg) => (Some(Failure::Transport(msg)), None),
        };

        CheckResult {
            id: id.to_string(),
            protocol: Protocol::Http,
            target: check.url.clone(),
            elapsed,
            failure,
            body,
        }
    }

    async fn fetch(&self, check: &HttpCheck) -> Result<(u16, String), String> {
        let method = Method::from_bytes(check.method.as_bytes())
            .map_err(|e| format!("Invalid method {:?}: {}", check.method, e))?;

        let mut request = self.http_client.request(method.clone(), &check.url);
        if method == Method::POST {
            request = request.header(CONTENT_TYPE, "application/json");
        }
        if !check.payload.is_empty() {
            request = request.body(check.payload.clone());
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read body: {}", e))?;
        Ok((status, body))
    }

    async fn check_tcp(&self, id: &str, check: &TcpCheck) -> CheckResult {
        let addr = check.address();
        let start = Instant::now();
        let connected = dial(TcpStream::connect(&addr), self.settings.tcp_connect_timeout).await;
        let elapsed = start.elapsed();

        let failure = match connected {
            Ok(()) => exceeds(check.max_response_time_ms, elapsed),
            Err(failure) => Some(failure),
        };

        CheckResult {
            id: id.to_string(),
            protocol: Protocol::Tcp,
            target: addr,
            elapsed,
            failure,
            body: None,
        }
    }
}

/// Predicates in fixed order: status, body, response time. First failure wins.
pub fn evaluate_http(
    check: &HttpCheck,
    status: u16,
    body: &str,
    elapsed: Duration,
) -> Option<Failure> {
    if let Some(expected) = check.expected_status {
        if expected != status {
            return Some(Failure::StatusMismatch {
                expected,
                actual: status,
            });
        }
    }
    if let Some(expected) = &check.expected_body {
        if !body.contains(expected.as_str()) {
            return Some(Failure::BodyMismatch {
                expected: expected.clone(),
            });
        }
    }
    exceeds(check.max_response_time_ms, elapsed)
}

// Connect-time probe only: the stream is dropped as soon as it opens.
async fn dial<F, S>(connect: F, limit: Duration) -> Result<(), Failure>
where
    F: Future<Output = std::io::Result<S>>,
{
    match tokio::time::timeout(limit, connect).await {
        Ok(Ok(stream)) => {
            drop(stream);
            Ok(())
        }
        Ok(Err(e)) => Err(Failure::Transport(format!("Connection failed: {}", e))),
        Err(_) => Err(Failure::Transport(format!(
            "Connect timeout after {}ms",
            limit.as_millis()
        ))),
    }
}

fn exceeds(limit_ms: Option<u64>, elapsed: Duration) -> Option<Failure> {
    let limit_ms = limit_ms?;
    (elapsed > Duration::from_millis(limit_ms)).then_some(Failure::TooSlow { limit_ms, elapsed })
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}
