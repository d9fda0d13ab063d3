use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct CheckDefinition {
    /// Dotted ordinal label such as `"1.0"`; the integer prefix names the group.
    pub id: String,
    pub kind: CheckKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckKind {
    Http(HttpCheck),
    Tcp(TcpCheck),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpCheck {
    pub url: String,
    pub method: String,
    pub payload: String,
    pub expected_status: Option<u16>,
    pub expected_body: Option<String>,
    pub max_response_time_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TcpCheck {
    pub host: String,
    pub port: u16,
    pub max_response_time_ms: Option<u64>,
}

impl TcpCheck {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl CheckDefinition {
    /// True for the first check of a group (`"2.0"`, `"3.0"`...).
    pub fn starts_group(&self) -> bool {
        matches!(self.id.split_once('.'), Some((_, "0")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub insecure_tls: bool,
    /// `None` leaves HTTP requests unbounded.
    pub request_timeout: Option<Duration>,
    pub verbose: bool,
    pub tcp_connect_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            insecure_tls: false,
            request_timeout: None,
            verbose: false,
            tcp_connect_timeout: Duration::from_millis(crate::config::default_tcp_timeout_ms()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Tcp,
}

/// Why a check was classified unreachable.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    Transport(String),
    StatusMismatch { expected: u16, actual: u16 },
    BodyMismatch { expected: String },
    TooSlow { limit_ms: u64, elapsed: Duration },
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Transport(msg) => write!(f, "{}", msg),
            Failure::StatusMismatch { expected, actual } => {
                write!(f, "status {} instead of {}", actual, expected)
            }
            Failure::BodyMismatch { expected } => {
                write!(f, "body does not contain {:?}", expected)
            }
            Failure::TooSlow { limit_ms, elapsed } => write!(
                f,
                "elapsed {} instead of {}ms",
                crate::report::format_duration(*elapsed),
                limit_ms
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub id: String,
    pub protocol: Protocol,
    pub target: String,
    pub elapsed: Duration,
    pub failure: Option<Failure>,
    /// Response body truncated for display; only filled in verbose mode.
    pub body: Option<String>,
}

impl CheckResult {
    pub fn reachable(&self) -> bool {
        self.failure.is_none()
    }

    pub fn label(&self) -> String {
        match self.protocol {
            Protocol::Http => self.target.clone(),
            Protocol::Tcp => format!("TCP:{}", self.target),
        }
    }

    pub fn summary(&self) -> String {
        match &self.failure {
            None => format!("{} [OK] {}", self.id, self.label()),
            Some(failure) => format!("{} [NOK] {}: {}", self.id, self.label(), failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tcp(id: &str) -> CheckDefinition {
        CheckDefinition {
            id: id.into(),
            kind: CheckKind::Tcp(TcpCheck {
                host: "db.internal".into(),
                port: 5432,
                max_response_time_ms: None,
            }),
        }
    }

    #[test]
    fn group_start_is_minor_zero() {
        assert!(tcp("1.0").starts_group());
        assert!(tcp("12.0").starts_group());
        assert!(!tcp("1.05").starts_group());
        assert!(!tcp("1.1").starts_group());
        assert!(!tcp("").starts_group());
    }

    #[test]
    fn tcp_address_joins_host_and_port() {
        match tcp("1.0").kind {
            CheckKind::Tcp(check) => assert_eq!(check.address(), "db.internal:5432"),
            other => panic!("expected TCP, got {:?}", other),
        }
    }

    #[test]
    fn summary_lines() {
        let mut result = CheckResult {
            id: "2.1".into(),
            protocol: Protocol::Tcp,
            target: "db.internal:5432".into(),
            elapsed: Duration::from_millis(3),
            failure: None,
            body: None,
        };
        assert!(result.reachable());
        assert_eq!(result.summary(), "2.1 [OK] TCP:db.internal:5432");

        result.failure = Some(Failure::TooSlow {
            limit_ms: 1,
            elapsed: Duration::from_millis(3),
        });
        assert!(!result.reachable());
        assert_eq!(
            result.summary(),
            "2.1 [NOK] TCP:db.internal:5432: elapsed 3ms instead of 1ms"
        );
    }
}
