//! Immutable session configuration.
//!
//! A `SessionConfig` is built once (by the CLI or a test) and handed to the
//! session at construction. Nothing mutates it afterwards.

use std::fmt;
use std::str::FromStr;

/// Default STOMP broker address.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:61613";
/// Default login and passcode.
pub const DEFAULT_CREDENTIAL: &str = "guest";

/// Kind of destination a frame is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Domain {
    #[default]
    Queue,
    Topic,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Queue => "queue",
            Domain::Topic => "topic",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a `Domain` or building a `Destination`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown domain '{0}': expected 'queue' or 'topic'")]
    UnknownDomain(String),
    #[error("destination name must not be empty")]
    EmptyDestination,
    #[error("message count must be at least 1")]
    ZeroCount,
}

impl FromStr for Domain {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "queue" => Ok(Domain::Queue),
            "topic" => Ok(Domain::Topic),
            _ => Err(ConfigError::UnknownDomain(s.to_string())),
        }
    }
}

/// A named queue or topic, rendered on the wire as `/<domain>/<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    domain: Domain,
    name: String,
}

impl Destination {
    pub fn new(domain: Domain, name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::EmptyDestination);
        }
        Ok(Self { domain, name })
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.domain, self.name)
    }
}

/// What a session does between CONNECT and DISCONNECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Send `body` `count` times, each with its own receipt header.
    Send { body: String, count: usize },
    /// Subscribe and print replies until cancelled or the stream ends.
    Receive,
}

impl Mode {
    /// Send mode, rejecting a zero count.
    pub fn send(body: impl Into<String>, count: usize) -> Result<Self, ConfigError> {
        if count == 0 {
            return Err(ConfigError::ZeroCount);
        }
        Ok(Mode::Send {
            body: body.into(),
            count,
        })
    }
}

/// Connection settings for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Broker address (host:port).
    pub address: String,
    pub login: String,
    pub passcode: String,
    pub destination: Destination,
}

impl SessionConfig {
    /// Config for `destination` with the default address and credentials.
    pub fn new(destination: Destination) -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            login: DEFAULT_CREDENTIAL.to_string(),
            passcode: DEFAULT_CREDENTIAL.to_string(),
            destination,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_credentials(mut self, login: impl Into<String>, passcode: impl Into<String>) -> Self {
        self.login = login.into();
        self.passcode = passcode.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_parses_case_insensitively() {
        assert_eq!("queue".parse::<Domain>().unwrap(), Domain::Queue);
        assert_eq!("TOPIC".parse::<Domain>().unwrap(), Domain::Topic);
        assert_eq!(
            "exchange".parse::<Domain>(),
            Err(ConfigError::UnknownDomain("exchange".to_string()))
        );
    }

    #[test]
    fn destination_renders_domain_prefix() {
        let d = Destination::new(Domain::Topic, "prices").unwrap();
        assert_eq!(d.to_string(), "/topic/prices");
        assert_eq!(d.name(), "prices");
        assert_eq!(d.domain(), Domain::Topic);
    }

    #[test]
    fn empty_destination_rejected() {
        assert_eq!(
            Destination::new(Domain::Queue, ""),
            Err(ConfigError::EmptyDestination)
        );
    }

    #[test]
    fn send_mode_requires_positive_count() {
        assert_eq!(Mode::send("x", 0), Err(ConfigError::ZeroCount));
        assert_eq!(
            Mode::send("x", 2).unwrap(),
            Mode::Send {
                body: "x".to_string(),
                count: 2
            }
        );
    }

    #[test]
    fn config_defaults_and_overrides() {
        let dest = Destination::new(Domain::Queue, "q").unwrap();
        let cfg = SessionConfig::new(dest.clone());
        assert_eq!(cfg.address, DEFAULT_ADDRESS);
        assert_eq!(cfg.login, "guest");

        let cfg = cfg
            .with_address("broker:7672")
            .with_credentials("admin", "admin");
        assert_eq!(cfg.address, "broker:7672");
        assert_eq!(cfg.passcode, "admin");
        assert_eq!(cfg.destination, dest);
    }
}
