// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # CLI
//!
//! Flags are the agent's sole configuration surface (§6). `Cli::parse()`
//! builds the raw `clap` struct; [`Cli::validate`] applies the
//! cross-field rules clap's derive can't express and produces a
//! [`ValidatedCli`] that the rest of the process trusts without
//! re-checking.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("at least one of -stdout or -destination must be set")]
    NoOutputTarget,

    #[error("-collection-timeout must be greater than zero")]
    NonPositiveCollectionTimeout,

    #[error("-retrywait must be greater than zero")]
    NonPositiveRetryWait,

    #[error("-destination must be of the form tcp:host:port, got {0:?}")]
    MalformedDestination(String),

    #[error("-chdir path could not be resolved: {0}")]
    UnresolvableChdir(#[source] std::io::Error),
}

/// Raw, unvalidated command-line flags (§6).
#[derive(Debug, Parser)]
#[command(name = "hds-agent", about = "Host telemetry agent")]
pub struct Cli {
    /// Mirror every outbound payload to stdout.
    #[arg(long = "stdout", default_value_t = false)]
    pub stdout: bool,

    /// Working directory; resolved absolute; user-scripts live here.
    #[arg(long = "chdir", default_value = ".")]
    pub chdir: PathBuf,

    /// Collector names to disable, comma-separated; `all` disables all built-ins.
    #[arg(long = "skip", default_value = "")]
    pub skip: String,

    /// Metric cadence in seconds; 0 means run every metric collector once.
    #[arg(long = "frequency", default_value_t = 0)]
    pub frequency: i64,

    /// Per-collector deadline in seconds; must be > 0.
    #[arg(long = "collection-timeout", default_value_t = 30)]
    pub collection_timeout: i64,

    /// `tcp:host:port`, or empty to disable the network transport.
    #[arg(long = "destination", default_value = "")]
    pub destination: String,

    /// Capture ~10s of output, print a summary, then exit.
    #[arg(long = "dry-run", default_value_t = false)]
    pub dry_run: bool,

    /// Pause between reconnect attempts in seconds; must be > 0.
    #[arg(long = "retrywait", default_value_t = 10)]
    pub retrywait: i64,

    /// Total runtime in seconds; 0 means run forever.
    #[arg(long = "duration", default_value_t = 0)]
    pub duration: i64,
}

impl Cli {
    pub fn parse_and_validate() -> Result<ValidatedCli, CliError> {
        let raw = <Cli as Parser>::parse();
        raw.validate()
    }

    pub fn validate(self) -> Result<ValidatedCli, CliError> {
        if !self.stdout && self.destination.trim().is_empty() {
            return Err(CliError::NoOutputTarget);
        }
        if self.collection_timeout <= 0 {
            return Err(CliError::NonPositiveCollectionTimeout);
        }
        if self.retrywait <= 0 {
            return Err(CliError::NonPositiveRetryWait);
        }

        let destination = if self.destination.trim().is_empty() {
            None
        } else {
            Some(parse_tcp_destination(&self.destination)?)
        };

        let chdir = std::fs::canonicalize(&self.chdir).map_err(CliError::UnresolvableChdir)?;

        let skip: Vec<String> = self
            .skip
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();

        Ok(ValidatedCli {
            stdout: self.stdout,
            chdir,
            skip,
            frequency: Duration::from_secs(self.frequency.max(0) as u64),
            collection_timeout: Duration::from_secs(self.collection_timeout as u64),
            destination,
            dry_run: self.dry_run,
            retrywait: Duration::from_secs(self.retrywait as u64),
            duration: Duration::from_secs(self.duration.max(0) as u64),
        })
    }
}

fn parse_tcp_destination(raw: &str) -> Result<(String, u16), CliError> {
    let rest = raw
        .strip_prefix("tcp:")
        .ok_or_else(|| CliError::MalformedDestination(raw.to_string()))?;
    let (host, port) = rest
        .rsplit_once(':')
        .ok_or_else(|| CliError::MalformedDestination(raw.to_string()))?;
    let port: u16 = port.parse().map_err(|_| CliError::MalformedDestination(raw.to_string()))?;
    if host.is_empty() {
        return Err(CliError::MalformedDestination(raw.to_string()));
    }
    Ok((host.to_string(), port))
}

/// Security- and consistency-checked configuration, trusted for the rest
/// of the process lifetime.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub stdout: bool,
    pub chdir: PathBuf,
    pub skip: Vec<String>,
    pub frequency: Duration,
    pub collection_timeout: Duration,
    pub destination: Option<(String, u16)>,
    pub dry_run: bool,
    pub retrywait: Duration,
    pub duration: Duration,
}

impl ValidatedCli {
    /// `true` if `name` (already lowercased) was passed to `-skip`, or
    /// `-skip=all` was used.
    pub fn is_skipped(&self, name: &str) -> bool {
        self.skip.iter().any(|s| s == "all" || s == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Cli {
        Cli {
            stdout: true,
            chdir: PathBuf::from("."),
            skip: String::new(),
            frequency: 0,
            collection_timeout: 30,
            destination: String::new(),
            dry_run: false,
            retrywait: 10,
            duration: 0,
        }
    }

    #[test]
    fn requires_stdout_or_destination() {
        let mut cli = base();
        cli.stdout = false;
        assert!(matches!(cli.validate(), Err(CliError::NoOutputTarget)));
    }

    #[test]
    fn rejects_nonpositive_collection_timeout() {
        let mut cli = base();
        cli.collection_timeout = 0;
        assert!(matches!(cli.validate(), Err(CliError::NonPositiveCollectionTimeout)));
    }

    #[test]
    fn rejects_nonpositive_retrywait() {
        let mut cli = base();
        cli.retrywait = -1;
        assert!(matches!(cli.validate(), Err(CliError::NonPositiveRetryWait)));
    }

    #[test]
    fn accepts_valid_tcp_destination() {
        let mut cli = base();
        cli.stdout = false;
        cli.destination = "tcp:collector.internal:9000".to_string();
        let validated = cli.validate().unwrap();
        assert_eq!(validated.destination, Some(("collector.internal".to_string(), 9000)));
    }

    #[test]
    fn rejects_malformed_destination() {
        let mut cli = base();
        cli.destination = "collector.internal:9000".to_string();
        assert!(matches!(cli.validate(), Err(CliError::MalformedDestination(_))));
    }

    #[test]
    fn skip_list_is_lowercased_and_trimmed() {
        let mut cli = base();
        cli.skip = " CPU, Memory ,disk".to_string();
        let validated = cli.validate().unwrap();
        assert_eq!(validated.skip, vec!["cpu", "memory", "disk"]);
    }

    #[test]
    fn is_skipped_honors_all() {
        let mut cli = base();
        cli.skip = "all".to_string();
        let validated = cli.validate().unwrap();
        assert!(validated.is_skipped("cpu"));
        assert!(validated.is_skipped("anything"));
    }

    #[test]
    fn is_skipped_matches_individual_name() {
        let mut cli = base();
        cli.skip = "cpu,memory".to_string();
        let validated = cli.validate().unwrap();
        assert!(validated.is_skipped("cpu"));
        assert!(!validated.is_skipped("disk"));
    }
}
