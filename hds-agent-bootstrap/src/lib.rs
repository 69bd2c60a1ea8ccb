// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap
//!
//! Everything outside the domain/runtime split that the binary needs
//! before it can wire up the registry, scheduler, and transport:
//!
//! - `cli` - flag parsing and validation
//! - `exit_code` - process exit status
//! - `logger` - rotating file/stderr logging
//! - `platform` - the thin Unix syscall surface the agent touches
//! - `shutdown` - cancellation token and grace-period coordination
//! - `signals` - SIGINT/SIGTERM listening

pub mod cli;
pub mod exit_code;
pub mod logger;
pub mod platform;
pub mod shutdown;
pub mod signals;

pub use cli::{Cli, CliError, ValidatedCli};
pub use exit_code::ExitCode;

/// Parses and validates CLI flags. Clap handles `--help`/`--version` and
/// exits the process itself before this returns.
pub fn bootstrap_cli() -> Result<ValidatedCli, CliError> {
    Cli::parse_and_validate()
}
