// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Unix process exit codes (§6 "Error handling", §9 signal-handling
//! redesign note).
//!
//! A caught `SIGINT`/`SIGTERM` now drains outbound work within the grace
//! period and exits `0`; only CLI/config validation failures and
//! `-dry-run`'s summary both exit nonzero.

/// Exit status returned from `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Clean shutdown, including a signal-triggered graceful drain.
    Success,
    /// CLI/config validation failed, or the working directory could not
    /// be entered.
    ConfigError,
    /// `-dry-run` completed and printed its summary.
    DryRunComplete,
}

impl ExitCode {
    pub fn as_u8(self) -> u8 {
        match self {
            ExitCode::Success => 0,
            ExitCode::ConfigError => 1,
            ExitCode::DryRunComplete => 1,
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_u8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_zero() {
        assert_eq!(ExitCode::Success.as_u8(), 0);
    }

    #[test]
    fn dry_run_complete_is_one() {
        assert_eq!(ExitCode::DryRunComplete.as_u8(), 1);
    }

    #[test]
    fn config_error_is_one() {
        assert_eq!(ExitCode::ConfigError.as_u8(), 1);
    }
}
