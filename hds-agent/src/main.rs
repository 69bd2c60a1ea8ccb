// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Entry point: parse flags, initialize logging, then hand off to either
//! `-dry-run` or the normal streaming Agent Root (§4.I, §6).

use hds_agent::application::{dry_run, run_agent};
use hds_agent_bootstrap::platform;
use hds_agent_bootstrap::{logger, Cli, ExitCode};

const EXE_NAME: &str = "hds-agent";

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = match Cli::parse_and_validate() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("{EXE_NAME}: {err}");
            return ExitCode::ConfigError.into();
        }
    };

    let log_dir = platform::create_platform().temp_dir();
    if let Err(err) = logger::init_logging(EXE_NAME, &log_dir, cli.stdout) {
        eprintln!("{EXE_NAME}: failed to initialize logging: {err}");
        return ExitCode::ConfigError.into();
    }

    tracing::info!(?cli, "starting");

    let exit_code = if cli.dry_run { dry_run::run(cli).await } else { run_agent::run(cli).await };

    exit_code.into()
}
