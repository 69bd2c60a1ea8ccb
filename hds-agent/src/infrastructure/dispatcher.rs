// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Command dispatcher (§4.H): parses server-pushed frames and, for
//! `ExecCommand`, downloads and runs a command artifact. `HTTP`/`HTTPS`
//! are reserved names that are hard-rejected rather than implemented
//! (§9 open question 4); anything else is silently skipped.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use hds_agent_domain::entities::{Blob, Command, CommandName, CommandOutput, CommandStatus, SyslogSeverity};
use hds_agent_domain::error::AgentError;
use hds_agent_domain::repositories::BlobSink;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as ChildCommand;

use hds_agent_bootstrap::platform::Platform;

use crate::infrastructure::state::AgentState;
use crate::infrastructure::syslog_sink::send_command_status;
use crate::infrastructure::transport::OutboundSink;

/// Parses one line of wire input as a JSON array of [`Command`]s and
/// dispatches each independently; a malformed frame is logged and
/// dropped rather than killing the read loop.
pub struct CommandDispatcher {
    state: Arc<AgentState>,
    platform: Arc<dyn Platform>,
    http: reqwest::Client,
}

impl CommandDispatcher {
    pub fn new(state: Arc<AgentState>, platform: Arc<dyn Platform>) -> Self {
        Self {
            state,
            platform,
            http: reqwest::Client::new(),
        }
    }

    /// Synchronous entry point called from the transport's read loop. Any
    /// work that needs to block or go over the network is spawned onto
    /// its own task so the single read/write loop in [`super::transport::Transport`]
    /// is never stalled by a slow download.
    pub fn dispatch_frame(&self, line: &str, sink: &OutboundSink) {
        if line.trim().is_empty() {
            return;
        }

        let commands: Vec<Command> = match serde_json::from_str(line) {
            Ok(commands) => commands,
            Err(err) => {
                tracing::warn!(error = %err, "failed to parse command frame, dropping");
                return;
            }
        };

        for command in commands {
            self.dispatch_one(command, sink);
        }
    }

    fn dispatch_one(&self, command: Command, sink: &OutboundSink) {
        match command.name() {
            CommandName::Http | CommandName::Https => {
                tracing::warn!(cmd_id = %command.cmd_id, "rejecting reserved HTTP(S) command");
                send_command_status(
                    sink,
                    &self.state.hostname,
                    SyslogSeverity::Alert,
                    &command.name,
                    self.state.node_id.as_str(),
                    &command.cmd_id,
                    "error",
                );
            }
            CommandName::Other(name) => {
                tracing::debug!(%name, cmd_id = %command.cmd_id, "skipping unknown command");
            }
            CommandName::ExecCommand => {
                let state = self.state.clone();
                let platform = self.platform.clone();
                let http = self.http.clone();
                let sink = sink.clone();
                tokio::spawn(async move {
                    run_exec_command(command, state, platform, http, sink).await;
                });
            }
        }
    }
}

async fn run_exec_command(
    command: Command,
    state: Arc<AgentState>,
    platform: Arc<dyn Platform>,
    http: reqwest::Client,
    sink: OutboundSink,
) {
    let hostname = state.hostname.clone();
    let node_id = state.node_id.as_str().to_string();

    send_command_status(
        &sink,
        &hostname,
        SyslogSeverity::Notice,
        &command.name,
        &node_id,
        &command.cmd_id,
        "received",
    );

    match execute(&command, &platform, &http, &sink, &hostname, &node_id).await {
        Ok((stdout, stderr, status)) if status.success() => {
            send_command_status(&sink, &hostname, SyslogSeverity::Notice, &command.name, &node_id, &command.cmd_id, "success");
            emit_output(&sink, &node_id, &command, CommandStatus::Success, stdout, stderr);
        }
        Ok((stdout, stderr, status)) => {
            tracing::warn!(cmd_id = %command.cmd_id, %status, "ExecCommand exited non-zero");
            send_command_status(&sink, &hostname, SyslogSeverity::Alert, &command.name, &node_id, &command.cmd_id, "error");
            let stderr = if stderr.is_empty() { format!("command exited with {status}") } else { stderr };
            emit_output(&sink, &node_id, &command, CommandStatus::Error, stdout, stderr);
        }
        Err(err) => {
            tracing::warn!(cmd_id = %command.cmd_id, error = %err, "ExecCommand failed");
            send_command_status(&sink, &hostname, SyslogSeverity::Alert, &command.name, &node_id, &command.cmd_id, "error");
            emit_output(&sink, &node_id, &command, CommandStatus::Error, String::new(), err.to_string());
        }
    }
}

fn emit_output(sink: &OutboundSink, node_id: &str, command: &Command, status: CommandStatus, stdout: String, stderr: String) {
    let output = CommandOutput {
        node_id: node_id.to_string(),
        cmd_id: command.cmd_id.clone(),
        file_url: command.file_url.clone(),
        run_cmd: command.run_cmd.clone(),
        run_args: command.run_args.clone(),
        status,
        stdout,
        stderr,
    };
    let content = match serde_json::to_value(&output) {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!(error = %err, "failed to encode command output");
            return;
        }
    };
    let node = match hds_agent_domain::value_objects::NodeId::parse(node_id) {
        Ok(node) => node,
        Err(_) => return,
    };
    let blob = Blob::new("execCommand", 0, &node, content);
    sink.try_send_blob(blob);
}

/// Runs the 8-step `ExecCommand` flow (§4.H): download, extract, resolve
/// the run file under the extraction root, chmod, execute.
async fn execute(
    command: &Command,
    platform: &Arc<dyn Platform>,
    http: &reqwest::Client,
    sink: &OutboundSink,
    hostname: &str,
    node_id: &str,
) -> Result<(String, String, std::process::ExitStatus), AgentError> {
    let work_dir = platform.temp_dir().join(format!("hds-agent-cmd-{}", command.cmd_id));
    tokio::fs::create_dir_all(&work_dir).await?;

    let file_name = command
        .file_url
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("artifact")
        .to_string();
    let archive_path = work_dir.join(&file_name);

    send_command_status(sink, hostname, SyslogSeverity::Notice, &command.name, node_id, &command.cmd_id, "downloading");
    download(http, &command.file_url, &archive_path).await?;

    extract(&archive_path, &file_name, &work_dir)?;

    let run_file = resolve_run_file(&work_dir, &command.run_cmd)?;
    platform
        .set_permissions(&run_file, 0o700)
        .map_err(|err| AgentError::Io(err.to_string()))?;

    run(&run_file, &command.run_args).await
}

async fn download(http: &reqwest::Client, url: &str, destination: &Path) -> Result<(), AgentError> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|err| AgentError::Io(format!("download request failed: {err}")))?;

    if response.status().as_u16() != 200 {
        return Err(AgentError::Io(format!("download returned status {}", response.status())));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|err| AgentError::Io(format!("failed to read download body: {err}")))?;

    let mut file = tokio::fs::File::create(destination).await?;
    file.write_all(&bytes).await?;
    Ok(())
}

/// Extracts `archive_path` into `work_dir` based on its suffix. A plain
/// file with no recognized archive suffix is left as-is.
fn extract(archive_path: &Path, file_name: &str, work_dir: &Path) -> Result<(), AgentError> {
    if file_name.ends_with(".tar.gz") || file_name.ends_with(".tgz") || file_name.ends_with(".tar") {
        let file = std::fs::File::open(archive_path)?;
        let reader: Box<dyn std::io::Read> = if file_name.ends_with(".tar") {
            Box::new(file)
        } else {
            Box::new(flate2::read::GzDecoder::new(file))
        };
        let mut archive = tar::Archive::new(reader);
        archive.unpack(work_dir)?;
    } else if file_name.ends_with(".gz") {
        let file = std::fs::File::open(archive_path)?;
        let mut decoder = flate2::read::GzDecoder::new(file);
        let unpacked_name = file_name.trim_end_matches(".gz");
        let mut out = std::fs::File::create(work_dir.join(unpacked_name))?;
        std::io::copy(&mut decoder, &mut out)?;
    }
    Ok(())
}

/// Resolves `run_cmd` relative to `work_dir`, rejecting any path that
/// escapes it (§8 invariant 6).
fn resolve_run_file(work_dir: &Path, run_cmd: &str) -> Result<PathBuf, AgentError> {
    let candidate = work_dir.join(run_cmd);
    let canonical_root = work_dir
        .canonicalize()
        .map_err(|err| AgentError::Io(format!("failed to canonicalize work dir: {err}")))?;
    let canonical_candidate = candidate
        .canonicalize()
        .map_err(|_| AgentError::PathTraversal(format!("runCmd {run_cmd:?} does not exist under extraction root")))?;

    if !canonical_candidate.starts_with(&canonical_root) {
        return Err(AgentError::PathTraversal(format!("runCmd {run_cmd:?} escapes extraction root")));
    }
    Ok(canonical_candidate)
}

/// Captures stdout/stderr regardless of exit status; only a failure to
/// spawn the process at all is an `Err` here (§7 "Command download / exec
/// failure": the caller decides `status` from the exit code, falling back
/// to a synthesized message only when stderr came back empty).
async fn run(run_file: &Path, run_args: &[String]) -> Result<(String, String, std::process::ExitStatus), AgentError> {
    let output = ChildCommand::new(run_file)
        .args(run_args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|err| AgentError::Io(format!("failed to execute {}: {err}", run_file.display())))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    Ok((stdout, stderr, output.status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_run_file_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("inside"), b"ok").unwrap();
        assert!(resolve_run_file(dir.path(), "inside").is_ok());
        assert!(resolve_run_file(dir.path(), "../../etc/passwd").is_err());
    }

    #[test]
    fn extract_leaves_plain_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.sh");
        std::fs::write(&path, b"#!/bin/sh\n").unwrap();
        extract(&path, "run.sh", dir.path()).unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn run_captures_output_on_nonzero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fail.sh");
        std::fs::write(&script, b"#!/bin/sh\necho out; echo err >&2; exit 3\n").unwrap();
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o700)).unwrap();

        let (stdout, stderr, status) = run(&script, &[]).await.unwrap();
        assert!(!status.success());
        assert_eq!(stdout.trim(), "out");
        assert_eq!(stderr.trim(), "err");
    }
}
