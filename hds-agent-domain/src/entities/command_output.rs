// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Captured result of an `ExecCommand` invocation (§4.H), embedded as the
//! `content` of an `execCommand` [`super::Blob`].

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput {
    #[serde(rename = "nodeID")]
    pub node_id: String,
    #[serde(rename = "cmdID")]
    pub cmd_id: String,
    pub file_url: String,
    pub run_cmd: String,
    pub run_args: Vec<String>,
    pub status: CommandStatus,
    pub stdout: String,
    pub stderr: String,
}
