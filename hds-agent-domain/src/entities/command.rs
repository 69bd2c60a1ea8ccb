// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Server-pushed execute-command request (§3, §4.H).

use serde::Deserialize;

/// One command frame sent by the peer. Field names match the wire format
/// (`Name`, `CmdID`, `FileURL`, `RunCmd`, `RunArgs`) case-sensitively, as
/// documented in §8 scenario S5.
#[derive(Debug, Clone, Deserialize)]
pub struct Command {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "CmdID")]
    pub cmd_id: String,
    #[serde(rename = "FileURL")]
    pub file_url: String,
    #[serde(rename = "RunCmd")]
    pub run_cmd: String,
    #[serde(rename = "RunArgs", default)]
    pub run_args: Vec<String>,
}

impl Command {
    pub fn name(&self) -> CommandName {
        CommandName::parse(&self.name)
    }
}

/// `ExecCommand` is the only command this agent executes. `HTTP`/`HTTPS`
/// are reserved placeholder names that are explicitly rejected, never
/// implemented (§9 open question 4). Anything else is silently skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandName {
    ExecCommand,
    Http,
    Https,
    Other(String),
}

impl CommandName {
    pub fn parse(name: &str) -> Self {
        match name {
            "ExecCommand" => CommandName::ExecCommand,
            "HTTP" => CommandName::Http,
            "HTTPS" => CommandName::Https,
            other => CommandName::Other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exec_command() {
        assert_eq!(CommandName::parse("ExecCommand"), CommandName::ExecCommand);
    }

    #[test]
    fn parses_reserved_http_names() {
        assert_eq!(CommandName::parse("HTTP"), CommandName::Http);
        assert_eq!(CommandName::parse("HTTPS"), CommandName::Https);
    }

    #[test]
    fn unknown_name_is_other() {
        assert_eq!(
            CommandName::parse("Reboot"),
            CommandName::Other("Reboot".to_string())
        );
    }

    #[test]
    fn deserializes_from_wire_json() {
        let json = r#"{"Name":"ExecCommand","CmdID":"c1","FileURL":"http://host/x.tgz","RunCmd":"x/run","RunArgs":["-v"]}"#;
        let cmd: Command = serde_json::from_str(json).unwrap();
        assert_eq!(cmd.name(), CommandName::ExecCommand);
        assert_eq!(cmd.cmd_id, "c1");
        assert_eq!(cmd.run_args, vec!["-v".to_string()]);
    }
}
