// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Formats command-status syslog lines and enqueues them on the outbound
//! sink (§4.H, §6 "Wire protocol").

use hds_agent_domain::entities::{SyslogRecord, SyslogSeverity};

use crate::infrastructure::transport::OutboundSink;

const TAG: &str = "hds-agent";

/// Sends `<cmdName> <nodeID> <cmdID> <status>` as the syslog message body
/// (§6). `severity` is `Notice` for progress statuses, `Alert` for
/// terminal failures.
pub fn send_command_status(
    sink: &OutboundSink,
    hostname: &str,
    severity: SyslogSeverity,
    cmd_name: &str,
    node_id: &str,
    cmd_id: &str,
    status: &str,
) {
    let record = SyslogRecord::new(TAG, hostname, severity, format!("{cmd_name} {node_id} {cmd_id} {status}"));
    sink.try_send_line(record.to_line());
}
