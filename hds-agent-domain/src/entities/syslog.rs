// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! BSD syslog (RFC 3164) formatting for command-status lines (§3, §6).

use chrono::{DateTime, Utc};

/// Syslog facility, restricted to the ones this agent needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyslogFacility {
    /// `user` (RFC 3164 facility code 1), used for command-status reporting.
    User,
}

impl SyslogFacility {
    fn code(self) -> u8 {
        match self {
            SyslogFacility::User => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SyslogSeverity {
    Alert = 1,
    Notice = 5,
}

/// `{tag, hostname, facility, severity, timestamp, message}`.
#[derive(Debug, Clone)]
pub struct SyslogRecord {
    pub tag: String,
    pub hostname: String,
    pub facility: SyslogFacility,
    pub severity: SyslogSeverity,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl SyslogRecord {
    pub fn new(
        tag: impl Into<String>,
        hostname: impl Into<String>,
        severity: SyslogSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            hostname: hostname.into(),
            facility: SyslogFacility::User,
            severity,
            timestamp: Utc::now(),
            message: message.into(),
        }
    }

    /// `<PRI> MMM DD HH:MM:SS HOST TAG[]: MSG`, `PRI = facility*8 + severity`.
    pub fn to_line(&self) -> String {
        let pri = self.facility.code() as u32 * 8 + self.severity as u32;
        format!(
            "<{}> {} {} {}[]: {}",
            pri,
            self.timestamp.format("%b %e %H:%M:%S"),
            self.hostname,
            self.tag,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pri_is_facility_times_8_plus_severity() {
        let rec = SyslogRecord::new("hds-agent", "host1", SyslogSeverity::Notice, "hello");
        let line = rec.to_line();
        // user (1) * 8 + notice (5) = 13
        assert!(line.starts_with("<13>"));
    }

    #[test]
    fn alert_severity_encodes_correctly() {
        let rec = SyslogRecord::new("hds-agent", "host1", SyslogSeverity::Alert, "bad");
        // user (1) * 8 + alert (1) = 9
        assert!(rec.to_line().starts_with("<9>"));
    }

    #[test]
    fn line_contains_hostname_and_tag() {
        let rec = SyslogRecord::new("hds-agent", "myhost", SyslogSeverity::Notice, "msg");
        let line = rec.to_line();
        assert!(line.contains("myhost hds-agent[]: msg"));
    }
}
