// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Core data model (§3).

mod blob;
mod collector;
mod command;
mod command_output;
mod inventory;
mod metric_result;
mod syslog;

pub use blob::Blob;
pub use collector::{CollectorKind, CollectorMeta, CollectorOrigin, CollectorState, FailureBudget};
pub use command::{Command, CommandName};
pub use command_output::{CommandOutput, CommandStatus};
pub use inventory::InventoryOutcome;
pub use metric_result::MetricResult;
pub use syslog::{SyslogFacility, SyslogRecord, SyslogSeverity};
