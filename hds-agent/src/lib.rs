// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Host telemetry agent runtime: collector registry, scheduler,
//! pipelines, transport, and the Agent Root that wires them together
//! (§4).

pub mod application;
pub mod infrastructure;
