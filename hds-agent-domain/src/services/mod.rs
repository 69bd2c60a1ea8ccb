// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Extractor contracts (§4.A). Platform-specific implementations live in
//! `hds-agent::collectors`; this crate only defines the shape.

mod extractor;

pub use extractor::{InventoryExtractor, MetricExtractor};
