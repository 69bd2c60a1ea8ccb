// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Sink capabilities handed to pipelines and collectors so they never
//! import the agent root (§9 "Cyclic dependency agent↔collector").

mod sink;

pub use sink::{BlobSink, MetadataSetter};
