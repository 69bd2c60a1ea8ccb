// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Small, validated wrapper types used across the domain.

mod digest;
mod frequency;
mod node_id;

pub use digest::Sha1Digest;
pub use frequency::Frequency;
pub use node_id::NodeId;
