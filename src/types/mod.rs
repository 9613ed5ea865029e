// ABOUTME: Validated domain types shared across the crate.
// ABOUTME: Node identifiers, inflation multipliers and sanitized remote paths.

mod multiplier;
mod node_id;
mod remote_path;

pub use multiplier::{Multiplier, MultiplierError};
pub use node_id::{NodeId, ParseNodeIdError};
pub use remote_path::{HOME_MARKER, RemotePath, RemotePathError};
