//! Shared DTOs (schemas-as-code) for the manifold workspace.
//!
//! # Design constraints
//! - Lockfiles and reports are serialized to disk and read back by later runs.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod coordinate;
pub mod lock;
pub mod report;
pub mod scope;

pub use coordinate::{Coordinate, CoordinateError, ModuleId};
pub use scope::{Classpath, Scope};

/// Schema identifiers.
pub mod schema {
    pub const MANIFOLD_LOCK_V1: &str = "manifold.lock.v1";
    pub const MANIFOLD_REPORT_V1: &str = "manifold.report.v1";
}
