//! Embeddable core library for manifold.
//!
//! Provides a clap-free, I/O-abstracted entry point for running the
//! resolve, compile, generate and test phases of a build.
//!
//! # Ports
//!
//! - [`WritePort`](ports::WritePort) writes lockfiles, sources and reports
//! - [`ArtifactSource`] supplies module metadata to the resolver
//! - [`ProcessLauncher`] runs the toolchain probe, compile command and tests
//!
//! The [`adapters`] module provides the filesystem-backed defaults.
//!
//! # Entry points
//!
//! - [`run_build`](pipeline::run_build) runs the selected phases and returns a report
//! - [`resolve_phase`](pipeline::resolve_phase), [`compile_phase`](pipeline::compile_phase),
//!   [`generate_phase`](pipeline::generate_phase) and [`test_phase`](pipeline::test_phase)
//!   run a single phase

pub mod adapters;
mod error;
pub mod pipeline;
pub mod ports;
pub mod settings;

pub use error::{BuildError, PhaseError};

// Re-exported so embedders don't need the phase crates directly.
pub use manifold_resolve::ArtifactSource;
pub use manifold_testrun::{EngineRegistry, ProcessLauncher, SystemLauncher};
pub use manifold_types::report::{BuildReport, Phase, ToolInfo};
