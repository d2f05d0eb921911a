//! Library half of the `manifold` CLI.
//!
//! Holds descriptor loading and command-line overrides so they can be tested
//! without spawning the binary.

pub mod config;
