//! # gom - Go Manager
//!
//! gom bundles the Go packages a project depends on into a per-project
//! vendor directory and runs the Go toolchain against it.
//!
//! ## Features
//!
//! - **Gomfile**: a small declarative manifest with groups and platform filters
//! - **Pinning**: `:commit`, `:tag` or `:branch` checked out through git, hg or bzr
//! - **Staleness gate**: builds refuse to run against out-of-date vendored code
//! - **Lock file**: `Gomfile.lock` records the revisions actually vendored
//!
//! ## Quick Start
//!
//! ```bash
//! # Vendor everything listed in ./Gomfile
//! gom install
//!
//! # Build and test against the vendored packages
//! gom build
//! gom test
//! ```
//!
//! ## Module Organization
//!
//! - [`manifest`] - Gomfile parsing and rendering
//! - [`filter`] - environment and platform selection
//! - [`staleness`] - vendored revision checks
//! - [`orchestrator`] - install and gated command sequencing

/// `.travis.yml` generation.
pub mod ci;

/// Per-invocation settings.
pub mod config;

/// Error taxonomy.
pub mod error;

/// Environment group and platform filtering.
pub mod filter;

/// `Gomfile.lock` generation.
pub mod lock;

/// Gomfile data model, parser and writer.
pub mod manifest;

/// Install, build and gated command sequencing.
pub mod orchestrator;

/// Staleness gate for vendored checkouts.
pub mod staleness;

/// Delegated process invocations.
pub mod toolchain;

/// Version-control backends.
pub mod vcs;

/// Vendor directory layout.
pub mod vendor;
