//! # Engine Module
//!
//! The stateful layer between the data models in [`crate::core`] and the
//! public workflows: configuration, container invocation and the bookkeeping
//! that keeps one run's artifacts apart from the next.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Validated file names and container settings
//! - **Invocation** ([`invocation`]) - Command assembly and the [`invocation::ContainerRuntime`] seam
//! - **Output Leases** ([`lease`]) - Exclusive claim on an output directory
//! - **Archival** ([`archive`]) - Moving earlier results out of the way
//! - **Progress Monitoring** ([`progress`]) - Phase events and container output forwarding
//! - **Error Handling** ([`error`]) - [`error::CelloError`] and its categories

pub mod archive;
pub mod config;
pub mod error;
pub mod invocation;
pub mod lease;
pub mod progress;
