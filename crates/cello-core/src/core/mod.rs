//! # Core Module
//!
//! Stateless building blocks shared by the rest of the library: the chassis
//! naming convention, typed models of the Cello documents that are read or
//! rewritten on the host side, and the readers for Cello's output artifacts.
//!
//! - **Chassis** ([`chassis`]) - UCF / input / output file triplets and the known chassis table
//! - **Models** ([`models`]) - Input sensor libraries and output netlists
//! - **File I/O** ([`io`]) - Lenient JSON, node tables and artifact discovery

pub mod chassis;
pub mod io;
pub mod models;
