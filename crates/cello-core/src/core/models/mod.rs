//! Typed views of the Cello documents this library reads or rewrites.

pub mod netlist;
pub mod sensors;
