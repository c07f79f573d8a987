//! Consumer-facing traits
//!
//! These traits define the interface between the meter session and
//! whatever records or displays its samples.

pub mod sink;

pub use sink::SampleSink;
