//! Pure data types for nsh: jobs and command results.
//!
//! This crate is a leaf dependency with no async runtime and no I/O, so
//! front ends can display job state without pulling in the kernel.

pub mod job;
pub mod result;

pub use job::*;
pub use result::*;
