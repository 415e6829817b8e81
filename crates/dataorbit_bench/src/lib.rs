//! Shared helpers for the DataOrbit benchmarks.

pub mod utils;
