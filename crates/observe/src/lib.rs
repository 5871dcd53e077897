//! This crate contains the code required to make the deployer observable:
//! initialization of the `tracing` subscriber shared by binaries and tests,
//! and a panic hook that routes panics through the same subscriber.
pub mod config;
pub mod panic_hook;
pub mod tracing;

pub use config::Config;
