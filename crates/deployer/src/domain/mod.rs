//! Deployment logic, independent of how chains and explorers are reached.

pub mod deployment;
pub mod eth;
pub mod orchestrator;

pub use {
    deployment::{Contract, Deployment, Record},
    orchestrator::{Orchestrator, Verification, WaitPolicy},
};
