pub mod artifact;
pub mod blockchain;
pub mod cli;
pub mod config;
pub mod explorer;
pub mod observe;

pub use {artifact::Artifact, config::Config};
