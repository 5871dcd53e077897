//! Source code verification against a block explorer.

use {
    crate::domain::{deployment::Contract, eth},
    network::Explorer,
    thiserror::Error,
};

mod dto;
pub mod etherscan;

pub use self::etherscan::Etherscan;

/// What to verify and where.
#[derive(Clone, Debug)]
pub struct Request {
    pub explorer: Explorer,
    pub api_key: String,
    pub address: eth::Address,
    pub contract: Contract,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Verified {
    /// The explorer accepted the submitted source.
    Now,
    /// The explorer already knew the source of this contract.
    Already,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Verifier: Send + Sync {
    async fn verify_source(&self, request: &Request) -> Result<Verified, Error>;
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("verification unavailable: {0}")]
    Unavailable(String),
    #[error("explorer rejected the source: {0}")]
    Failed(String),
    #[error("explorer did not finish verifying in time")]
    Timeout,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
