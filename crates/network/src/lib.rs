//! Static description of the networks a contract can be deployed to and of the
//! named accounts used while doing so.
//!
//! The [`Registry`] is built once from configuration and is immutable
//! afterwards, so it can be shared freely between concurrent readers.

mod account;
mod chain;
mod profile;
mod registry;

pub use self::{
    account::{AccountRef, Resolution, Role, RoleBinding},
    chain::ChainId,
    profile::{Explorer, NetworkProfile, PrivateKey},
    registry::{Error, Registry},
};
