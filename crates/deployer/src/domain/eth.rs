//! Ethereum primitives used throughout the deployer.

pub use {
    alloy::primitives::{Address, B256, Bytes, TxHash},
    network::ChainId,
};

/// Height of a block.
pub type BlockNo = u64;

/// Where and how a transaction ended up on chain.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Receipt {
    /// Block that includes the transaction.
    pub block: BlockNo,
    /// Address of the contract created by the transaction, if any.
    pub contract_address: Option<Address>,
    /// `false` if execution reverted.
    pub success: bool,
}
