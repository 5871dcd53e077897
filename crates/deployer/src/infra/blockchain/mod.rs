use {
    crate::domain::eth,
    alloy::{
        network::{Ethereum, EthereumWallet, TransactionBuilder, TransactionBuilderError},
        providers::{DynProvider, Provider, ProviderBuilder},
        rpc::types::TransactionRequest,
        transports::{RpcError, TransportError},
    },
    std::fmt,
    thiserror::Error,
    url::Url,
};

pub mod local;
pub mod wallet;

pub use self::{local::LocalNode, wallet::Accounts};

/// Access to a chain able to create contracts.
///
/// Waiting for confirmations is done by the orchestrator on top of these
/// calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain ID reported by the connected node.
    async fn chain_id(&self) -> Result<eth::ChainId, Error>;

    /// Signs a contract creation transaction with `from` and broadcasts it.
    ///
    /// Fails with [`Error::BroadcastUnknown`] if the transaction was signed
    /// but the node's answer to the broadcast got lost.
    async fn submit(&self, from: eth::Address, code: eth::Bytes) -> Result<eth::TxHash, Error>;

    /// Returns the receipt of a mined transaction, `None` while it is pending.
    async fn receipt(&self, tx: eth::TxHash) -> Result<Option<eth::Receipt>, Error>;

    /// Current block height.
    async fn block_number(&self) -> Result<eth::BlockNo, Error>;
}

/// JSON-RPC connection to an Ethereum node which signs locally with the
/// configured accounts.
pub struct Rpc {
    provider: DynProvider,
    wallet: EthereumWallet,
    url: Url,
}

impl Rpc {
    pub fn new(url: Url, wallet: EthereumWallet) -> Self {
        let provider = ProviderBuilder::new().connect_http(url.clone()).erased();
        Self {
            provider,
            wallet,
            url,
        }
    }
}

impl fmt::Debug for Rpc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Rpc")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl ChainClient for Rpc {
    async fn chain_id(&self) -> Result<eth::ChainId, Error> {
        Ok(self.provider.get_chain_id().await?.into())
    }

    async fn submit(&self, from: eth::Address, code: eth::Bytes) -> Result<eth::TxHash, Error> {
        let mut tx = TransactionRequest::default()
            .with_from(from)
            .with_deploy_code(code);
        let nonce = self
            .provider
            .get_transaction_count(from)
            .pending()
            .await
            .map_err(Error::from_submission)?;
        let chain_id = self
            .provider
            .get_chain_id()
            .await
            .map_err(Error::from_submission)?;
        tx = tx.with_nonce(nonce).with_chain_id(chain_id);
        // A reverting constructor fails the estimate with a node error.
        let gas = self
            .provider
            .estimate_gas(tx.clone())
            .await
            .map_err(Error::from_submission)?;
        let fees = self
            .provider
            .estimate_eip1559_fees()
            .await
            .map_err(Error::from_submission)?;
        let envelope = tx
            .with_gas_limit(gas)
            .with_max_fee_per_gas(fees.max_fee_per_gas)
            .with_max_priority_fee_per_gas(fees.max_priority_fee_per_gas)
            .build(&self.wallet)
            .await
            .map_err(Box::new)?;

        // The hash is known before broadcasting, so a lost answer still
        // leaves something to poll for.
        let hash = *envelope.tx_hash();
        match self.provider.send_tx_envelope(envelope).await {
            Ok(_) => Ok(hash),
            Err(RpcError::ErrorResp(payload)) => Err(Error::Rejected(payload.to_string())),
            Err(err) => Err(Error::BroadcastUnknown {
                tx: hash,
                source: err,
            }),
        }
    }

    async fn receipt(&self, tx: eth::TxHash) -> Result<Option<eth::Receipt>, Error> {
        let receipt = self.provider.get_transaction_receipt(tx).await?;
        Ok(receipt.and_then(|receipt| {
            Some(eth::Receipt {
                block: receipt.block_number?,
                contract_address: receipt.contract_address,
                success: receipt.status(),
            })
        }))
    }

    async fn block_number(&self) -> Result<eth::BlockNo, Error> {
        Ok(self.provider.get_block_number().await?)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// The node refused the transaction, e.g. because of a bad nonce,
    /// insufficient funds or a reverting constructor.
    #[error("transaction rejected by node: {0}")]
    Rejected(String),
    /// The signed transaction was sent but the node's answer was lost. It
    /// may or may not have been accepted.
    #[error("broadcast of transaction {tx} has an unknown outcome: {source}")]
    BroadcastUnknown {
        tx: eth::TxHash,
        #[source]
        source: TransportError,
    },
    #[error("failed to sign transaction: {0}")]
    Signing(#[from] Box<TransactionBuilderError<Ethereum>>),
    #[error("rpc error: {0}")]
    Rpc(#[from] TransportError),
}

impl Error {
    fn from_submission(err: TransportError) -> Self {
        match err {
            RpcError::ErrorResp(payload) => Self::Rejected(payload.to_string()),
            err => Self::Rpc(err),
        }
    }
}
