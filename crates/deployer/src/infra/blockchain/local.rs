use {
    super::Accounts,
    crate::domain::eth,
    alloy::node_bindings::{Anvil, AnvilInstance, NodeError},
    url::Url,
};

/// Ephemeral development chain owned by the deploying process. The node is
/// shut down when this value is dropped, taking all of its state with it.
pub struct LocalNode {
    instance: AnvilInstance,
}

impl LocalNode {
    /// Starts an `anvil` node with the given chain ID. It mines a block per
    /// transaction and funds the [`Accounts::development`] accounts.
    pub fn spawn(chain_id: eth::ChainId) -> Result<Self, NodeError> {
        let instance = Anvil::new()
            .chain_id(chain_id.0)
            .mnemonic(Accounts::DEV_MNEMONIC)
            .arg("--accounts")
            .arg(Accounts::DEV_ACCOUNTS.to_string())
            .try_spawn()?;
        tracing::debug!(
            %chain_id,
            endpoint = %instance.endpoint(),
            "started local node"
        );
        Ok(Self { instance })
    }

    pub fn endpoint(&self) -> Url {
        self.instance.endpoint_url()
    }
}
