use {
    network::{AccountRef, ChainId, PrivateKey},
    serde::Deserialize,
    std::collections::{BTreeMap, HashMap},
    url::Url,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Target networks by name.
    #[serde(default)]
    pub networks: BTreeMap<String, Network>,

    /// Roles and the accounts they use.
    #[serde(default)]
    pub named_accounts: BTreeMap<String, NamedAccount>,

    /// Source verification settings.
    #[serde(default)]
    pub etherscan: Etherscan,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Network {
    pub chain_id: ChainId,

    /// JSON-RPC endpoint. Without one, deployments go to an ephemeral local
    /// node.
    pub url: Option<Url>,

    /// Signing keys, role indices point into this list.
    #[serde(default)]
    pub accounts: Vec<PrivateKey>,

    /// Blocks to wait for on top of the inclusion block. Defaults to 0 for
    /// local networks and 1 otherwise.
    pub block_confirmations: Option<u64>,

    /// Etherscan compatible API used for source verification.
    pub explorer_api_url: Option<Url>,

    /// Browser URL of the explorer.
    pub explorer_url: Option<Url>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct NamedAccount {
    pub default: usize,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Per chain accounts replacing the default.
    #[serde(default)]
    pub overrides: HashMap<ChainId, AccountRef>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Etherscan {
    pub api_key: Option<String>,
}
