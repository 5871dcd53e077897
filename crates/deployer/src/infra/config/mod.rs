use {
    network::{ChainId, Explorer, NetworkProfile, PrivateKey, Registry, Role, RoleBinding},
    std::path::{Path, PathBuf},
    thiserror::Error,
    tokio::fs,
    url::Url,
};

mod file;

const DEFAULT: &str = include_str!("../../../default.toml");

/// Networks, named accounts and verification settings of a deployment run.
#[derive(Clone, Debug)]
pub struct Config {
    pub networks: Vec<Network>,
    pub roles: Vec<RoleBinding>,
    pub etherscan_api_key: Option<String>,
}

/// A configured network. Unlike [`NetworkProfile`] the confirmation count
/// may still be unset, its default depends on the final endpoint.
#[derive(Clone, Debug)]
pub struct Network {
    pub name: String,
    pub chain_id: ChainId,
    pub endpoint: Option<Url>,
    pub credentials: Vec<PrivateKey>,
    pub block_confirmations: Option<u64>,
    pub explorer: Option<Explorer>,
}

impl Network {
    pub fn profile(&self) -> NetworkProfile {
        NetworkProfile {
            name: self.name.clone(),
            chain_id: self.chain_id,
            endpoint: self.endpoint.clone(),
            credentials: self.credentials.clone(),
            required_confirmations: self.block_confirmations.unwrap_or_else(|| {
                NetworkProfile::default_confirmations(self.endpoint.as_ref())
            }),
            explorer: self.explorer.clone(),
        }
    }
}

impl Config {
    /// The built-in configuration: a local `hardhat` network, `goerli` and
    /// `sepolia`, with the `deployer` and `user` roles.
    pub fn builtin() -> Result<Self, Error> {
        Self::parse(DEFAULT, Path::new("<built-in>"))
    }

    /// Loads the configuration from a TOML file.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let data = fs::read_to_string(path).await.map_err(|err| Error::Io {
            path: path.to_path_buf(),
            source: err,
        })?;
        Self::parse(&data, path)
    }

    fn parse(data: &str, path: &Path) -> Result<Self, Error> {
        let config: file::Config = toml::de::from_str(data).map_err(|err| {
            // Not printing detailed error by default because it could leak
            // private keys.
            let details = if std::env::var("TOML_TRACE_ERROR").is_ok_and(|v| v == "1") {
                format!("{err:#?}")
            } else {
                "set TOML_TRACE_ERROR=1 to print parsing error but this may leak secrets"
                    .to_string()
            };
            Error::Toml {
                path: path.to_path_buf(),
                details,
            }
        })?;

        let networks = config
            .networks
            .into_iter()
            .map(|(name, network)| Network {
                name,
                chain_id: network.chain_id,
                endpoint: network.url,
                credentials: network.accounts,
                block_confirmations: network.block_confirmations,
                explorer: network.explorer_api_url.map(|api_url| Explorer {
                    api_url,
                    browser_url: network.explorer_url,
                }),
            })
            .collect();
        let roles = config
            .named_accounts
            .into_iter()
            .map(|(role, account)| RoleBinding {
                role: Role::new(role),
                default_index: account.default,
                overrides: account.overrides,
                enabled: account.enabled,
            })
            .collect();

        Ok(Self {
            networks,
            roles,
            etherscan_api_key: config.etherscan.api_key,
        })
    }

    /// Points the network `name` at another endpoint and adds a signing key
    /// to it. Unknown names are left for the registry to report. Unless the
    /// configuration sets one, the confirmation count follows the new
    /// endpoint.
    pub fn override_network(
        &mut self,
        name: &str,
        endpoint: Option<Url>,
        private_key: Option<PrivateKey>,
    ) {
        let Some(network) = self.networks.iter_mut().find(|n| n.name == name) else {
            return;
        };
        if let Some(endpoint) = endpoint {
            network.endpoint = Some(endpoint);
        }
        network.credentials.extend(private_key);
    }

    pub fn registry(&self) -> Result<Registry, network::Error> {
        Registry::new(
            self.networks.iter().map(Network::profile),
            self.roles.iter().cloned(),
        )
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path:?}: {details}")]
    Toml { path: PathBuf, details: String },
}
