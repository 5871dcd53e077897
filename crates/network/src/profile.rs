use {
    crate::ChainId,
    alloy_primitives::B256,
    std::{fmt, str::FromStr},
    url::Url,
};

/// Everything needed to deploy to one target network.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkProfile {
    /// Symbolic name used to select the network, e.g. `goerli`.
    pub name: String,
    pub chain_id: ChainId,
    /// JSON-RPC endpoint. `None` selects an ephemeral local node owned by the
    /// deploying process.
    pub endpoint: Option<Url>,
    /// Keys usable for signing on this network, in configuration order. Empty
    /// for the local network which signs with ephemeral development accounts.
    pub credentials: Vec<PrivateKey>,
    /// Number of blocks that must be mined on top of the inclusion block
    /// before a deployment is final. 0 accepts the deployment on inclusion.
    pub required_confirmations: u64,
    /// Block explorer used for source verification, if any.
    pub explorer: Option<Explorer>,
}

impl NetworkProfile {
    /// Default confirmation count for networks reached over an endpoint.
    pub const DEFAULT_CONFIRMATIONS: u64 = 1;

    /// Whether the network is the ephemeral local one.
    pub fn is_local(&self) -> bool {
        self.endpoint.is_none()
    }

    /// Default confirmation count for a network with or without an endpoint.
    /// Local networks have immediate finality.
    pub fn default_confirmations(endpoint: Option<&Url>) -> u64 {
        match endpoint {
            Some(_) => Self::DEFAULT_CONFIRMATIONS,
            None => 0,
        }
    }
}

impl fmt::Display for NetworkProfile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (chain {})", self.name, self.chain_id)
    }
}

/// Etherscan compatible block explorer integration.
#[derive(Clone, Debug, PartialEq)]
pub struct Explorer {
    /// Endpoint of the explorer's HTTP API.
    pub api_url: Url,
    /// Browser URL, used to print links to verified contracts.
    pub browser_url: Option<Url>,
}

/// A secp256k1 secret key. Never printed.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PrivateKey(pub B256);

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("PrivateKey(SECRET)")
    }
}

impl FromStr for PrivateKey {
    type Err = <B256 as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl<'de> serde::Deserialize<'de> for PrivateKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Not echoing the input because it is a secret.
        let value = String::deserialize(deserializer)?;
        value
            .parse()
            .map_err(|_| serde::de::Error::custom("invalid private key"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_key_is_redacted() {
        let key: PrivateKey = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
            .parse()
            .unwrap();
        assert_eq!(format!("{key:?}"), "PrivateKey(SECRET)");
    }

    #[test]
    fn private_key_accepts_unprefixed_hex() {
        let prefixed: PrivateKey =
            "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"
                .parse()
                .unwrap();
        let bare: PrivateKey = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"
            .parse()
            .unwrap();
        assert_eq!(prefixed, bare);
    }

    #[test]
    fn local_defaults_to_immediate_finality() {
        let url: Url = "http://localhost:8545".parse().unwrap();
        assert_eq!(NetworkProfile::default_confirmations(None), 0);
        assert_eq!(NetworkProfile::default_confirmations(Some(&url)), 1);
    }
}
