use {
    crate::domain::eth,
    alloy::{
        network::EthereumWallet,
        signers::local::{LocalSignerError, MnemonicBuilder, PrivateKeySigner, coins_bip39::English},
    },
    network::{AccountRef, NetworkProfile},
    thiserror::Error,
};

/// Signers available for a network, in configuration order. Role indices
/// point into this list.
#[derive(Clone, Debug)]
pub struct Accounts(Vec<PrivateKeySigner>);

impl Accounts {
    /// Mnemonic of the well-known development accounts used by local nodes.
    pub const DEV_MNEMONIC: &str = "test test test test test test test test test test test junk";
    /// Number of development accounts derived from [`Self::DEV_MNEMONIC`].
    pub const DEV_ACCOUNTS: u32 = 10;

    /// Picks the signers of a network: the ephemeral development accounts for
    /// the local network, the configured credentials otherwise.
    pub fn for_network(profile: &NetworkProfile) -> Result<Self, Error> {
        if profile.is_local() {
            return Self::development();
        }
        if profile.credentials.is_empty() {
            return Err(Error::NoSigningCredentials(profile.name.clone()));
        }
        profile
            .credentials
            .iter()
            .map(|key| PrivateKeySigner::from_bytes(&key.0).map_err(|_| Error::InvalidKey))
            .collect::<Result<_, _>>()
            .map(Self)
    }

    pub fn development() -> Result<Self, Error> {
        (0..Self::DEV_ACCOUNTS)
            .map(|i| {
                MnemonicBuilder::<English>::default()
                    .phrase(Self::DEV_MNEMONIC)
                    .index(i)?
                    .build()
            })
            .collect::<Result<_, _>>()
            .map(Self)
            .map_err(Error::Mnemonic)
    }

    /// Turns an account reference into the address of one of the signers.
    pub fn resolve(&self, account: AccountRef) -> Result<eth::Address, Error> {
        match account {
            AccountRef::Index(index) => self
                .0
                .get(index)
                .map(|signer| signer.address())
                .ok_or(Error::IndexOutOfRange {
                    index,
                    available: self.0.len(),
                }),
            AccountRef::Address(address) => self
                .0
                .iter()
                .any(|signer| signer.address() == address)
                .then_some(address)
                .ok_or(Error::UnknownAddress(address)),
        }
    }

    /// A wallet able to sign for every account, `None` without accounts.
    pub fn wallet(&self) -> Option<EthereumWallet> {
        let mut signers = self.0.iter().cloned();
        let mut wallet = EthereumWallet::new(signers.next()?);
        for signer in signers {
            wallet.register_signer(signer);
        }
        Some(wallet)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("network {0:?} has no signing credentials configured")]
    NoSigningCredentials(String),
    #[error("invalid signing key")]
    InvalidKey,
    #[error("failed to derive development accounts: {0}")]
    Mnemonic(#[source] LocalSignerError),
    #[error("account #{index} requested but only {available} signers are available")]
    IndexOutOfRange { index: usize, available: usize },
    #[error("no signing credential for address {0}")]
    UnknownAddress(eth::Address),
}
