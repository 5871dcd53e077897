use {
    crate::{ChainId, Error},
    alloy_primitives::Address,
    serde::Deserialize,
    std::{collections::HashMap, fmt},
};

/// Name of an account role, e.g. `deployer` or `user`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Role(String);

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn deployer() -> Self {
        Self::new("deployer")
    }

    pub fn user() -> Self {
        Self::new("user")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a concrete account: either an index into the list of locally
/// available signers or an explicit address.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AccountRef {
    Index(usize),
    Address(Address),
}

impl From<Address> for AccountRef {
    fn from(address: Address) -> Self {
        Self::Address(address)
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "account #{index}"),
            Self::Address(address) => write!(f, "{address}"),
        }
    }
}

/// Maps a role to the account it uses on each network.
#[derive(Clone, Debug, PartialEq)]
pub struct RoleBinding {
    pub role: Role,
    /// Index used on every chain without an override.
    pub default_index: usize,
    pub overrides: HashMap<ChainId, AccountRef>,
    /// A disabled binding is kept in configuration but never resolves.
    pub enabled: bool,
}

impl RoleBinding {
    pub fn new(role: Role, default_index: usize) -> Self {
        Self {
            role,
            default_index,
            overrides: Default::default(),
            enabled: true,
        }
    }

    pub fn with_override(mut self, chain_id: ChainId, account: AccountRef) -> Self {
        self.overrides.insert(chain_id, account);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub(crate) fn resolve(&self, chain_id: ChainId) -> Resolution {
        if !self.enabled {
            return Resolution::Unresolved;
        }
        Resolution::Resolved(
            self.overrides
                .get(&chain_id)
                .copied()
                .unwrap_or(AccountRef::Index(self.default_index)),
        )
    }
}

/// Outcome of resolving a role on a network. `Unresolved` is not an error:
/// only callers that need the role turn it into one with
/// [`Resolution::required`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Resolution {
    Resolved(AccountRef),
    Unresolved,
}

impl Resolution {
    pub fn required(self, role: &Role, chain_id: ChainId) -> Result<AccountRef, Error> {
        match self {
            Self::Resolved(account) => Ok(account),
            Self::Unresolved => Err(Error::RoleRequiredButUnresolved {
                role: role.clone(),
                chain_id,
            }),
        }
    }

    pub fn optional(self) -> Option<AccountRef> {
        match self {
            Self::Resolved(account) => Some(account),
            Self::Unresolved => None,
        }
    }
}
