use {
    crate::{ChainId, NetworkProfile, Resolution, Role, RoleBinding},
    std::collections::{HashMap, hash_map::Entry},
    thiserror::Error,
};

/// Immutable set of deployable networks and account roles.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    networks: Vec<NetworkProfile>,
    roles: HashMap<Role, RoleBinding>,
}

impl Registry {
    /// Builds a registry, rejecting ambiguous configurations: two networks
    /// with the same name or chain ID, or two bindings for the same role.
    pub fn new(
        networks: impl IntoIterator<Item = NetworkProfile>,
        roles: impl IntoIterator<Item = RoleBinding>,
    ) -> Result<Self, Error> {
        let mut by_chain = HashMap::<ChainId, String>::new();
        let mut profiles = Vec::<NetworkProfile>::new();
        for profile in networks {
            if profiles.iter().any(|existing| existing.name == profile.name) {
                return Err(Error::DuplicateNetwork(profile.name));
            }
            match by_chain.entry(profile.chain_id) {
                Entry::Occupied(entry) => {
                    return Err(Error::DuplicateChainId {
                        chain_id: profile.chain_id,
                        first: entry.get().clone(),
                        second: profile.name,
                    });
                }
                Entry::Vacant(entry) => {
                    entry.insert(profile.name.clone());
                }
            }
            profiles.push(profile);
        }

        let mut bindings = HashMap::new();
        for binding in roles {
            match bindings.entry(binding.role.clone()) {
                Entry::Occupied(_) => return Err(Error::DuplicateRole(binding.role)),
                Entry::Vacant(entry) => {
                    entry.insert(binding);
                }
            }
        }

        Ok(Self {
            networks: profiles,
            roles: bindings,
        })
    }

    /// Looks up a network by its symbolic name.
    pub fn network(&self, name: &str) -> Result<&NetworkProfile, Error> {
        self.networks
            .iter()
            .find(|profile| profile.name == name)
            .ok_or_else(|| Error::UnknownNetwork(name.to_owned()))
    }

    /// Resolves the account a role uses on a chain. Roles that are disabled or
    /// not configured at all are [`Resolution::Unresolved`].
    pub fn role(&self, role: &Role, chain_id: ChainId) -> Resolution {
        self.roles
            .get(role)
            .map(|binding| binding.resolve(chain_id))
            .unwrap_or(Resolution::Unresolved)
    }

    pub fn networks(&self) -> impl Iterator<Item = &NetworkProfile> {
        self.networks.iter()
    }

}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown network {0:?}")]
    UnknownNetwork(String),
    #[error("network {0:?} is configured more than once")]
    DuplicateNetwork(String),
    #[error("networks {first:?} and {second:?} share chain id {chain_id}")]
    DuplicateChainId {
        chain_id: ChainId,
        first: String,
        second: String,
    },
    #[error("role {0} is configured more than once")]
    DuplicateRole(Role),
    #[error("role {role} is required but has no account on chain {chain_id}")]
    RoleRequiredButUnresolved { role: Role, chain_id: ChainId },
}
