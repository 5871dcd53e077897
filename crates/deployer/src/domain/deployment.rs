use {
    crate::{domain::eth, infra::observe},
    network::NetworkProfile,
    std::fmt,
};

/// A compiled contract together with its encoded constructor arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct Contract {
    pub name: String,
    /// Constructor arguments as given by the caller.
    pub constructor_args: Vec<String>,
    /// ABI encoding of [`Self::constructor_args`].
    pub encoded_args: eth::Bytes,
    /// Creation bytecode without constructor arguments.
    pub bytecode: eth::Bytes,
    /// Compiler input, required for source verification.
    pub source: Option<Source>,
}

impl Contract {
    /// The data of the contract creation transaction.
    pub fn creation_code(&self) -> eth::Bytes {
        [&self.bytecode[..], &self.encoded_args[..]]
            .concat()
            .into()
    }
}

/// Compiler input the contract was built from.
#[derive(Clone, Debug, PartialEq)]
pub struct Source {
    /// `<source path>:<contract name>`
    pub fully_qualified_name: String,
    /// Full compiler version, e.g. `0.8.17+commit.8df45f5f`.
    pub compiler_version: String,
    /// Solidity standard JSON input.
    pub standard_json_input: serde_json::Value,
}

/// State of a single deployment attempt.
///
/// ```text
/// Pending -> Submitted -> Included -> Confirmed
///                      \-> Rejected  \-> TimedOut
/// ```
///
/// `Rejected` is also reachable from `Pending` when the node refuses the
/// transaction outright, and `TimedOut` from `Submitted` when it is never
/// included.
#[derive(Clone, Debug, PartialEq)]
pub enum State {
    Pending,
    Submitted {
        tx: eth::TxHash,
    },
    Included {
        tx: eth::TxHash,
        block: eth::BlockNo,
        address: eth::Address,
        confirmations: u64,
    },
    Confirmed {
        tx: eth::TxHash,
        block: eth::BlockNo,
        address: eth::Address,
        confirmations: u64,
    },
    Rejected {
        tx: Option<eth::TxHash>,
        reason: String,
    },
    TimedOut {
        tx: eth::TxHash,
        confirmations: Option<u64>,
    },
}

impl State {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Confirmed { .. } | Self::Rejected { .. } | Self::TimedOut { .. }
        )
    }

    /// Confirmations observed so far.
    pub fn confirmations(&self) -> Option<u64> {
        match self {
            Self::Included { confirmations, .. } | Self::Confirmed { confirmations, .. } => {
                Some(*confirmations)
            }
            Self::TimedOut { confirmations, .. } => *confirmations,
            _ => None,
        }
    }

    fn can_become(&self, next: &Self) -> bool {
        match (self, next) {
            (Self::Pending, Self::Submitted { .. } | Self::Rejected { tx: None, .. }) => true,
            (
                Self::Submitted { .. },
                Self::Included { .. } | Self::Rejected { .. } | Self::TimedOut { .. },
            ) => true,
            (
                Self::Included { .. },
                Self::Included { .. } | Self::Confirmed { .. } | Self::TimedOut { .. },
            ) => true,
            _ => false,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Submitted { .. } => "submitted",
            Self::Included { .. } => "included",
            Self::Confirmed { .. } => "confirmed",
            Self::Rejected { .. } => "rejected",
            Self::TimedOut { .. } => "timed out",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tracks one deployment attempt through its [`State`]s.
#[derive(Debug)]
pub struct Deployment {
    contract: String,
    network: String,
    state: State,
}

impl Deployment {
    pub fn new(contract: &Contract, network: &NetworkProfile) -> Self {
        Self {
            contract: contract.name.clone(),
            network: network.name.clone(),
            state: State::Pending,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Moves to the next state. Terminal states are final.
    pub(crate) fn advance(&mut self, next: State) {
        debug_assert!(
            self.state.can_become(&next),
            "invalid deployment transition {} -> {}",
            self.state,
            next
        );
        observe::transition(&self.contract, &self.network, &self.state, &next);
        self.state = next;
    }
}

/// A finished deployment.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub contract: Contract,
    pub network: NetworkProfile,
    pub address: eth::Address,
    pub tx: eth::TxHash,
    /// Block that includes the deployment transaction.
    pub block: eth::BlockNo,
    /// Blocks observed on top of [`Self::block`], at least the network's
    /// required confirmations.
    pub confirmations: u64,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Contract deployed to: {}", self.address)
    }
}
