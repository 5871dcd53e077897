use {
    serde::{Deserialize, Deserializer, de},
    std::fmt,
};

/// Protocol level identifier of an EVM chain.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ChainId(pub u64);

impl ChainId {
    pub const GOERLI: Self = Self(5);
    pub const HARDHAT: Self = Self(31337);
    pub const MAINNET: Self = Self(1);
    pub const SEPOLIA: Self = Self(11155111);

    /// Returns a human readable name for well-known chains.
    pub fn known_name(&self) -> Option<&'static str> {
        // You can find a list of available networks by network and chain id here:
        // https://chainid.network/chains.json
        match *self {
            Self::MAINNET => Some("Ethereum / Mainnet"),
            Self::GOERLI => Some("Ethereum / Goerli"),
            Self::SEPOLIA => Some("Ethereum / Sepolia"),
            Self::HARDHAT => Some("Hardhat / Anvil devnet"),
            _ => None,
        }
    }
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ChainIdVisitor;

        impl de::Visitor<'_> for ChainIdVisitor {
            type Value = ChainId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a u64 or a string")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ChainId(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u64::try_from(value)
                    .map(ChainId)
                    .map_err(|_| de::Error::custom("chain id must not be negative"))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value.parse::<u64>().map(ChainId).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_any(ChainIdVisitor)
    }
}
