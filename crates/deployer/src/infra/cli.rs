//! CLI arguments for the `deployer` binary.

use {
    clap::Parser,
    network::PrivateKey,
    std::{
        fmt,
        path::{Path, PathBuf},
        time::Duration,
    },
    url::Url,
};

/// Deploy a compiled contract to one of the configured networks.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// The log filter.
    #[arg(long, env, default_value = "warn,deployer=debug,network=debug")]
    pub log: String,

    /// Events at or above this level are written to stderr instead of
    /// stdout.
    #[arg(long, env)]
    pub stderr_threshold: Option<tracing::Level>,

    /// Log as JSON.
    #[arg(long, env)]
    pub use_json_logs: bool,

    /// Name of the network to deploy to.
    #[arg(long, env, default_value = "hardhat")]
    pub network: String,

    /// Path to a TOML file describing networks and named accounts. The
    /// built-in networks are used if omitted.
    #[arg(long, env)]
    pub config: Option<PathBuf>,

    /// Directory containing the Hardhat compilation artifacts.
    #[arg(long, env, default_value = "artifacts")]
    pub artifacts: PathBuf,

    /// Name of the contract to deploy.
    #[arg(long, env, default_value = "Election")]
    pub contract: String,

    /// Constructor arguments, coerced to the constructor's ABI types.
    #[arg(long, env, value_delimiter = ',')]
    pub constructor_args: Vec<String>,

    /// Overrides the JSON-RPC endpoint of the selected network.
    #[arg(long, env, hide_env_values = true)]
    pub rpc_url: Option<Url>,

    /// Adds a signing key to the selected network.
    #[arg(long, env, hide_env_values = true)]
    pub private_key: Option<PrivateKey>,

    /// API key of the network's block explorer. Takes precedence over the
    /// key from the configuration file.
    #[arg(long, env, hide_env_values = true)]
    pub etherscan_api_key: Option<String>,

    /// Verify the contract source on the network's block explorer after
    /// deploying.
    #[arg(long, env)]
    pub verify: bool,

    /// Maximum time to wait for the deployment to be confirmed.
    #[arg(long, env, default_value = "10m", value_parser = humantime::parse_duration)]
    pub max_confirmation_wait: Duration,

    /// How often to poll the node while waiting for confirmations.
    #[arg(long, env, default_value = "2s", value_parser = humantime::parse_duration)]
    pub poll_interval: Duration,
}

/// Exports the variables of a `.env` file so they act as argument fallbacks.
/// Without `path` the file is searched for in the working directory and its
/// parents. Variables that are already set are left alone. Returns the file
/// that was loaded.
pub fn load_dotenv(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(path) => dotenv::from_path(path).ok().map(|()| path.to_path_buf()),
        None => dotenv::dotenv().ok(),
    }
}

impl fmt::Display for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = |set: bool| if set { "SECRET" } else { "None" };

        writeln!(f, "log: {}", self.log)?;
        writeln!(f, "stderr_threshold: {:?}", self.stderr_threshold)?;
        writeln!(f, "use_json_logs: {}", self.use_json_logs)?;
        writeln!(f, "network: {}", self.network)?;
        writeln!(f, "config: {:?}", self.config)?;
        writeln!(f, "artifacts: {:?}", self.artifacts)?;
        writeln!(f, "contract: {}", self.contract)?;
        writeln!(f, "constructor_args: {:?}", self.constructor_args)?;
        // Endpoints commonly embed API keys.
        writeln!(f, "rpc_url: {}", secret(self.rpc_url.is_some()))?;
        writeln!(f, "private_key: {}", secret(self.private_key.is_some()))?;
        writeln!(
            f,
            "etherscan_api_key: {}",
            secret(self.etherscan_api_key.is_some())
        )?;
        writeln!(f, "verify: {}", self.verify)?;
        writeln!(
            f,
            "max_confirmation_wait: {}",
            humantime::format_duration(self.max_confirmation_wait)
        )?;
        writeln!(
            f,
            "poll_interval: {}",
            humantime::format_duration(self.poll_interval)
        )?;
        Ok(())
    }
}
