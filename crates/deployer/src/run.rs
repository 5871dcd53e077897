#[cfg(unix)]
use tokio::signal::unix::{self, SignalKind};
use {
    crate::{
        domain::{Orchestrator, Record, WaitPolicy},
        infra::{
            Artifact,
            Config,
            blockchain::{self, Accounts, LocalNode},
            cli,
            explorer::Etherscan,
            observe,
        },
    },
    anyhow::Context,
    clap::Parser,
    network::Role,
    std::{future::Future, sync::Arc},
    tokio::{sync::oneshot, task::JoinHandle},
};

/// Entry point of the `deployer` binary. Exits the process with status 1 if
/// the deployment fails.
pub async fn start(args: impl IntoIterator<Item = String>) {
    let dotenv = cli::load_dotenv(None);
    let args = cli::Args::parse_from(args);
    observe::init(&args);
    observe::dotenv_loaded(dotenv.as_deref());
    tracing::info!("running deployer with validated arguments:\n{}", args);
    if let Err(err) = run(args).await {
        tracing::error!(?err, "deployment failed");
        std::process::exit(1);
    }
}

/// Deploys the configured contract and, if requested, verifies its source.
/// Configuration errors surface before any network is contacted.
pub async fn run(args: cli::Args) -> anyhow::Result<Record> {
    let mut config = match &args.config {
        Some(path) => Config::load(path).await?,
        None => Config::builtin()?,
    };
    config.override_network(&args.network, args.rpc_url.clone(), args.private_key);
    let registry = config.registry()?;
    let profile = registry
        .network(&args.network)
        .inspect_err(|_| observe::network_unknown(&args.network, registry.networks()))?
        .clone();
    observe::network_resolved(&profile);

    let deployer_role = Role::deployer();
    let deployer_account = registry
        .role(&deployer_role, profile.chain_id)
        .required(&deployer_role, profile.chain_id)?;
    let accounts = Accounts::for_network(&profile)?;
    let deployer = accounts.resolve(deployer_account)?;
    observe::role_resolved(&deployer_role, &deployer_account, deployer);

    let user_role = Role::user();
    match registry.role(&user_role, profile.chain_id).optional() {
        Some(account) => match accounts.resolve(account) {
            Ok(address) => observe::role_resolved(&user_role, &account, address),
            Err(_) => observe::role_unresolved(&user_role, &profile),
        },
        None => observe::role_unresolved(&user_role, &profile),
    }

    let contract = Artifact::find(&args.artifacts, &args.contract)?
        .contract(&args.constructor_args)
        .with_context(|| format!("invalid constructor arguments for {}", args.contract))?;

    // The local node lives until the end of the run.
    let (endpoint, _node) = match profile.endpoint.clone() {
        Some(endpoint) => (endpoint, None),
        None => {
            let node = LocalNode::spawn(profile.chain_id).context("failed to start local node")?;
            (node.endpoint(), Some(node))
        }
    };
    let wallet = accounts
        .wallet()
        .context("no signing accounts available")?;
    let orchestrator = Orchestrator::new(
        Arc::new(blockchain::Rpc::new(endpoint, wallet)),
        Arc::new(Etherscan::new(reqwest::Client::builder().build()?)),
        WaitPolicy {
            max_wait: args.max_confirmation_wait,
            poll_interval: args.poll_interval,
        },
    );

    let (cancelled, _) = cancel_on(shutdown_signal());
    let record = orchestrator
        .deploy(&contract, &profile, deployer, cancelled)
        .await?;
    orchestrator.report(&record);

    if args.verify {
        let api_key = args
            .etherscan_api_key
            .as_deref()
            .or(config.etherscan_api_key.as_deref());
        match orchestrator.verify(&record, api_key).await {
            Ok(outcome) => tracing::debug!(?outcome, "verification finished"),
            Err(err) => observe::verification_failed(&record, &err),
        }
    }
    Ok(record)
}

/// What became of a shutdown signal.
#[derive(Debug, Eq, PartialEq)]
enum Delivery {
    Cancelled,
    /// The run no longer listened for cancellation.
    Ignored,
}

/// Watches `signal` in the background and resolves the returned future when
/// it fires. Once that future is dropped, which the orchestrator does after
/// submitting, a signal is logged as ignored instead of vanishing.
fn cancel_on(
    signal: impl Future<Output = ()> + Send + 'static,
) -> (impl Future<Output = ()>, JoinHandle<Delivery>) {
    let (sender, receiver) = oneshot::channel();
    let delivery = tokio::spawn(async move {
        signal.await;
        match sender.send(()) {
            Ok(()) => Delivery::Cancelled,
            Err(()) => {
                observe::cancellation_ignored();
                Delivery::Ignored
            }
        }
    });
    let cancelled = async move {
        if receiver.await.is_err() {
            std::future::pending::<()>().await
        }
    };
    (cancelled, delivery)
}

#[cfg(unix)]
async fn shutdown_signal() {
    // Intercept main signals for graceful shutdown.
    let (Ok(mut interrupt), Ok(mut terminate)) = (
        unix::signal(SignalKind::interrupt()),
        unix::signal(SignalKind::terminate()),
    ) else {
        tracing::warn!("failed to install signal handlers, the run cannot be cancelled");
        return std::future::pending().await;
    };
    tokio::select! {
        _ = interrupt.recv() => (),
        _ = terminate.recv() => (),
    };
}

#[cfg(windows)]
async fn shutdown_signal() {
    // We don't support signal handling on Windows.
    std::future::pending().await
}
