//! This module implements the observability for the deployer. It exposes
//! functions which represent events that are meaningful to a deployment run.
//! These functions are called when the corresponding events occur and log
//! them.

use {
    crate::{
        domain::{
            deployment::{Record, State},
            eth,
        },
        infra::{blockchain, cli, explorer},
    },
    network::{AccountRef, NetworkProfile, Role},
};

/// Setup the observability from the command line arguments.
pub fn init(args: &cli::Args) {
    observe::tracing::initialize(&observe::Config::new(
        &args.log,
        args.stderr_threshold,
        args.use_json_logs,
    ));
}

/// Observe which `.env` file, if any, contributed to the arguments.
pub fn dotenv_loaded(path: Option<&std::path::Path>) {
    match path {
        Some(path) => tracing::debug!(?path, "loaded environment file"),
        None => tracing::trace!("no environment file found"),
    }
}

/// Observe the network selected for the run.
pub fn network_resolved(profile: &NetworkProfile) {
    tracing::info!(
        network = %profile.name,
        chain_id = %profile.chain_id,
        chain = profile.chain_id.known_name(),
        local = profile.is_local(),
        required_confirmations = profile.required_confirmations,
        "resolved network"
    );
}

/// Observe that the requested network is not configured.
pub fn network_unknown<'a>(name: &str, known: impl Iterator<Item = &'a NetworkProfile>) {
    let known = known.map(|profile| profile.name.as_str()).collect::<Vec<_>>();
    tracing::debug!(network = name, ?known, "unknown network");
}

/// Observe that a role resolved to an account.
pub fn role_resolved(role: &Role, account: &AccountRef, address: eth::Address) {
    tracing::debug!(%role, %account, %address, "resolved role");
}

/// Observe that a role has no account on the selected network.
pub fn role_unresolved(role: &Role, profile: &NetworkProfile) {
    tracing::debug!(%role, network = %profile.name, "role is unresolved");
}

/// Observe a change of the deployment state.
pub fn transition(contract: &str, network: &str, from: &State, to: &State) {
    match to {
        State::Rejected { tx, reason } => {
            tracing::warn!(contract, network, %from, ?tx, %reason, "deployment rejected")
        }
        State::TimedOut { tx, confirmations } => tracing::warn!(
            contract,
            network,
            %from,
            ?tx,
            ?confirmations,
            "deployment timed out"
        ),
        State::Included { confirmations, .. } if matches!(from, State::Included { .. }) => {
            tracing::debug!(contract, network, confirmations, "confirmation progress")
        }
        to => tracing::info!(contract, network, %from, %to, "deployment state changed"),
    }
}

/// Observe that the deployment transaction is about to be broadcast.
pub fn submitting(contract: &str, deployer: eth::Address, code: &eth::Bytes) {
    tracing::debug!(contract, %deployer, code_size = code.len(), "submitting deployment");
}

/// Observe that the node's answer to the broadcast was lost. The deployment
/// is polled for as if it had been accepted.
pub fn broadcast_unknown(tx: eth::TxHash, err: &alloy::transports::TransportError) {
    tracing::warn!(?tx, %err, "broadcast outcome unknown, polling for the transaction");
}

/// Observe that polling the node failed. The wait continues.
pub fn polling_failed(tx: eth::TxHash, err: &blockchain::Error) {
    tracing::warn!(?tx, ?err, "failed to poll deployment status");
}

/// Observe a confirmed deployment.
pub fn deployed(record: &Record) {
    tracing::info!(
        contract = %record.contract.name,
        network = %record.network.name,
        address = %record.address,
        tx = ?record.tx,
        block = record.block,
        confirmations = record.confirmations,
        "contract deployed"
    );
}

/// Observe that the run was cancelled before anything was broadcast.
pub fn cancelled(contract: &str, network: &str) {
    tracing::info!(contract, network, "deployment cancelled before submission");
}

/// Observe a shutdown signal that arrived after the deployment was broadcast.
/// The run continues until the deployment reaches a terminal state.
pub fn cancellation_ignored() {
    tracing::warn!(
        "shutdown signal ignored, a deployment cannot be cancelled once it was broadcast"
    );
}

/// Observe that verification was skipped because no API key is configured.
pub fn verification_skipped(record: &Record) {
    tracing::info!(
        network = %record.network.name,
        "no explorer API key configured, skipping verification"
    );
}

/// Observe that a verification request is being sent.
pub fn verifying(record: &Record) {
    tracing::debug!(
        address = %record.address,
        network = %record.network.name,
        "verifying contract source"
    );
}

/// Observe a successful source verification.
pub fn verified(record: &Record, outcome: explorer::Verified) {
    let link = record
        .network
        .explorer
        .as_ref()
        .and_then(|explorer| explorer.browser_url.as_ref())
        .and_then(|url| url.join(&format!("address/{}#code", record.address)).ok());
    tracing::info!(
        address = %record.address,
        ?outcome,
        link = link.as_ref().map(|url| url.as_str()),
        "contract source verified"
    );
}

/// Observe a failed source verification. The deployment itself stands.
pub fn verification_failed(record: &Record, err: &dyn std::error::Error) {
    tracing::warn!(
        address = %record.address,
        network = %record.network.name,
        %err,
        "failed to verify contract source"
    );
}
