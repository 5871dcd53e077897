use {
    crate::{
        domain::{
            deployment::{Contract, Deployment, Record, State},
            eth,
        },
        infra::{
            blockchain::{self, ChainClient},
            explorer::{self, Verifier},
            observe,
        },
    },
    network::NetworkProfile,
    std::{future::Future, sync::Arc, time::Duration},
    thiserror::Error,
    tracing::instrument,
};

/// How long and how often to poll for a deployment to be confirmed.
#[derive(Clone, Copy, Debug)]
pub struct WaitPolicy {
    pub max_wait: Duration,
    pub poll_interval: Duration,
}

/// Deploys contracts through a chain client and verifies their sources.
pub struct Orchestrator {
    chain: Arc<dyn ChainClient>,
    verifier: Arc<dyn Verifier>,
    policy: WaitPolicy,
}

/// Outcome of a successful verification call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Verification {
    Verified,
    AlreadyVerified,
    /// No API key was available so the explorer was not contacted.
    Skipped,
}

struct Inclusion {
    block: eth::BlockNo,
    address: eth::Address,
    confirmations: u64,
}

impl Orchestrator {
    pub fn new(chain: Arc<dyn ChainClient>, verifier: Arc<dyn Verifier>, policy: WaitPolicy) -> Self {
        Self {
            chain,
            verifier,
            policy,
        }
    }

    /// Deploys `contract` to the network of `profile`, signing with
    /// `deployer`, and waits for the network's required confirmations.
    ///
    /// `cancelled` aborts the run as long as nothing has been broadcast.
    /// Once the transaction is submitted the call only returns in a terminal
    /// state or after [`WaitPolicy::max_wait`].
    pub async fn deploy(
        &self,
        contract: &Contract,
        profile: &NetworkProfile,
        deployer: eth::Address,
        cancelled: impl Future<Output = ()>,
    ) -> Result<Record, Error> {
        let mut deployment = Deployment::new(contract, profile);
        self.execute(&mut deployment, contract, profile, deployer, cancelled)
            .await
    }

    /// Like [`Self::deploy`] but drives a caller owned [`Deployment`] so its
    /// state can be inspected afterwards.
    #[instrument(skip_all, fields(contract = %contract.name, network = %profile.name))]
    pub async fn execute(
        &self,
        deployment: &mut Deployment,
        contract: &Contract,
        profile: &NetworkProfile,
        deployer: eth::Address,
        cancelled: impl Future<Output = ()>,
    ) -> Result<Record, Error> {
        let chain_id = tokio::select! {
            biased;
            _ = cancelled => {
                observe::cancelled(&contract.name, &profile.name);
                return Err(Error::Cancelled);
            }
            chain_id = self.chain.chain_id() => chain_id?,
        };
        if chain_id != profile.chain_id {
            return Err(Error::ChainIdMismatch {
                network: profile.name.clone(),
                expected: profile.chain_id,
                actual: chain_id,
            });
        }

        let code = contract.creation_code();
        observe::submitting(&contract.name, deployer, &code);
        let tx = match self.chain.submit(deployer, code).await {
            Ok(tx) => tx,
            Err(blockchain::Error::Rejected(reason)) => {
                deployment.advance(State::Rejected {
                    tx: None,
                    reason: reason.clone(),
                });
                return Err(Error::DeploymentRejected {
                    contract: contract.name.clone(),
                    network: profile.name.clone(),
                    tx: None,
                    reason,
                });
            }
            Err(blockchain::Error::BroadcastUnknown { tx, source }) => {
                observe::broadcast_unknown(tx, &source);
                tx
            }
            Err(err) => return Err(err.into()),
        };
        deployment.advance(State::Submitted { tx });

        let required = profile.required_confirmations;
        let confirmed = tokio::time::timeout(
            self.policy.max_wait,
            self.confirm(deployment, tx, required),
        )
        .await;
        match confirmed {
            Ok(Ok(inclusion)) => Ok(Record {
                contract: contract.clone(),
                network: profile.clone(),
                address: inclusion.address,
                tx,
                block: inclusion.block,
                confirmations: inclusion.confirmations,
            }),
            Ok(Err(reason)) => Err(Error::DeploymentRejected {
                contract: contract.name.clone(),
                network: profile.name.clone(),
                tx: Some(tx),
                reason,
            }),
            Err(_) => {
                let observed = deployment.state().confirmations();
                deployment.advance(State::TimedOut {
                    tx,
                    confirmations: observed,
                });
                Err(Error::ConfirmationTimeout {
                    contract: contract.name.clone(),
                    network: profile.name.clone(),
                    tx,
                    required,
                    observed,
                    waited: self.policy.max_wait,
                })
            }
        }
    }

    /// Polls until the transaction is included and `required` blocks were
    /// mined on top of it. Errors with the reason if the deployment reverted.
    /// Polling errors are logged and retried.
    async fn confirm(
        &self,
        deployment: &mut Deployment,
        tx: eth::TxHash,
        required: u64,
    ) -> Result<Inclusion, String> {
        loop {
            match deployment.state().clone() {
                State::Submitted { .. } => match self.chain.receipt(tx).await {
                    Ok(Some(receipt)) => {
                        let address = match receipt.contract_address {
                            Some(address) if receipt.success => address,
                            _ => {
                                let reason = if receipt.success {
                                    "transaction did not create a contract"
                                } else {
                                    "constructor reverted"
                                };
                                deployment.advance(State::Rejected {
                                    tx: Some(tx),
                                    reason: reason.to_string(),
                                });
                                return Err(reason.to_string());
                            }
                        };
                        deployment.advance(State::Included {
                            tx,
                            block: receipt.block,
                            address,
                            confirmations: 0,
                        });
                        continue;
                    }
                    Ok(None) => (),
                    Err(err) => observe::polling_failed(tx, &err),
                },
                State::Included {
                    block,
                    address,
                    confirmations,
                    ..
                } => {
                    if confirmations >= required {
                        deployment.advance(State::Confirmed {
                            tx,
                            block,
                            address,
                            confirmations,
                        });
                        return Ok(Inclusion {
                            block,
                            address,
                            confirmations,
                        });
                    }
                    match self.chain.block_number().await {
                        Ok(head) => {
                            let observed = head.saturating_sub(block);
                            if observed != confirmations {
                                deployment.advance(State::Included {
                                    tx,
                                    block,
                                    address,
                                    confirmations: observed,
                                });
                            }
                            if observed >= required {
                                continue;
                            }
                        }
                        Err(err) => observe::polling_failed(tx, &err),
                    }
                }
                state => unreachable!("confirming deployment in state {state}"),
            }
            tokio::time::sleep(self.policy.poll_interval).await;
        }
    }

    /// Reports a finished deployment on stdout. Calling it repeatedly prints
    /// the same line and changes nothing.
    pub fn report(&self, record: &Record) {
        observe::deployed(record);
        println!("{record}");
    }

    /// Verifies the source of a deployed contract on the network's block
    /// explorer. The record stays valid whatever the outcome.
    pub async fn verify(
        &self,
        record: &Record,
        api_key: Option<&str>,
    ) -> Result<Verification, VerifyError> {
        let unavailable = |reason: &str| VerifyError::Unavailable {
            network: record.network.name.clone(),
            reason: reason.to_string(),
        };
        if record.network.is_local() {
            return Err(unavailable("local networks have no block explorer"));
        }
        let Some(explorer) = record.network.explorer.clone() else {
            return Err(unavailable("no block explorer configured"));
        };
        let Some(api_key) = api_key else {
            observe::verification_skipped(record);
            return Ok(Verification::Skipped);
        };

        let request = explorer::Request {
            explorer,
            api_key: api_key.to_string(),
            address: record.address,
            contract: record.contract.clone(),
        };
        observe::verifying(record);
        match self.verifier.verify_source(&request).await {
            Ok(outcome) => {
                observe::verified(record, outcome);
                Ok(match outcome {
                    explorer::Verified::Now => Verification::Verified,
                    explorer::Verified::Already => Verification::AlreadyVerified,
                })
            }
            Err(explorer::Error::Unavailable(reason)) => Err(unavailable(&reason)),
            Err(err) => Err(VerifyError::Failed {
                network: record.network.name.clone(),
                source: err,
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("deployment cancelled before submission")]
    Cancelled,
    #[error("node of network {network:?} is on chain {actual}, expected {expected}")]
    ChainIdMismatch {
        network: String,
        expected: eth::ChainId,
        actual: eth::ChainId,
    },
    #[error("deployment of {contract} to {network} rejected: {reason}")]
    DeploymentRejected {
        contract: String,
        network: String,
        tx: Option<eth::TxHash>,
        reason: String,
    },
    #[error(
        "deployment of {contract} to {network} not confirmed after {waited:?}: transaction {tx} \
         has {observed:?} of {required} confirmations and is unresolved"
    )]
    ConfirmationTimeout {
        contract: String,
        network: String,
        tx: eth::TxHash,
        required: u64,
        observed: Option<u64>,
        waited: Duration,
    },
    #[error(transparent)]
    Blockchain(#[from] blockchain::Error),
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("verification unavailable on {network}: {reason}")]
    Unavailable { network: String, reason: String },
    #[error("verification on {network} failed: {source}")]
    Failed {
        network: String,
        source: explorer::Error,
    },
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::infra::{blockchain::MockChainClient, explorer::MockVerifier},
        alloy::transports::{RpcError, TransportErrorKind},
        network::{ChainId, Explorer},
        std::sync::atomic::{AtomicUsize, Ordering},
    };

    const TX: eth::TxHash = eth::TxHash::repeat_byte(0x11);
    const CONTRACT: eth::Address = eth::Address::repeat_byte(0x22);
    const DEPLOYER: eth::Address = eth::Address::repeat_byte(0x33);
    const BLOCK: eth::BlockNo = 100;

    fn contract() -> Contract {
        Contract {
            name: "Election".to_string(),
            constructor_args: vec![],
            encoded_args: Default::default(),
            bytecode: vec![0x60_u8, 0x80, 0x60, 0x40].into(),
            source: None,
        }
    }

    fn local() -> NetworkProfile {
        NetworkProfile {
            name: "hardhat".to_string(),
            chain_id: ChainId::HARDHAT,
            endpoint: None,
            credentials: vec![],
            required_confirmations: 0,
            explorer: None,
        }
    }

    fn goerli(required_confirmations: u64) -> NetworkProfile {
        NetworkProfile {
            name: "goerli".to_string(),
            chain_id: ChainId::GOERLI,
            endpoint: Some("https://goerli.example.com".parse().unwrap()),
            credentials: vec![],
            required_confirmations,
            explorer: Some(Explorer {
                api_url: "https://api-goerli.etherscan.io/api".parse().unwrap(),
                browser_url: Some("https://goerli.etherscan.io/".parse().unwrap()),
            }),
        }
    }

    fn policy() -> WaitPolicy {
        WaitPolicy {
            max_wait: Duration::from_secs(60),
            poll_interval: Duration::from_secs(2),
        }
    }

    fn receipt(success: bool) -> eth::Receipt {
        eth::Receipt {
            block: BLOCK,
            contract_address: Some(CONTRACT),
            success,
        }
    }

    fn chain(chain_id: ChainId) -> MockChainClient {
        let mut chain = MockChainClient::new();
        chain.expect_chain_id().returning(move || Ok(chain_id));
        chain
    }

    fn orchestrator(chain: MockChainClient) -> Orchestrator {
        Orchestrator::new(Arc::new(chain), Arc::new(MockVerifier::new()), policy())
    }

    fn record(network: NetworkProfile) -> Record {
        Record {
            contract: contract(),
            network,
            address: CONTRACT,
            tx: TX,
            block: BLOCK,
            confirmations: 1,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn zero_confirmations_return_on_inclusion() {
        let mut chain = chain(ChainId::HARDHAT);
        chain
            .expect_submit()
            .times(1)
            .withf(|from, code| *from == DEPLOYER && code.to_vec() == vec![0x60, 0x80, 0x60, 0x40])
            .returning(|_, _| Ok(TX));
        let polls = AtomicUsize::new(0);
        chain.expect_receipt().returning(move |_| {
            // Pending for the first two polls.
            Ok((polls.fetch_add(1, Ordering::SeqCst) >= 2).then(|| receipt(true)))
        });
        chain.expect_block_number().times(0);

        let record = orchestrator(chain)
            .deploy(&contract(), &local(), DEPLOYER, std::future::pending())
            .await
            .unwrap();
        assert_eq!(record.address, CONTRACT);
        assert_eq!(record.tx, TX);
        assert_eq!(record.block, BLOCK);
        assert_eq!(record.confirmations, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_required_confirmations() {
        let mut chain = chain(ChainId::GOERLI);
        chain.expect_submit().returning(|_, _| Ok(TX));
        chain.expect_receipt().returning(|_| Ok(Some(receipt(true))));
        let head = AtomicUsize::new(0);
        chain.expect_block_number().returning(move || {
            let polls = head.fetch_add(1, Ordering::SeqCst) as u64;
            Ok(BLOCK + polls)
        });

        let orchestrator = orchestrator(chain);
        let mut deployment = Deployment::new(&contract(), &goerli(3));
        let record = orchestrator
            .execute(
                &mut deployment,
                &contract(),
                &goerli(3),
                DEPLOYER,
                std::future::pending(),
            )
            .await
            .unwrap();
        assert_eq!(record.confirmations, 3);
        assert!(matches!(
            deployment.state(),
            State::Confirmed {
                confirmations: 3,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_without_enough_confirmations() {
        let mut chain = chain(ChainId::GOERLI);
        chain.expect_submit().returning(|_, _| Ok(TX));
        chain.expect_receipt().returning(|_| Ok(Some(receipt(true))));
        chain.expect_block_number().returning(|| Ok(BLOCK + 3));

        let orchestrator = orchestrator(chain);
        let mut deployment = Deployment::new(&contract(), &goerli(5));
        let err = orchestrator
            .execute(
                &mut deployment,
                &contract(),
                &goerli(5),
                DEPLOYER,
                std::future::pending(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ConfirmationTimeout {
                tx,
                required: 5,
                observed: Some(3),
                ..
            } if tx == TX
        ));
        assert_eq!(
            deployment.state(),
            &State::TimedOut {
                tx: TX,
                confirmations: Some(3)
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_without_inclusion() {
        let mut chain = chain(ChainId::GOERLI);
        chain.expect_submit().returning(|_, _| Ok(TX));
        chain.expect_receipt().returning(|_| Ok(None));

        let err = orchestrator(chain)
            .deploy(&contract(), &goerli(1), DEPLOYER, std::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ConfirmationTimeout { observed: None, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn polling_errors_are_retried() {
        let mut chain = chain(ChainId::GOERLI);
        chain.expect_submit().returning(|_, _| Ok(TX));
        let polls = AtomicUsize::new(0);
        chain.expect_receipt().returning(move |_| {
            if polls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(RpcError::Transport(TransportErrorKind::BackendGone).into())
            } else {
                Ok(Some(receipt(true)))
            }
        });
        chain.expect_block_number().returning(|| Ok(BLOCK + 1));

        let record = orchestrator(chain)
            .deploy(&contract(), &goerli(1), DEPLOYER, std::future::pending())
            .await
            .unwrap();
        assert_eq!(record.confirmations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reverted_constructor_is_rejected() {
        let mut chain = chain(ChainId::GOERLI);
        chain.expect_submit().returning(|_, _| Ok(TX));
        chain.expect_receipt().returning(|_| Ok(Some(receipt(false))));
        chain.expect_block_number().times(0);

        let orchestrator = orchestrator(chain);
        let mut deployment = Deployment::new(&contract(), &goerli(1));
        let err = orchestrator
            .execute(
                &mut deployment,
                &contract(),
                &goerli(1),
                DEPLOYER,
                std::future::pending(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DeploymentRejected { tx: Some(tx), .. } if tx == TX
        ));
        assert!(deployment.state().is_terminal());
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_submission_is_not_retried() {
        let mut chain = chain(ChainId::GOERLI);
        chain
            .expect_submit()
            .times(1)
            .returning(|_, _| Err(blockchain::Error::Rejected("nonce too low".to_string())));
        chain.expect_receipt().times(0);

        let err = orchestrator(chain)
            .deploy(&contract(), &goerli(1), DEPLOYER, std::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DeploymentRejected { tx: None, reason, .. } if reason == "nonce too low"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn lost_broadcast_is_confirmed_by_polling() {
        let mut chain = chain(ChainId::GOERLI);
        chain.expect_submit().times(1).returning(|_, _| {
            Err(blockchain::Error::BroadcastUnknown {
                tx: TX,
                source: RpcError::Transport(TransportErrorKind::BackendGone),
            })
        });
        chain
            .expect_receipt()
            .withf(|tx| *tx == TX)
            .returning(|_| Ok(Some(receipt(true))));
        chain.expect_block_number().returning(|| Ok(BLOCK + 1));

        let record = orchestrator(chain)
            .deploy(&contract(), &goerli(1), DEPLOYER, std::future::pending())
            .await
            .unwrap();
        assert_eq!(record.tx, TX);
        assert_eq!(record.address, CONTRACT);
    }

    #[tokio::test(start_paused = true)]
    async fn lost_broadcast_times_out_with_transaction_hash() {
        let mut chain = chain(ChainId::GOERLI);
        chain.expect_submit().returning(|_, _| {
            Err(blockchain::Error::BroadcastUnknown {
                tx: TX,
                source: RpcError::Transport(TransportErrorKind::BackendGone),
            })
        });
        chain.expect_receipt().returning(|_| Ok(None));

        let orchestrator = orchestrator(chain);
        let mut deployment = Deployment::new(&contract(), &goerli(1));
        let err = orchestrator
            .execute(
                &mut deployment,
                &contract(),
                &goerli(1),
                DEPLOYER,
                std::future::pending(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ConfirmationTimeout { tx, observed: None, .. } if tx == TX
        ));
        assert_eq!(
            deployment.state(),
            &State::TimedOut {
                tx: TX,
                confirmations: None
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn chain_id_mismatch() {
        let mut chain = chain(ChainId::MAINNET);
        chain.expect_submit().times(0);

        let err = orchestrator(chain)
            .deploy(&contract(), &goerli(1), DEPLOYER, std::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ChainIdMismatch {
                expected: ChainId::GOERLI,
                actual: ChainId::MAINNET,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_submission() {
        let mut chain = chain(ChainId::GOERLI);
        chain.expect_submit().times(0);

        let orchestrator = orchestrator(chain);
        let mut deployment = Deployment::new(&contract(), &goerli(1));
        let err = orchestrator
            .execute(
                &mut deployment,
                &contract(),
                &goerli(1),
                DEPLOYER,
                std::future::ready(()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert_eq!(deployment.state(), &State::Pending);
    }

    #[tokio::test]
    async fn verify_on_local_network_is_unavailable() {
        let mut verifier = MockVerifier::new();
        verifier.expect_verify_source().times(0);
        let orchestrator = Orchestrator::new(
            Arc::new(MockChainClient::new()),
            Arc::new(verifier),
            policy(),
        );

        let record = record(local());
        let before = record.clone();
        let err = orchestrator.verify(&record, Some("key")).await.unwrap_err();
        assert!(matches!(err, VerifyError::Unavailable { .. }));
        assert_eq!(record, before);
    }

    #[tokio::test]
    async fn verify_without_explorer_is_unavailable() {
        let mut network = goerli(1);
        network.explorer = None;
        let err = orchestrator(MockChainClient::new())
            .verify(&record(network), Some("key"))
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn verify_without_api_key_is_skipped() {
        let outcome = orchestrator(MockChainClient::new())
            .verify(&record(goerli(1)), None)
            .await
            .unwrap();
        assert_eq!(outcome, Verification::Skipped);
    }

    #[tokio::test]
    async fn verify() {
        let mut verifier = MockVerifier::new();
        verifier
            .expect_verify_source()
            .times(1)
            .withf(|request| {
                request.address == CONTRACT
                    && request.api_key == "key"
                    && request.contract.name == "Election"
            })
            .returning(|_| Ok(explorer::Verified::Now));
        let orchestrator = Orchestrator::new(
            Arc::new(MockChainClient::new()),
            Arc::new(verifier),
            policy(),
        );
        let outcome = orchestrator
            .verify(&record(goerli(1)), Some("key"))
            .await
            .unwrap();
        assert_eq!(outcome, Verification::Verified);
    }

    #[tokio::test]
    async fn verification_failure_keeps_record() {
        let mut verifier = MockVerifier::new();
        verifier
            .expect_verify_source()
            .returning(|_| Err(explorer::Error::Failed("Fail - Unable to verify".to_string())));
        let orchestrator = Orchestrator::new(
            Arc::new(MockChainClient::new()),
            Arc::new(verifier),
            policy(),
        );
        let record = record(goerli(1));
        let before = record.clone();
        let err = orchestrator.verify(&record, Some("key")).await.unwrap_err();
        assert!(matches!(err, VerifyError::Failed { .. }));
        assert_eq!(record, before);
    }

    #[test]
    fn report_is_idempotent() {
        let orchestrator = orchestrator(MockChainClient::new());
        let record = record(goerli(1));
        let before = record.clone();
        orchestrator.report(&record);
        orchestrator.report(&record);
        assert_eq!(record, before);
        assert_eq!(
            record.to_string(),
            format!("Contract deployed to: {CONTRACT}")
        );
    }
}
