//! Broadcast/confirm state machine
//!
//! One call drives one signed transaction to a terminal outcome:
//!
//! ```text
//! Submitting -> Polling -> Submitting -> ... -> {Confirmed, Failed, TimedOut, Fatal}
//! ```
//!
//! Every tick resubmits the identical bytes to the primary submitter, then
//! polls the engine's ledger by signature. The first tick fires immediately.
//! The whole loop, in-flight calls included, runs under one deadline.

use crate::broadcast::outcome::{ConfirmationOutcome, ConfirmedTransaction};
use crate::broadcast::plan::BroadcastPlan;
use crate::metrics::EngineMetrics;
use crate::observability::CorrelationId;
use crate::rpc_manager::{LedgerRpc, RpcManagerError, SubmissionErrorKind, TransactionRecord};
use crate::structured_logging::TxEventLogger;
use solana_sdk::{signature::Signature, transaction::VersionedTransaction};
use std::{sync::Arc, time::Duration};
use tokio::{task::JoinSet, time::Instant};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmConfig {
    /// Overall deadline for one confirm call
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Delay before the next tick after a stale-blockhash submission error
    pub stale_blockhash_backoff: Duration,
    pub skip_preflight: bool,
}

impl Default for ConfirmConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(90),
            poll_interval: Duration::from_secs(2),
            stale_blockhash_backoff: Duration::from_millis(500),
            skip_preflight: true,
        }
    }
}

type FanoutResult = (String, Result<Signature, RpcManagerError>);

/// Mutable state of one confirm call
struct ConfirmLoop<'a> {
    tx: &'a VersionedTransaction,
    signature: Signature,
    primary: Arc<dyn LedgerRpc>,
    logger: TxEventLogger,
    fanout: JoinSet<FanoutResult>,
    attempts: u32,
    started: Instant,
}

pub struct ConfirmEngine {
    ledger: Arc<dyn LedgerRpc>,
    config: ConfirmConfig,
    metrics: Option<Arc<EngineMetrics>>,
}

impl ConfirmEngine {
    /// `ledger` is used for polling and as the default primary submitter
    pub fn new(ledger: Arc<dyn LedgerRpc>, config: ConfirmConfig) -> Self {
        Self {
            ledger,
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerRpc> {
        &self.ledger
    }

    pub fn config(&self) -> &ConfirmConfig {
        &self.config
    }

    /// Drive `tx` to a terminal outcome.
    ///
    /// The transaction is never re-signed; the same bytes are resubmitted on
    /// every tick. Fan-out submissions still running when this returns are
    /// aborted.
    pub async fn confirm(
        &self,
        tx: &VersionedTransaction,
        plan: &BroadcastPlan,
    ) -> ConfirmationOutcome {
        self.confirm_with_context(tx, plan, CorrelationId::new())
            .await
    }

    /// [`ConfirmEngine::confirm`] with lifecycle events tagged by `context_id`,
    /// so a caller can tie them to the events of the build step.
    pub async fn confirm_with_context(
        &self,
        tx: &VersionedTransaction,
        plan: &BroadcastPlan,
        context_id: CorrelationId,
    ) -> ConfirmationOutcome {
        let logger = TxEventLogger::new(context_id);

        let Some(signature) = tx.signatures.first().copied() else {
            let error = RpcManagerError::Internal("transaction carries no signature".to_string());
            logger.log_fatal(&Signature::default(), &error.to_string());
            return ConfirmationOutcome::Fatal {
                signature: Signature::default(),
                error,
                attempts: 0,
            };
        };

        let mut state = ConfirmLoop {
            tx,
            signature,
            primary: plan
                .primary
                .clone()
                .unwrap_or_else(|| Arc::clone(&self.ledger)),
            logger,
            fanout: JoinSet::new(),
            attempts: 0,
            started: Instant::now(),
        };

        for endpoint in &plan.fanout {
            let endpoint = Arc::clone(endpoint);
            let tx = tx.clone();
            let skip_preflight = self.config.skip_preflight;
            state.fanout.spawn(async move {
                let result = endpoint.send_transaction(&tx, skip_preflight).await;
                (endpoint.endpoint().to_string(), result)
            });
        }

        let result = tokio::time::timeout(
            self.config.timeout,
            self.run(&mut state, plan.require_initial_accept),
        )
        .await;

        let elapsed = state.started.elapsed();
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(_) => {
                state.logger.log_timed_out(
                    &signature,
                    elapsed.as_millis() as u64,
                    state.attempts,
                );
                ConfirmationOutcome::TimedOut {
                    signature,
                    elapsed,
                    attempts: state.attempts,
                }
            }
        };

        state.fanout.abort_all();
        self.record_outcome(&outcome, elapsed);
        outcome
    }

    async fn run(&self, state: &mut ConfirmLoop<'_>, require_initial_accept: bool) -> ConfirmationOutcome {
        if require_initial_accept {
            if let Err(error) = self.submit(state).await {
                state.logger.log_fatal(&state.signature, &error.to_string());
                return ConfirmationOutcome::Fatal {
                    signature: state.signature,
                    error,
                    attempts: state.attempts,
                };
            }
        }

        let mut delay = Duration::ZERO;
        loop {
            tokio::time::sleep(delay).await;
            drain_fanout(state);

            // Submitting
            delay = self.config.poll_interval;
            if let Err(error) = self.submit(state).await {
                let kind = error.submission_kind();
                if let Some(metrics) = &self.metrics {
                    metrics.record_submission_error(kind);
                }
                state.logger.log_submit_error(
                    &state.signature,
                    state.primary.endpoint(),
                    kind,
                    &error.to_string(),
                );
                match kind {
                    SubmissionErrorKind::ProgramRejection => {
                        state.logger.log_fatal(&state.signature, &error.to_string());
                        return ConfirmationOutcome::Fatal {
                            signature: state.signature,
                            error,
                            attempts: state.attempts,
                        };
                    }
                    SubmissionErrorKind::StaleBlockhash => {
                        delay = self.config.stale_blockhash_backoff;
                    }
                    SubmissionErrorKind::Transient => {}
                }
            }

            // Polling
            match self.ledger.get_transaction(&state.signature).await {
                Ok(Some(record)) if record.meta.is_none() => {
                    // execution status unknown until the node reports meta
                    debug!(
                        context_id = %state.logger.context_id(),
                        signature = %state.signature,
                        slot = record.slot,
                        "Transaction recorded without execution meta"
                    );
                }
                Ok(Some(record)) => return self.landed(state, record),
                Ok(None) => {}
                Err(e) => {
                    debug!(
                        context_id = %state.logger.context_id(),
                        signature = %state.signature,
                        error = %e,
                        "Transaction lookup failed"
                    );
                }
            }
        }
    }

    async fn submit(&self, state: &mut ConfirmLoop<'_>) -> Result<Signature, RpcManagerError> {
        state.attempts += 1;
        if let Some(metrics) = &self.metrics {
            metrics.submissions_total.inc();
        }
        let result = state
            .primary
            .send_transaction(state.tx, self.config.skip_preflight)
            .await;
        if result.is_ok() {
            state
                .logger
                .log_submitted(&state.signature, state.primary.endpoint(), state.attempts);
        }
        result
    }

    fn landed(&self, state: &ConfirmLoop<'_>, record: TransactionRecord) -> ConfirmationOutcome {
        let error = record.meta.as_ref().and_then(|meta| meta.err.clone());
        let transaction = ConfirmedTransaction {
            signature: state.signature,
            slot: record.slot,
            block_time_ms: record.block_time_ms(),
            record,
            attempts: state.attempts,
            elapsed: state.started.elapsed(),
            context_id: state.logger.context_id().clone(),
        };

        match error {
            Some(error) => {
                state
                    .logger
                    .log_failed(&state.signature, transaction.slot, &error);
                ConfirmationOutcome::Failed { transaction, error }
            }
            None => {
                state.logger.log_confirmed(
                    &state.signature,
                    transaction.slot,
                    transaction.elapsed.as_millis() as u64,
                );
                ConfirmationOutcome::Confirmed(transaction)
            }
        }
    }

    fn record_outcome(&self, outcome: &ConfirmationOutcome, elapsed: Duration) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        match outcome {
            ConfirmationOutcome::Confirmed(_) => metrics.confirmed_total.inc(),
            ConfirmationOutcome::Failed { .. } => metrics.failed_total.inc(),
            ConfirmationOutcome::TimedOut { .. } => metrics.timed_out_total.inc(),
            ConfirmationOutcome::Fatal { .. } => metrics.fatal_total.inc(),
        }
        metrics.confirm_latency.observe(elapsed.as_secs_f64());
    }
}

/// Log fan-out submissions that finished since the last tick
fn drain_fanout(state: &mut ConfirmLoop<'_>) {
    while let Some(joined) = state.fanout.try_join_next() {
        match joined {
            Ok((endpoint, Ok(_))) => {
                debug!(context_id = %state.logger.context_id(), endpoint = %endpoint, "Fan-out submission accepted");
            }
            Ok((endpoint, Err(e))) => {
                debug!(context_id = %state.logger.context_id(), endpoint = %endpoint, error = %e, "Fan-out submission failed");
            }
            Err(e) => {
                debug!(context_id = %state.logger.context_id(), error = %e, "Fan-out task ended abnormally");
            }
        }
    }
}
