//! Core TxBuilder implementation
//!
//! Pipeline: plan instructions, resolve the reference blockhash, compile a v0
//! message with the signer as fee payer, sign with exactly that key.
//! Blockhash lookup is the only I/O.

use crate::instruction::OnChainInstruction;
use crate::metrics::{EngineMetrics, Timer};
use crate::observability::CorrelationId;
use crate::rpc_manager::LedgerRpc;
use crate::structured_logging::TxEventLogger;
use crate::tx_builder::errors::TransactionBuilderError;
use crate::tx_builder::instructions::{plan_instructions, sanity_check_ix_order, FeeParams};
use solana_sdk::{
    hash::Hash,
    message::{v0::Message as MessageV0, VersionedMessage},
    packet::PACKET_DATA_SIZE,
    signature::Signer,
    transaction::VersionedTransaction,
};
use std::sync::Arc;
use tracing::debug;

pub struct TxBuilder {
    rpc: Arc<dyn LedgerRpc>,
    metrics: Option<Arc<EngineMetrics>>,
    logger: TxEventLogger,
}

impl TxBuilder {
    pub fn new(rpc: Arc<dyn LedgerRpc>) -> Self {
        Self {
            rpc,
            metrics: None,
            logger: TxEventLogger::default(),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_logger(mut self, logger: TxEventLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Build and sign a transaction.
    ///
    /// With `pinned_blockhash` set no network call is made. Compute budget
    /// instructions are prepended only when `fee_params` carries a nonzero
    /// price.
    ///
    /// # Errors
    ///
    /// Any instruction payload failure is returned untouched as
    /// `TransactionBuilderError::Instruction`; nothing partial is returned.
    pub async fn build(
        &self,
        signer: &dyn Signer,
        instructions: &[&dyn OnChainInstruction],
        pinned_blockhash: Option<Hash>,
        fee_params: Option<&FeeParams>,
    ) -> Result<VersionedTransaction, TransactionBuilderError> {
        self.build_logged(signer, instructions, pinned_blockhash, fee_params, &self.logger)
            .await
    }

    /// [`TxBuilder::build`] with lifecycle events tagged by `context_id`
    pub async fn build_with_context(
        &self,
        signer: &dyn Signer,
        instructions: &[&dyn OnChainInstruction],
        pinned_blockhash: Option<Hash>,
        fee_params: Option<&FeeParams>,
        context_id: &CorrelationId,
    ) -> Result<VersionedTransaction, TransactionBuilderError> {
        let logger = TxEventLogger::new(context_id.clone());
        self.build_logged(signer, instructions, pinned_blockhash, fee_params, &logger)
            .await
    }

    async fn build_logged(
        &self,
        signer: &dyn Signer,
        instructions: &[&dyn OnChainInstruction],
        pinned_blockhash: Option<Hash>,
        fee_params: Option<&FeeParams>,
        logger: &TxEventLogger,
    ) -> Result<VersionedTransaction, TransactionBuilderError> {
        let timer = Timer::new();

        let plan = plan_instructions(instructions, fee_params)?;
        sanity_check_ix_order(&plan.instructions)?;

        let blockhash = match pinned_blockhash {
            Some(hash) => hash,
            None => self
                .rpc
                .get_latest_blockhash()
                .await
                .map_err(|e| TransactionBuilderError::blockhash_unavailable(e.to_string()))?,
        };
        debug!(
            context_id = %logger.context_id(),
            blockhash = %blockhash,
            pinned = pinned_blockhash.is_some(),
            budget_instructions = plan.budget_instructions,
            "Resolved reference blockhash"
        );

        let tx = compile_and_sign(signer, &plan.instructions, blockhash)?;

        let size = bincode::serialized_size(&tx)
            .map_err(|e| TransactionBuilderError::internal(format!("serialize: {e}")))?
            as usize;
        if size > PACKET_DATA_SIZE {
            return Err(TransactionBuilderError::TooLarge {
                size,
                max: PACKET_DATA_SIZE,
            });
        }

        logger.log_built(&tx.signatures[0], plan.instructions.len(), size);
        if let Some(metrics) = &self.metrics {
            metrics.transactions_built.inc();
            timer.observe_duration(&metrics.build_latency);
        }

        Ok(tx)
    }
}

/// Compile a v0 message paid by `signer` and sign it.
pub fn compile_and_sign(
    signer: &dyn Signer,
    instructions: &[solana_sdk::instruction::Instruction],
    blockhash: Hash,
) -> Result<VersionedTransaction, TransactionBuilderError> {
    let payer = signer
        .try_pubkey()
        .map_err(|e| TransactionBuilderError::Signing(e.to_string()))?;

    let message = MessageV0::try_compile(&payer, instructions, &[], blockhash)
        .map_err(|e| TransactionBuilderError::MessageCompile(e.to_string()))?;

    VersionedTransaction::try_new(VersionedMessage::V0(message), &[signer])
        .map_err(|e| TransactionBuilderError::Signing(e.to_string()))
}
