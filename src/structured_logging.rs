//! Structured transaction lifecycle events

use crate::observability::CorrelationId;
use crate::rpc_manager::SubmissionErrorKind;
use solana_sdk::signature::Signature;

/// Structured logger for transaction lifecycle events
#[derive(Debug, Clone)]
pub struct TxEventLogger {
    context_id: CorrelationId,
}

impl TxEventLogger {
    pub fn new(context_id: CorrelationId) -> Self {
        Self { context_id }
    }

    pub fn context_id(&self) -> &CorrelationId {
        &self.context_id
    }

    pub fn log_built(&self, signature: &Signature, instruction_count: usize, size: usize) {
        tracing::info!(
            context_id = %self.context_id,
            signature = %signature,
            instruction_count = %instruction_count,
            size = %size,
            "Transaction built"
        );
    }

    pub fn log_submitted(&self, signature: &Signature, endpoint: &str, attempt: u32) {
        tracing::debug!(
            context_id = %self.context_id,
            signature = %signature,
            endpoint = %endpoint,
            attempt = %attempt,
            "Transaction submitted"
        );
    }

    pub fn log_submit_error(
        &self,
        signature: &Signature,
        endpoint: &str,
        kind: SubmissionErrorKind,
        error: &str,
    ) {
        tracing::warn!(
            context_id = %self.context_id,
            signature = %signature,
            endpoint = %endpoint,
            kind = %kind.as_str(),
            error = %error,
            "Submission error"
        );
    }

    pub fn log_confirmed(&self, signature: &Signature, slot: u64, latency_ms: u64) {
        tracing::info!(
            context_id = %self.context_id,
            signature = %signature,
            slot = %slot,
            latency_ms = %latency_ms,
            "Transaction confirmed"
        );
    }

    pub fn log_failed(&self, signature: &Signature, slot: u64, error: &str) {
        tracing::warn!(
            context_id = %self.context_id,
            signature = %signature,
            slot = %slot,
            error = %error,
            "Transaction landed with error"
        );
    }

    pub fn log_timed_out(&self, signature: &Signature, elapsed_ms: u64, attempts: u32) {
        tracing::warn!(
            context_id = %self.context_id,
            signature = %signature,
            elapsed_ms = %elapsed_ms,
            attempts = %attempts,
            "Confirmation timed out"
        );
    }

    pub fn log_fatal(&self, signature: &Signature, error: &str) {
        tracing::error!(
            context_id = %self.context_id,
            signature = %signature,
            error = %error,
            "Confirmation aborted"
        );
    }
}

impl Default for TxEventLogger {
    fn default() -> Self {
        Self::new(CorrelationId::new())
    }
}
