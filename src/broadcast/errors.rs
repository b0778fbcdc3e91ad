use crate::broadcast::outcome::ConfirmedTransaction;
use crate::rpc_manager::RpcManagerError;
use crate::tx_builder::TransactionBuilderError;
use solana_sdk::signature::Signature;
use std::time::Duration;
use thiserror::Error;

/// Terminal non-success of a build/broadcast/confirm run
#[derive(Error, Debug)]
pub enum BroadcastError {
    /// The transaction could not be built
    #[error(transparent)]
    Build(#[from] TransactionBuilderError),

    /// The transaction landed but its execution reverted
    #[error("Transaction {} failed on-chain in slot {}: {error}", .transaction.signature, .transaction.slot)]
    ExecutionFailed {
        error: String,
        transaction: Box<ConfirmedTransaction>,
    },

    /// The program rejected the transaction before it could land
    #[error("Transaction {signature} rejected: {source}")]
    Rejected {
        signature: Signature,
        source: RpcManagerError,
    },

    /// No record appeared before the deadline
    #[error("Confirmation of {signature} timed out after {elapsed:?}")]
    Timeout {
        signature: Signature,
        elapsed: Duration,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl BroadcastError {
    /// Whether a fresh build and broadcast might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Build(e) => e.is_retryable(),
            Self::Timeout { .. } => true,
            Self::ExecutionFailed { .. } => false,
            Self::Rejected { .. } => false,
            Self::Configuration(_) => false,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Build(_) => "build",
            Self::ExecutionFailed { .. } => "execution",
            Self::Rejected { .. } => "rejected",
            Self::Timeout { .. } => "timeout",
            Self::Configuration(_) => "config",
        }
    }

    pub fn signature(&self) -> Option<Signature> {
        match self {
            Self::ExecutionFailed { transaction, .. } => Some(transaction.signature),
            Self::Rejected { signature, .. } | Self::Timeout { signature, .. } => Some(*signature),
            Self::Build(_) | Self::Configuration(_) => None,
        }
    }
}
