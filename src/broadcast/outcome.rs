use crate::broadcast::errors::BroadcastError;
use crate::observability::CorrelationId;
use crate::rpc_manager::{ExecutionMeta, RpcManagerError, TransactionRecord};
use solana_sdk::signature::Signature;
use std::time::Duration;

/// A transaction the ledger has recorded at confirmed commitment
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedTransaction {
    pub signature: Signature,
    pub slot: u64,
    /// Block time in milliseconds, when the node reports one
    pub block_time_ms: Option<i64>,
    pub record: TransactionRecord,
    /// Primary submissions made before the record was found
    pub attempts: u32,
    pub elapsed: Duration,
    /// Id tagging the lifecycle log events of this transaction
    pub context_id: CorrelationId,
}

impl ConfirmedTransaction {
    pub fn meta(&self) -> Option<&ExecutionMeta> {
        self.record.meta.as_ref()
    }
}

/// Terminal result of one confirm call
#[derive(Debug)]
pub enum ConfirmationOutcome {
    /// Landed and executed successfully
    Confirmed(ConfirmedTransaction),
    /// Landed, but execution reverted; the fee was still charged
    Failed {
        transaction: ConfirmedTransaction,
        error: String,
    },
    /// Deadline elapsed without a record
    TimedOut {
        signature: Signature,
        elapsed: Duration,
        attempts: u32,
    },
    /// Submission refused in a way resubmitting cannot fix
    Fatal {
        signature: Signature,
        error: RpcManagerError,
        attempts: u32,
    },
}

impl ConfirmationOutcome {
    pub fn signature(&self) -> Signature {
        match self {
            Self::Confirmed(tx) => tx.signature,
            Self::Failed { transaction, .. } => transaction.signature,
            Self::TimedOut { signature, .. } | Self::Fatal { signature, .. } => *signature,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }

    /// Whether the transaction made it into a block (successful or not)
    pub fn landed(&self) -> bool {
        matches!(self, Self::Confirmed(_) | Self::Failed { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed(_) => "confirmed",
            Self::Failed { .. } => "failed",
            Self::TimedOut { .. } => "timed_out",
            Self::Fatal { .. } => "fatal",
        }
    }

    pub fn into_result(self) -> Result<ConfirmedTransaction, BroadcastError> {
        match self {
            Self::Confirmed(tx) => Ok(tx),
            Self::Failed { transaction, error } => Err(BroadcastError::ExecutionFailed {
                error,
                transaction: Box::new(transaction),
            }),
            Self::TimedOut {
                signature, elapsed, ..
            } => Err(BroadcastError::Timeout { signature, elapsed }),
            Self::Fatal {
                signature, error, ..
            } => Err(BroadcastError::Rejected {
                signature,
                source: error,
            }),
        }
    }
}
