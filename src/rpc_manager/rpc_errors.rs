use solana_client::client_error::ClientError;
use solana_sdk::{instruction::InstructionError as ProgramError, transaction::TransactionError};
use thiserror::Error;

/// RPC errors as seen by the builder and the confirm engine
#[derive(Debug, Clone, Error)]
pub enum RpcManagerError {
    /// Transport-level errors (network, connection)
    #[error("Transport error: {message} (endpoint: {endpoint})")]
    Transport { endpoint: String, message: String },

    #[error("Timeout after {timeout_ms}ms (endpoint: {endpoint})")]
    Timeout { endpoint: String, timeout_ms: u64 },

    /// RPC response errors (from the RPC server)
    #[error("RPC response error: {message} (endpoint: {endpoint}, code: {code:?})")]
    RpcResponse {
        endpoint: String,
        message: String,
        code: Option<i64>,
    },

    #[error("Rate limit exceeded (endpoint: {endpoint})")]
    RateLimitExceeded { endpoint: String },

    #[error("Blockhash not found (endpoint: {endpoint})")]
    BlockhashNotFound { endpoint: String },

    #[error("Transaction expired (endpoint: {endpoint})")]
    TransactionExpired { endpoint: String },

    /// The program rejected the transaction; resubmitting cannot succeed
    #[error("Program rejected transaction: {message} (endpoint: {endpoint})")]
    ProgramRejected { endpoint: String, message: String },

    #[error("Insufficient funds (endpoint: {endpoint})")]
    InsufficientFunds { endpoint: String },

    /// A response could not be mapped into local types
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// How the confirm engine reacts to a submission error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionErrorKind {
    /// Reference blockhash unknown or expired; back off briefly and resubmit
    StaleBlockhash,
    /// Deterministic program failure; stop immediately
    ProgramRejection,
    /// Anything else; log and keep going
    Transient,
}

impl SubmissionErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StaleBlockhash => "stale_blockhash",
            Self::ProgramRejection => "program_rejection",
            Self::Transient => "transient",
        }
    }
}

impl RpcManagerError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            RpcManagerError::Transport { .. } => true,
            RpcManagerError::Timeout { .. } => true,
            RpcManagerError::RateLimitExceeded { .. } => true,
            RpcManagerError::BlockhashNotFound { .. } => true,

            RpcManagerError::TransactionExpired { .. } => false,
            RpcManagerError::ProgramRejected { .. } => false,
            RpcManagerError::InsufficientFunds { .. } => false,
            RpcManagerError::Decode(_) => false,
            RpcManagerError::Configuration(_) => false,
            RpcManagerError::Internal(_) => false,

            // Retry on server errors (5xx)
            RpcManagerError::RpcResponse { code, .. } => {
                matches!(code, Some(c) if (500..600).contains(c))
            }
        }
    }

    /// Classification used by the confirm loop
    pub fn submission_kind(&self) -> SubmissionErrorKind {
        match self {
            RpcManagerError::BlockhashNotFound { .. }
            | RpcManagerError::TransactionExpired { .. } => SubmissionErrorKind::StaleBlockhash,
            RpcManagerError::ProgramRejected { .. } => SubmissionErrorKind::ProgramRejection,
            _ => SubmissionErrorKind::Transient,
        }
    }

    /// Get the endpoint associated with this error, if any
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            RpcManagerError::Transport { endpoint, .. } => Some(endpoint),
            RpcManagerError::Timeout { endpoint, .. } => Some(endpoint),
            RpcManagerError::RpcResponse { endpoint, .. } => Some(endpoint),
            RpcManagerError::RateLimitExceeded { endpoint } => Some(endpoint),
            RpcManagerError::BlockhashNotFound { endpoint } => Some(endpoint),
            RpcManagerError::TransactionExpired { endpoint } => Some(endpoint),
            RpcManagerError::ProgramRejected { endpoint, .. } => Some(endpoint),
            RpcManagerError::InsufficientFunds { endpoint } => Some(endpoint),
            _ => None,
        }
    }

    /// Create from ClientError with context
    ///
    /// The structured `TransactionError` carried by preflight and send
    /// failures is checked first; message matching is the fallback.
    pub fn from_client_error(err: ClientError, endpoint: &str) -> Self {
        if let Some(tx_err) = err.get_transaction_error() {
            if let Some(mapped) = Self::from_transaction_error(&tx_err, endpoint) {
                return mapped;
            }
        }
        Self::from_message(endpoint, &err.to_string())
    }

    /// Map the transaction errors the confirm loop reacts to
    pub fn from_transaction_error(err: &TransactionError, endpoint: &str) -> Option<Self> {
        match err {
            TransactionError::BlockhashNotFound => Some(RpcManagerError::BlockhashNotFound {
                endpoint: endpoint.to_string(),
            }),
            TransactionError::InstructionError(idx, ProgramError::Custom(code)) => {
                Some(RpcManagerError::ProgramRejected {
                    endpoint: endpoint.to_string(),
                    message: format!("custom program error: {code:#x} (instruction {idx})"),
                })
            }
            TransactionError::InstructionError(idx, ProgramError::ProgramFailedToComplete) => {
                Some(RpcManagerError::ProgramRejected {
                    endpoint: endpoint.to_string(),
                    message: format!("Program failed to complete (instruction {idx})"),
                })
            }
            TransactionError::InsufficientFundsForFee => Some(RpcManagerError::InsufficientFunds {
                endpoint: endpoint.to_string(),
            }),
            _ => None,
        }
    }

    /// Classify a raw error message
    pub fn from_message(endpoint: &str, message: &str) -> Self {
        let err_str = message.to_lowercase();

        if err_str.contains("blockhash not found") {
            RpcManagerError::BlockhashNotFound {
                endpoint: endpoint.to_string(),
            }
        } else if err_str.contains("custom program error")
            || err_str.contains("program failed to complete")
        {
            RpcManagerError::ProgramRejected {
                endpoint: endpoint.to_string(),
                message: message.to_string(),
            }
        } else if err_str.contains("transaction expired")
            || err_str.contains("block height exceeded")
        {
            RpcManagerError::TransactionExpired {
                endpoint: endpoint.to_string(),
            }
        } else if err_str.contains("insufficient funds")
            || err_str.contains("insufficient lamports")
        {
            RpcManagerError::InsufficientFunds {
                endpoint: endpoint.to_string(),
            }
        } else if err_str.contains("rate limit")
            || err_str.contains("too many requests")
            || err_str.contains("429")
        {
            RpcManagerError::RateLimitExceeded {
                endpoint: endpoint.to_string(),
            }
        } else if err_str.contains("timeout") || err_str.contains("timed out") {
            RpcManagerError::Timeout {
                endpoint: endpoint.to_string(),
                timeout_ms: 0,
            }
        } else if err_str.contains("connection") || err_str.contains("dns error") {
            RpcManagerError::Transport {
                endpoint: endpoint.to_string(),
                message: message.to_string(),
            }
        } else {
            // Extract error code if available
            let code = err_str
                .split("code:")
                .nth(1)
                .and_then(|s| s.split_whitespace().next())
                .and_then(|s| s.trim_end_matches([',', ')']).parse::<i64>().ok());

            RpcManagerError::RpcResponse {
                endpoint: endpoint.to_string(),
                message: message.to_string(),
                code,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EP: &str = "https://rpc.test";

    #[test]
    fn test_error_is_retryable() {
        assert!(RpcManagerError::Transport {
            endpoint: EP.to_string(),
            message: "connection refused".to_string(),
        }
        .is_retryable());
        assert!(RpcManagerError::RpcResponse {
            endpoint: EP.to_string(),
            message: "bad gateway".to_string(),
            code: Some(502),
        }
        .is_retryable());

        assert!(!RpcManagerError::ProgramRejected {
            endpoint: EP.to_string(),
            message: "x".to_string(),
        }
        .is_retryable());
        assert!(!RpcManagerError::TransactionExpired {
            endpoint: EP.to_string(),
        }
        .is_retryable());
    }

    #[test]
    fn test_message_classification() {
        let stale = RpcManagerError::from_message(
            EP,
            "Transaction simulation failed: Blockhash not found",
        );
        assert!(matches!(stale, RpcManagerError::BlockhashNotFound { .. }));
        assert_eq!(stale.submission_kind(), SubmissionErrorKind::StaleBlockhash);

        let rejected = RpcManagerError::from_message(
            EP,
            "Error processing Instruction 2: custom program error: 0x1771",
        );
        assert_eq!(rejected.submission_kind(), SubmissionErrorKind::ProgramRejection);

        let incomplete = RpcManagerError::from_message(EP, "Program failed to complete");
        assert_eq!(incomplete.submission_kind(), SubmissionErrorKind::ProgramRejection);

        let other = RpcManagerError::from_message(EP, "node is behind by 42 slots");
        assert_eq!(other.submission_kind(), SubmissionErrorKind::Transient);
        assert_eq!(other.endpoint(), Some(EP));
    }

    #[test]
    fn test_structured_classification() {
        let err = RpcManagerError::from_transaction_error(&TransactionError::BlockhashNotFound, EP)
            .unwrap();
        assert_eq!(err.submission_kind(), SubmissionErrorKind::StaleBlockhash);

        let err = RpcManagerError::from_transaction_error(
            &TransactionError::InstructionError(3, ProgramError::Custom(6001)),
            EP,
        )
        .unwrap();
        match &err {
            RpcManagerError::ProgramRejected { message, .. } => {
                assert!(message.contains("0x1771"));
                assert!(message.contains("instruction 3"));
            }
            other => panic!("Expected ProgramRejected, got {other:?}"),
        }

        assert!(RpcManagerError::from_transaction_error(
            &TransactionError::AccountInUse,
            EP
        )
        .is_none());
    }

    #[test]
    fn test_response_code_extraction() {
        let err = RpcManagerError::from_message(EP, "RPC response error code: -32005, node unhealthy");
        match err {
            RpcManagerError::RpcResponse { code, .. } => assert_eq!(code, Some(-32005)),
            other => panic!("Expected RpcResponse, got {other:?}"),
        }
    }
}
