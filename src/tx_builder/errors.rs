//! Error types for transaction building
//!
//! Every failure aborts the build; no partially built or unsigned transaction
//! is ever handed back to the caller.

use crate::instruction::InstructionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransactionBuilderError {
    /// An instruction failed to produce its payload
    ///
    /// The underlying construction error is carried untouched.
    #[error("Instruction error: {0}")]
    Instruction(#[from] InstructionError),

    /// Failed to fetch a reference blockhash
    #[error("Blockhash error: {0}")]
    Blockhash(String),

    /// v0 message compilation failed (e.g. too many account keys)
    #[error("Message compile error: {0}")]
    MessageCompile(String),

    /// Failed to sign the transaction
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Serialized transaction exceeds the packet limit
    #[error("Transaction too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    /// Compute budget instructions are out of place
    #[error("Invalid instruction order: {0}")]
    InvalidInstructionOrder(String),

    /// Invalid input, e.g. an empty instruction list
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal invariant violation
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransactionBuilderError {
    /// Check if this error is potentially retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Blockhash(_) => true,

            Self::Instruction(_) => false,
            Self::MessageCompile(_) => false,
            Self::Signing(_) => false,
            Self::TooLarge { .. } => false,
            Self::InvalidInstructionOrder(_) => false,
            Self::Configuration(_) => false,
            Self::Internal(_) => false,
        }
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::Instruction(_) => "instruction",
            Self::Blockhash(_) => "blockhash",
            Self::MessageCompile(_) => "compile",
            Self::Signing(_) => "signing",
            Self::TooLarge { .. } => "size",
            Self::InvalidInstructionOrder(_) => "validation",
            Self::Configuration(_) => "config",
            Self::Internal(_) => "internal",
        }
    }
}

// Convenience constructors
impl TransactionBuilderError {
    pub fn blockhash_unavailable(reason: impl Into<String>) -> Self {
        Self::Blockhash(reason.into())
    }

    pub fn invalid_order(reason: impl Into<String>) -> Self {
        Self::InvalidInstructionOrder(reason.into())
    }

    pub fn empty_instructions() -> Self {
        Self::Configuration("Instruction list is empty".to_string())
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal(reason.into())
    }
}
