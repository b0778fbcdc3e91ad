//! Ledger RPC seam
//!
//! The builder and the confirm engine reach the network only through
//! [`LedgerRpc`]. Production code uses [`SolanaRpc`]; tests substitute an
//! in-memory ledger.

use async_trait::async_trait;
use solana_sdk::{hash::Hash, signature::Signature, transaction::VersionedTransaction};

pub mod rpc_errors;
pub mod solana_rpc;
pub mod transaction_record;

pub use rpc_errors::{RpcManagerError, SubmissionErrorKind};
pub use solana_rpc::SolanaRpc;
pub use transaction_record::{ExecutionMeta, InnerInstruction, InnerInstructions, TransactionRecord};

/// Request/response access to one ledger endpoint
#[async_trait]
pub trait LedgerRpc: Send + Sync + std::fmt::Debug {
    /// Endpoint identifier used in logs and errors
    fn endpoint(&self) -> &str;

    /// Submit signed bytes; the returned signature is the transaction's first signature
    async fn send_transaction(
        &self,
        tx: &VersionedTransaction,
        skip_preflight: bool,
    ) -> Result<Signature, RpcManagerError>;

    /// Latest blockhash at finalized commitment
    async fn get_latest_blockhash(&self) -> Result<Hash, RpcManagerError>;

    /// Look up a transaction at confirmed commitment (max version 0).
    ///
    /// `Ok(None)` means the ledger does not know the signature yet.
    async fn get_transaction(
        &self,
        signature: &Signature,
    ) -> Result<Option<TransactionRecord>, RpcManagerError>;
}
