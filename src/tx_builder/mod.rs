//! Transaction builder
//!
//! - **errors**: error taxonomy for the build pipeline
//! - **instructions**: compute budget planning and order validation
//! - **builder**: blockhash resolution, v0 compilation and signing
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use solana_sdk::signature::Keypair;
//! use txflow::instruction::OnChainInstruction;
//! use txflow::rpc_manager::SolanaRpc;
//! use txflow::tx_builder::{FeeParams, TransactionBuilderError, TxBuilder};
//!
//! # async fn example(ix: &dyn OnChainInstruction) -> Result<(), TransactionBuilderError> {
//! let rpc = Arc::new(SolanaRpc::new("https://api.mainnet-beta.solana.com", std::time::Duration::from_secs(10)));
//! let builder = TxBuilder::new(rpc);
//! let payer = Keypair::new();
//!
//! let tx = builder
//!     .build(&payer, &[ix], None, Some(&FeeParams::new(50_000, 200_000)))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub use errors::TransactionBuilderError;

mod builder;
mod instructions;

pub use builder::{compile_and_sign, TxBuilder};
pub use instructions::{
    plan_instructions, sanity_check_ix_order, FeeParams, InstructionPlan,
    DEFAULT_COMPUTE_UNIT_LIMIT,
};
