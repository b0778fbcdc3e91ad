//! txflow - instruction encoding and a transaction build/broadcast/confirm
//! engine for Solana.
//!
//! Instruction builders produce [`instruction::OnChainInstruction`] values,
//! [`tx_builder::TxBuilder`] turns them into a signed v0 transaction, and
//! [`broadcast::ConfirmEngine`] drives that transaction to a terminal
//! [`broadcast::ConfirmationOutcome`]. [`fees`] decomposes what a landed
//! transaction paid.

pub mod amount;
pub mod broadcast;
pub mod compat;
pub mod config;
pub mod discriminator;
pub mod fees;
pub mod instruction;
pub mod metrics;
pub mod observability;
pub mod priority_fee;
pub mod registry;
pub mod rpc_manager;
pub mod sender;
pub mod structured_logging;
pub mod test_utils;
pub mod tx_builder;
pub mod wallet;

#[cfg(test)]
mod tests {
    mod confirm_engine_tests;
    mod fee_extraction_tests;
    mod instruction_ordering_tests;
}

// Re-export commonly used types
pub use amount::{from_raw_amount, to_raw_amount, TokenAmount};
pub use broadcast::{BroadcastPlan, ConfirmConfig, ConfirmEngine, ConfirmationOutcome};
pub use instruction::{AnchorInstructionBuilder, OnChainInstruction, OptionalAccount};
pub use solana_sdk::{pubkey::Pubkey, signature::Signature};
pub use tx_builder::{FeeParams, TxBuilder};
