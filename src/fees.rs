//! Fee decomposition of landed transactions
//!
//! The node reports only the total fee. The priority part is reconstructed
//! from the transaction's own compute budget instructions:
//!
//! ```text
//! priority = unit_price (micro-lamports) * unit_limit / 10^15   [SOL]
//! total    = meta.fee / 10^9                                    [SOL]
//! base     = total - priority
//! ```

use crate::amount::{from_raw_amount, SOL_DECIMALS};
use crate::broadcast::ConfirmedTransaction;
use crate::compat;
use crate::registry::ProgramRegistry;
use crate::rpc_manager::{ExecutionMeta, InnerInstructions};
use crate::tx_builder::DEFAULT_COMPUTE_UNIT_LIMIT;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use solana_sdk::transaction::VersionedTransaction;
use std::str::FromStr;
use thiserror::Error;

/// Micro-lamports per SOL, as a power of ten
const MICRO_LAMPORT_SOL_SCALE: u32 = SOL_DECIMALS as u32 + 6;

const SET_COMPUTE_UNIT_LIMIT_TAG: u8 = 2;
const SET_COMPUTE_UNIT_PRICE_TAG: u8 = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeeError {
    #[error("Malformed compute budget instruction at index {index}: {reason}")]
    MalformedComputeBudget { index: usize, reason: String },

    #[error("Account index {index} out of range ({len} keys)")]
    AccountIndexOutOfRange { index: usize, len: usize },

    #[error("Transaction has no execution metadata")]
    MissingMeta,

    #[error("Fee arithmetic failed: {0}")]
    Arithmetic(String),
}

/// Fee paid by a landed transaction, in SOL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub base_fee: String,
    pub priority_fee: String,
    pub total_fee: String,
    /// Micro-lamports per compute unit (0 without a price instruction)
    pub compute_unit_price: u64,
    /// Requested limit, or the runtime default when none was set
    pub compute_unit_limit: u32,
}

/// Decompose the fee of `tx` using its execution metadata.
///
/// Transactions without compute budget instructions report a zero priority
/// fee.
pub fn extract_fee_breakdown(
    meta: &ExecutionMeta,
    tx: &VersionedTransaction,
) -> Result<FeeBreakdown, FeeError> {
    extract_fee_breakdown_with(meta, tx, &ProgramRegistry::mainnet())
}

pub fn extract_fee_breakdown_with(
    meta: &ExecutionMeta,
    tx: &VersionedTransaction,
    registry: &ProgramRegistry,
) -> Result<FeeBreakdown, FeeError> {
    let account_keys = compat::resolve_account_keys(
        &tx.message,
        &meta.loaded_writable_addresses,
        &meta.loaded_readonly_addresses,
    );

    let mut unit_limit: Option<u32> = None;
    let mut unit_price: Option<u64> = None;

    for (index, ix) in compat::get_instructions(&tx.message).iter().enumerate() {
        let program_index = ix.program_id_index as usize;
        let program_id = account_keys
            .get(program_index)
            .ok_or(FeeError::AccountIndexOutOfRange {
                index: program_index,
                len: account_keys.len(),
            })?;
        if !registry.is_compute_budget(program_id) {
            continue;
        }

        match ix.data.first() {
            Some(&SET_COMPUTE_UNIT_LIMIT_TAG) => {
                let bytes = payload::<4>(index, &ix.data)?;
                unit_limit = Some(u32::from_le_bytes(bytes));
            }
            Some(&SET_COMPUTE_UNIT_PRICE_TAG) => {
                let bytes = payload::<8>(index, &ix.data)?;
                unit_price = Some(u64::from_le_bytes(bytes));
            }
            Some(_) => {}
            None => {
                return Err(FeeError::MalformedComputeBudget {
                    index,
                    reason: "empty instruction data".to_string(),
                })
            }
        }
    }

    let compute_unit_limit = unit_limit.unwrap_or(DEFAULT_COMPUTE_UNIT_LIMIT);
    let compute_unit_price = unit_price.unwrap_or(0);

    let total = Decimal::from_str(&from_raw_amount(meta.fee, SOL_DECIMALS).map_err(arith)?)
        .map_err(arith)?;
    let priority = match unit_price {
        Some(price) => {
            let micro_lamports = i128::from(price) * i128::from(compute_unit_limit);
            Decimal::try_from_i128_with_scale(micro_lamports, MICRO_LAMPORT_SOL_SCALE)
                .map_err(arith)?
        }
        None => Decimal::ZERO,
    };
    let base = total.checked_sub(priority).ok_or_else(|| arith("base fee underflow"))?;

    Ok(FeeBreakdown {
        base_fee: base.normalize().to_string(),
        priority_fee: priority.normalize().to_string(),
        total_fee: total.normalize().to_string(),
        compute_unit_price,
        compute_unit_limit,
    })
}

impl FeeBreakdown {
    pub fn from_confirmed(confirmed: &ConfirmedTransaction) -> Result<Self, FeeError> {
        Self::from_confirmed_with(confirmed, &ProgramRegistry::mainnet())
    }

    /// Like [`FeeBreakdown::from_confirmed`], resolving the compute budget
    /// program through `registry`
    pub fn from_confirmed_with(
        confirmed: &ConfirmedTransaction,
        registry: &ProgramRegistry,
    ) -> Result<Self, FeeError> {
        let meta = confirmed.meta().ok_or(FeeError::MissingMeta)?;
        extract_fee_breakdown_with(meta, &confirmed.record.transaction, registry)
    }
}

/// Inner instructions recorded for top-level instruction `index`.
pub fn find_inner_instructions(meta: &ExecutionMeta, index: u8) -> Option<&InnerInstructions> {
    meta.inner_instructions.iter().find(|set| set.index == index)
}

/// Fixed-size little-endian payload following the one-byte tag.
///
/// Trailing bytes are ignored, matching how the runtime deserializes the
/// instruction.
fn payload<const N: usize>(index: usize, data: &[u8]) -> Result<[u8; N], FeeError> {
    data.get(1..=N)
        .and_then(|bytes| <[u8; N]>::try_from(bytes).ok())
        .ok_or_else(|| FeeError::MalformedComputeBudget {
            index,
            reason: format!("expected at least {} bytes, got {}", N + 1, data.len()),
        })
}

fn arith(e: impl std::fmt::Display) -> FeeError {
    FeeError::Arithmetic(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{
        compute_budget::ComputeBudgetInstruction,
        hash::Hash,
        instruction::{AccountMeta, Instruction},
        message::{v0::Message as MessageV0, VersionedMessage},
        pubkey::Pubkey,
        signature::{Keypair, Signer},
    };

    fn tx_with(instructions: &[Instruction]) -> VersionedTransaction {
        let payer = Keypair::new();
        let message =
            MessageV0::try_compile(&payer.pubkey(), instructions, &[], Hash::new_unique()).unwrap();
        VersionedTransaction::try_new(VersionedMessage::V0(message), &[&payer]).unwrap()
    }

    fn program_ix() -> Instruction {
        Instruction::new_with_bytes(
            Pubkey::new_unique(),
            &[1],
            vec![AccountMeta::new(Pubkey::new_unique(), false)],
        )
    }

    fn meta_with_fee(fee: u64) -> ExecutionMeta {
        ExecutionMeta {
            fee,
            ..Default::default()
        }
    }

    #[test]
    fn test_priority_fee_breakdown() {
        let tx = tx_with(&[
            ComputeBudgetInstruction::set_compute_unit_limit(100_000),
            ComputeBudgetInstruction::set_compute_unit_price(50_000),
            program_ix(),
        ]);
        // 5000 base + 50_000 * 100_000 / 1e6 = 5000 priority lamports
        let fees = extract_fee_breakdown(&meta_with_fee(10_000), &tx).unwrap();

        assert_eq!(fees.total_fee, "0.00001");
        assert_eq!(fees.priority_fee, "0.000005");
        assert_eq!(fees.base_fee, "0.000005");
        assert_eq!(fees.compute_unit_price, 50_000);
        assert_eq!(fees.compute_unit_limit, 100_000);
    }

    #[test]
    fn test_price_without_limit_uses_default() {
        let tx = tx_with(&[ComputeBudgetInstruction::set_compute_unit_price(1_000), program_ix()]);
        let fees = extract_fee_breakdown(&meta_with_fee(5_200), &tx).unwrap();

        assert_eq!(fees.compute_unit_limit, DEFAULT_COMPUTE_UNIT_LIMIT);
        // 1000 * 200_000 micro-lamports = 200 lamports
        assert_eq!(fees.priority_fee, "0.0000002");
        assert_eq!(fees.base_fee, "0.000005");
    }

    #[test]
    fn test_no_budget_instructions() {
        let tx = tx_with(&[program_ix()]);
        let fees = extract_fee_breakdown(&meta_with_fee(5_000), &tx).unwrap();

        assert_eq!(fees.priority_fee, "0");
        assert_eq!(fees.base_fee, fees.total_fee);
        assert_eq!(fees.total_fee, "0.000005");
        assert_eq!(fees.compute_unit_price, 0);
    }

    #[test]
    fn test_malformed_budget_payload() {
        let bad = Instruction::new_with_bytes(solana_sdk::compute_budget::id(), &[3, 1, 2], vec![]);
        let tx = tx_with(&[bad, program_ix()]);

        match extract_fee_breakdown(&meta_with_fee(5_000), &tx) {
            Err(FeeError::MalformedComputeBudget { index, .. }) => assert_eq!(index, 0),
            other => panic!("Expected MalformedComputeBudget, got {other:?}"),
        }
    }

    #[test]
    fn test_trailing_budget_bytes_ignored() {
        let mut price = ComputeBudgetInstruction::set_compute_unit_price(40_000);
        price.data.extend_from_slice(&[0xff, 0xee]);
        let mut limit = ComputeBudgetInstruction::set_compute_unit_limit(50_000);
        limit.data.push(0x01);
        let tx = tx_with(&[limit, price, program_ix()]);

        let fees = extract_fee_breakdown(&meta_with_fee(7_000), &tx).unwrap();
        assert_eq!(fees.compute_unit_limit, 50_000);
        assert_eq!(fees.compute_unit_price, 40_000);
        // 40_000 * 50_000 micro-lamports = 2000 lamports
        assert_eq!(fees.priority_fee, "0.000002");
    }

    #[test]
    fn test_program_index_out_of_range() {
        let mut tx = tx_with(&[program_ix()]);
        if let VersionedMessage::V0(message) = &mut tx.message {
            message.instructions[0].program_id_index = 200;
        }

        assert!(matches!(
            extract_fee_breakdown(&meta_with_fee(5_000), &tx),
            Err(FeeError::AccountIndexOutOfRange { index: 200, .. })
        ));
    }

    #[test]
    fn test_find_inner_instructions() {
        let meta = ExecutionMeta {
            inner_instructions: vec![
                InnerInstructions {
                    index: 0,
                    instructions: vec![],
                },
                InnerInstructions {
                    index: 2,
                    instructions: vec![],
                },
            ],
            ..Default::default()
        };
        assert_eq!(find_inner_instructions(&meta, 2).map(|s| s.index), Some(2));
        assert!(find_inner_instructions(&meta, 1).is_none());
    }
}
