//! Instruction planning and ordering validation
//!
//! Transactions are laid out as:
//! 1. Compute budget instructions (unit limit, then unit price), only when a
//!    nonzero price is requested
//! 2. Caller instructions, in the order given
//!
//! Caller instructions are never reordered.

use crate::instruction::{to_instruction, OnChainInstruction};
use crate::tx_builder::errors::TransactionBuilderError;
use serde::{Deserialize, Serialize};
use solana_sdk::{compute_budget::ComputeBudgetInstruction, instruction::Instruction};

/// Default compute unit limit applied by the runtime per instruction
pub const DEFAULT_COMPUTE_UNIT_LIMIT: u32 = 200_000;

/// Priority fee request attached to a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeParams {
    /// Price per compute unit in micro-lamports; zero disables both budget instructions
    pub compute_unit_price_micro_lamports: u64,
    pub compute_unit_limit: u32,
}

impl FeeParams {
    pub fn new(compute_unit_price_micro_lamports: u64, compute_unit_limit: u32) -> Self {
        Self {
            compute_unit_price_micro_lamports,
            compute_unit_limit,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.compute_unit_price_micro_lamports != 0
    }
}

impl Default for FeeParams {
    fn default() -> Self {
        Self {
            compute_unit_price_micro_lamports: 0,
            compute_unit_limit: DEFAULT_COMPUTE_UNIT_LIMIT,
        }
    }
}

/// Ordered instruction list ready for message compilation
#[derive(Debug, Clone)]
pub struct InstructionPlan {
    pub instructions: Vec<Instruction>,
    /// Number of leading compute budget instructions
    pub budget_instructions: usize,
}

/// Materialize caller instructions and prepend compute budget instructions.
///
/// # Errors
///
/// Returns `TransactionBuilderError::Configuration` for an empty list and
/// `TransactionBuilderError::Instruction` when any instruction fails to
/// produce its payload.
pub fn plan_instructions(
    instructions: &[&dyn OnChainInstruction],
    fee_params: Option<&FeeParams>,
) -> Result<InstructionPlan, TransactionBuilderError> {
    if instructions.is_empty() {
        return Err(TransactionBuilderError::empty_instructions());
    }

    // budget (2) + caller instructions
    let mut planned = Vec::with_capacity(instructions.len() + 2);

    let mut budget_instructions = 0;
    if let Some(fee) = fee_params.filter(|f| f.is_enabled()) {
        planned.push(ComputeBudgetInstruction::set_compute_unit_limit(
            fee.compute_unit_limit,
        ));
        planned.push(ComputeBudgetInstruction::set_compute_unit_price(
            fee.compute_unit_price_micro_lamports,
        ));
        budget_instructions = 2;
    }

    for ix in instructions {
        planned.push(to_instruction(*ix)?);
    }

    Ok(InstructionPlan {
        instructions: planned,
        budget_instructions,
    })
}

/// Validate that compute budget instructions only appear as a leading block
/// (debug/test only).
#[cfg(debug_assertions)]
pub fn sanity_check_ix_order(instructions: &[Instruction]) -> Result<(), TransactionBuilderError> {
    if instructions.is_empty() {
        return Err(TransactionBuilderError::invalid_order("Instruction list is empty"));
    }

    let budget_program = solana_sdk::compute_budget::id();
    let leading = instructions
        .iter()
        .take_while(|ix| ix.program_id == budget_program)
        .count();

    if let Some((idx, _)) = instructions
        .iter()
        .enumerate()
        .skip(leading)
        .find(|(_, ix)| ix.program_id == budget_program)
    {
        return Err(TransactionBuilderError::invalid_order(format!(
            "Compute budget instruction found after program instructions (at position {idx})"
        )));
    }

    Ok(())
}

#[cfg(not(debug_assertions))]
#[inline]
pub fn sanity_check_ix_order(_instructions: &[Instruction]) -> Result<(), TransactionBuilderError> {
    Ok(())
}
