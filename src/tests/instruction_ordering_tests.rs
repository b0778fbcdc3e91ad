//! Instruction ordering in built transactions
//!
//! Compute budget instructions, when present, form a leading block (limit
//! then price); caller instructions keep their order after it.

use crate::instruction::{AnchorInstructionBuilder, OnChainInstruction};
use crate::test_utils::MockLedger;
use crate::tx_builder::errors::TransactionBuilderError;
use crate::tx_builder::{plan_instructions, sanity_check_ix_order, FeeParams, TxBuilder};
use solana_sdk::{
    compute_budget::{self, ComputeBudgetInstruction},
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::VersionedTransaction,
};
use std::sync::Arc;

fn anchor_ix(program: Pubkey, name: &str, payer: &Pubkey) -> impl OnChainInstruction {
    AnchorInstructionBuilder::anchor(program, name)
        .account(*payer, true, true)
        .arg_u64(42)
        .build()
        .unwrap()
}

/// Program ids of the compiled top-level instructions, in order
fn program_order(tx: &VersionedTransaction) -> Vec<Pubkey> {
    let keys = tx.message.static_account_keys();
    tx.message
        .instructions()
        .iter()
        .map(|ix| keys[ix.program_id_index as usize])
        .collect()
}

#[tokio::test]
async fn test_zero_price_emits_only_caller_instructions() {
    let ledger = Arc::new(MockLedger::new("primary"));
    let payer = Keypair::new();
    let (prog_a, prog_b) = (Pubkey::new_unique(), Pubkey::new_unique());
    let a = anchor_ix(prog_a, "create", &payer.pubkey());
    let b = anchor_ix(prog_b, "buy", &payer.pubkey());

    let tx = TxBuilder::new(ledger)
        .build(&payer, &[&a, &b], None, Some(&FeeParams::new(0, 300_000)))
        .await
        .unwrap();

    assert_eq!(program_order(&tx), vec![prog_a, prog_b]);
}

#[tokio::test]
async fn test_nonzero_price_prepends_limit_then_price() {
    let ledger = Arc::new(MockLedger::new("primary"));
    let payer = Keypair::new();
    let (prog_a, prog_b) = (Pubkey::new_unique(), Pubkey::new_unique());
    let a = anchor_ix(prog_a, "create", &payer.pubkey());
    let b = anchor_ix(prog_b, "buy", &payer.pubkey());

    let tx = TxBuilder::new(ledger)
        .build(&payer, &[&a, &b], None, Some(&FeeParams::new(5_000, 300_000)))
        .await
        .unwrap();

    let budget = compute_budget::id();
    assert_eq!(program_order(&tx), vec![budget, budget, prog_a, prog_b]);

    let instructions = tx.message.instructions();
    assert_eq!(
        instructions[0].data,
        ComputeBudgetInstruction::set_compute_unit_limit(300_000).data
    );
    assert_eq!(
        instructions[1].data,
        ComputeBudgetInstruction::set_compute_unit_price(5_000).data
    );
    // caller payloads pass through untouched
    assert_eq!(instructions[3].data, b.data().unwrap());
}

#[test]
fn test_plan_counts_budget_instructions() {
    let payer = Pubkey::new_unique();
    let a = anchor_ix(Pubkey::new_unique(), "sell", &payer);

    let without = plan_instructions(&[&a], None).unwrap();
    assert_eq!(without.budget_instructions, 0);
    assert_eq!(without.instructions.len(), 1);

    let with = plan_instructions(&[&a], Some(&FeeParams::new(1, 200_000))).unwrap();
    assert_eq!(with.budget_instructions, 2);
    assert_eq!(with.instructions.len(), 3);
    sanity_check_ix_order(&with.instructions).unwrap();
}

#[test]
fn test_empty_instruction_list_rejected() {
    assert!(matches!(
        plan_instructions(&[], Some(&FeeParams::new(1, 200_000))),
        Err(TransactionBuilderError::Configuration(_))
    ));
}

#[cfg(debug_assertions)]
#[test]
fn test_budget_after_program_instruction_is_flagged() {
    let program = Instruction::new_with_bytes(
        Pubkey::new_unique(),
        &[1],
        vec![AccountMeta::new(Pubkey::new_unique(), false)],
    );
    let out_of_order = vec![
        ComputeBudgetInstruction::set_compute_unit_limit(200_000),
        program,
        ComputeBudgetInstruction::set_compute_unit_price(1),
    ];

    match sanity_check_ix_order(&out_of_order) {
        Err(TransactionBuilderError::InvalidInstructionOrder(msg)) => {
            assert!(msg.contains("position 2"), "{msg}");
        }
        other => panic!("Expected InvalidInstructionOrder, got {other:?}"),
    }
}

#[tokio::test]
async fn test_caller_budget_instruction_after_program_rejected() {
    let ledger = Arc::new(MockLedger::new("primary"));
    let payer = Keypair::new();
    let a = anchor_ix(Pubkey::new_unique(), "buy", &payer.pubkey());
    let late_price = ComputeBudgetInstruction::set_compute_unit_price(9);

    let result = TxBuilder::new(ledger.clone())
        .build(&payer, &[&a, &late_price], None, None)
        .await;

    if cfg!(debug_assertions) {
        assert!(matches!(
            result,
            Err(TransactionBuilderError::InvalidInstructionOrder(_))
        ));
        assert_eq!(ledger.blockhash_requests(), 0);
    }
}
