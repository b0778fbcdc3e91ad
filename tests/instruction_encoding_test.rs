//! Integration tests for instruction encoding
//!
//! Exercises a bonding-curve style `buy` instruction the way a downstream
//! program binding would assemble it.

use solana_sdk::{instruction::AccountMeta, pubkey::Pubkey};
use txflow::amount::{AmountError, TokenAmount};
use txflow::discriminator::{self, DISCRIMINATOR_LEN};
use txflow::instruction::{
    derive_associated_token_address, AnchorInstructionBuilder, EncodedInstruction,
    InstructionError, OptionalAccount,
};
use txflow::registry::ProgramRegistry;
use txflow::OnChainInstruction;

struct BuyAccounts {
    global: Pubkey,
    mint: Pubkey,
    bonding_curve: Pubkey,
    user: Pubkey,
    referrer: Option<Pubkey>,
}

fn buy(
    program: Pubkey,
    accounts: &BuyAccounts,
    amount: &TokenAmount,
    max_sol_cost: &TokenAmount,
    registry: &ProgramRegistry,
) -> Result<EncodedInstruction, InstructionError> {
    let user_ata = derive_associated_token_address(
        &accounts.user,
        &accounts.mint,
        &registry.token_program,
        registry,
    )?;

    AnchorInstructionBuilder::anchor(program, "buy")
        .account(accounts.global, false, false)
        .account(accounts.mint, false, false)
        .account(accounts.bonding_curve, false, true)
        .account(user_ata, false, true)
        .account(accounts.user, true, true)
        .optional_account(OptionalAccount::from(accounts.referrer), true, registry)
        .account(registry.system_program, false, false)
        .account(registry.token_program, false, false)
        .arg_amount(amount)
        .arg_amount(max_sol_cost)
        .build()
}

fn accounts(referrer: Option<Pubkey>) -> BuyAccounts {
    BuyAccounts {
        global: Pubkey::new_unique(),
        mint: Pubkey::new_unique(),
        bonding_curve: Pubkey::new_unique(),
        user: Pubkey::new_unique(),
        referrer,
    }
}

#[test]
fn test_buy_payload_layout() {
    let registry = ProgramRegistry::mainnet();
    let program = Pubkey::new_unique();
    let ix = buy(
        program,
        &accounts(None),
        &TokenAmount::new("1500.25", 6),
        &TokenAmount::sol("0.05"),
        &registry,
    )
    .unwrap();

    let data = ix.data().unwrap();
    assert_eq!(data.len(), DISCRIMINATOR_LEN + 16);
    assert_eq!(
        data[..DISCRIMINATOR_LEN],
        discriminator::anchor_instruction("buy")
    );
    assert_eq!(hex::encode(&data[..DISCRIMINATOR_LEN]), "66063d1201daebea");
    assert_eq!(
        u64::from_le_bytes(data[8..16].try_into().unwrap()),
        1_500_250_000
    );
    assert_eq!(
        u64::from_le_bytes(data[16..24].try_into().unwrap()),
        50_000_000
    );
    assert_eq!(ix.program_id(), program);
}

#[test]
fn test_account_order_and_optional_slot() {
    let registry = ProgramRegistry::mainnet();
    let referrer = Pubkey::new_unique();

    let with_referrer = buy(
        Pubkey::new_unique(),
        &accounts(Some(referrer)),
        &TokenAmount::new("1", 6),
        &TokenAmount::sol("1"),
        &registry,
    )
    .unwrap();
    assert_eq!(with_referrer.accounts()[5], AccountMeta::new(referrer, false));
    assert!(with_referrer.accounts()[4].is_signer);

    let without = buy(
        Pubkey::new_unique(),
        &accounts(None),
        &TokenAmount::new("1", 6),
        &TokenAmount::sol("1"),
        &registry,
    )
    .unwrap();
    assert_eq!(without.accounts().len(), 8);
    assert_eq!(
        without.accounts()[5],
        AccountMeta::new(registry.absent_account_sentinel, false)
    );
}

#[test]
fn test_bad_amount_fails_the_whole_instruction() {
    let registry = ProgramRegistry::mainnet();
    let err = buy(
        Pubkey::new_unique(),
        &accounts(None),
        &TokenAmount::new("-3", 6),
        &TokenAmount::sol("1"),
        &registry,
    )
    .unwrap_err();
    assert!(matches!(err, InstructionError::Amount(AmountError::Negative(_))));

    let err = buy(
        Pubkey::new_unique(),
        &accounts(None),
        &TokenAmount::new("1", 6),
        &TokenAmount::sol("99999999999999999999"),
        &registry,
    )
    .unwrap_err();
    assert!(matches!(err, InstructionError::Amount(AmountError::Overflow { .. })));
}

#[test]
fn test_encoding_is_deterministic() {
    let registry = ProgramRegistry::mainnet();
    let program = Pubkey::new_unique();
    let accts = accounts(None);
    let amount = TokenAmount::new("42.000001", 6);
    let cost = TokenAmount::sol("0.1");

    let first = buy(program, &accts, &amount, &cost, &registry).unwrap();
    let second = buy(program, &accts, &amount, &cost, &registry).unwrap();
    assert_eq!(first, second);
}
