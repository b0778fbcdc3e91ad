//! Benchmarks for transaction assembly
//!
//! - Instruction planning with and without compute budget instructions
//! - v0 compile + sign
//! - Fee extraction from a landed transaction

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use txflow::fees::extract_fee_breakdown;
use txflow::instruction::{AnchorInstructionBuilder, EncodedInstruction};
use txflow::rpc_manager::ExecutionMeta;
use txflow::tx_builder::{compile_and_sign, plan_instructions};
use txflow::{FeeParams, OnChainInstruction, TokenAmount};

fn buy_ix(payer: &Pubkey) -> EncodedInstruction {
    let mut builder = AnchorInstructionBuilder::anchor(Pubkey::new_unique(), "buy")
        .account(*payer, true, true);
    for _ in 0..10 {
        builder = builder.account(Pubkey::new_unique(), false, true);
    }
    builder
        .arg_amount(&TokenAmount::new("1000.5", 6))
        .arg_amount(&TokenAmount::sol("0.25"))
        .build()
        .expect("valid instruction")
}

fn bench_plan(c: &mut Criterion) {
    let payer = Pubkey::new_unique();
    let ixs: Vec<EncodedInstruction> = (0..4).map(|_| buy_ix(&payer)).collect();
    let refs: Vec<&dyn OnChainInstruction> = ixs.iter().map(|ix| ix as _).collect();

    let mut group = c.benchmark_group("plan_instructions");
    for (label, fee) in [
        ("no_budget", FeeParams::new(0, 200_000)),
        ("with_budget", FeeParams::new(50_000, 200_000)),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(label), &fee, |b, fee| {
            b.iter(|| plan_instructions(black_box(&refs), Some(fee)).expect("plan"))
        });
    }
    group.finish();
}

fn bench_compile_and_sign(c: &mut Criterion) {
    let payer = Keypair::new();
    let mut group = c.benchmark_group("compile_and_sign");

    for count in [1usize, 3, 5] {
        let ixs: Vec<EncodedInstruction> = (0..count).map(|_| buy_ix(&payer.pubkey())).collect();
        let refs: Vec<&dyn OnChainInstruction> = ixs.iter().map(|ix| ix as _).collect();
        let plan = plan_instructions(&refs, Some(&FeeParams::new(10_000, 300_000))).expect("plan");
        let blockhash = Hash::new_unique();

        group.bench_with_input(BenchmarkId::from_parameter(count), &plan, |b, plan| {
            b.iter(|| {
                compile_and_sign(&payer, black_box(&plan.instructions), blockhash).expect("sign")
            })
        });
    }
    group.finish();
}

fn bench_fee_extraction(c: &mut Criterion) {
    let payer = Keypair::new();
    let ix = buy_ix(&payer.pubkey());
    let plan = plan_instructions(&[&ix], Some(&FeeParams::new(10_000, 300_000))).expect("plan");
    let tx = compile_and_sign(&payer, &plan.instructions, Hash::new_unique()).expect("sign");
    let meta = ExecutionMeta {
        fee: 8_000,
        ..Default::default()
    };

    c.bench_function("extract_fee_breakdown", |b| {
        b.iter(|| extract_fee_breakdown(black_box(&meta), black_box(&tx)).expect("fees"))
    });
}

criterion_group!(benches, bench_plan, bench_compile_and_sign, bench_fee_extraction);
criterion_main!(benches);
