//! Compute unit price selection

use crate::tx_builder::FeeParams;
use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;

/// Source of a compute unit price for a set of touched accounts.
///
/// HTTP-backed estimators live outside this crate and plug in here.
#[async_trait]
pub trait PriorityFeeEstimator: Send + Sync {
    /// Price in micro-lamports per compute unit
    async fn compute_unit_price(&self, accounts: &[Pubkey]) -> anyhow::Result<u64>;
}

/// Always returns the configured price
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPriorityFee {
    pub micro_lamports: u64,
}

impl FixedPriorityFee {
    pub fn new(micro_lamports: u64) -> Self {
        Self { micro_lamports }
    }
}

#[async_trait]
impl PriorityFeeEstimator for FixedPriorityFee {
    async fn compute_unit_price(&self, _accounts: &[Pubkey]) -> anyhow::Result<u64> {
        Ok(self.micro_lamports)
    }
}

/// Ask `estimator` for a price and pair it with `compute_unit_limit`.
pub async fn estimate_fee_params(
    estimator: &dyn PriorityFeeEstimator,
    accounts: &[Pubkey],
    compute_unit_limit: u32,
) -> anyhow::Result<FeeParams> {
    let price = estimator.compute_unit_price(accounts).await?;
    Ok(FeeParams::new(price, compute_unit_limit))
}
