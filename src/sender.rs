//! Build-then-confirm facade
//!
//! [`Sender::send_tx`] builds, signs and confirms in one call, fanning copies
//! out to the configured broadcast endpoints. [`Sender::send_tx_via_relay`]
//! appends a SOL tip transfer and resubmits through a relay while polling the
//! regular ledger.
//!
//! Both steps of one send share a [`CorrelationId`] so their log events can
//! be joined.

use crate::amount::TokenAmount;
use crate::broadcast::{BroadcastError, BroadcastPlan, ConfirmEngine, ConfirmedTransaction};
use crate::config::EngineConfig;
use crate::fees::{FeeBreakdown, FeeError};
use crate::instruction::{sol_transfer, OnChainInstruction};
use crate::metrics::EngineMetrics;
use crate::observability::CorrelationId;
use crate::registry::ProgramRegistry;
use crate::rpc_manager::{LedgerRpc, SolanaRpc};
use crate::tx_builder::{FeeParams, TransactionBuilderError, TxBuilder};
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signer};
use std::sync::Arc;
use tracing::info;

/// Relay submission target and the tip it charges
#[derive(Debug, Clone)]
pub struct RelayTarget {
    pub endpoint: Arc<dyn LedgerRpc>,
    pub tip_account: Pubkey,
    /// Tip in SOL; extra precision beyond lamports is truncated
    pub tip_amount_sol: String,
}

pub struct Sender {
    builder: TxBuilder,
    engine: ConfirmEngine,
    fanout: Vec<Arc<dyn LedgerRpc>>,
    relay: Option<RelayTarget>,
    /// Used when a call passes no fee parameters of its own
    fee_params: Option<FeeParams>,
    registry: ProgramRegistry,
}

impl Sender {
    pub fn new(builder: TxBuilder, engine: ConfirmEngine) -> Self {
        Self {
            builder,
            engine,
            fanout: Vec::new(),
            relay: None,
            fee_params: None,
            registry: ProgramRegistry::mainnet(),
        }
    }

    pub fn with_fanout(mut self, fanout: Vec<Arc<dyn LedgerRpc>>) -> Self {
        self.fanout = fanout;
        self
    }

    pub fn with_relay(mut self, relay: RelayTarget) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn with_fee_params(mut self, fee_params: FeeParams) -> Self {
        self.fee_params = Some(fee_params);
        self
    }

    pub fn with_registry(mut self, registry: ProgramRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Wire RPC clients, relay, default fees, program ids and metrics from a
    /// validated configuration
    pub fn from_config(
        config: &EngineConfig,
        metrics: Option<Arc<EngineMetrics>>,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let timeout = config.rpc_timeout();

        let ledger: Arc<dyn LedgerRpc> = Arc::new(SolanaRpc::new(&config.rpc.primary_url, timeout));
        let fanout = config
            .rpc
            .broadcast_urls
            .iter()
            .map(|url| Arc::new(SolanaRpc::new(url, timeout)) as Arc<dyn LedgerRpc>)
            .collect();

        let mut builder = TxBuilder::new(Arc::clone(&ledger));
        let mut engine = ConfirmEngine::new(ledger, config.confirm_config());
        if let Some(metrics) = metrics {
            builder = builder.with_metrics(Arc::clone(&metrics));
            engine = engine.with_metrics(metrics);
        }

        let mut sender = Self::new(builder, engine)
            .with_fanout(fanout)
            .with_fee_params(config.fee_params())
            .with_registry(config.registry()?);
        if let (Some(url), Some(tip_account)) = (&config.relay.url, config.tip_account()?) {
            sender = sender.with_relay(RelayTarget {
                endpoint: Arc::new(SolanaRpc::new(url, timeout)),
                tip_account,
                tip_amount_sol: config.relay.tip_amount_sol.clone(),
            });
        }

        info!(
            primary = %config.rpc.primary_url,
            fanout = config.rpc.broadcast_urls.len(),
            relay = sender.relay.is_some(),
            compute_unit_price = config.fees.compute_unit_price_micro_lamports,
            "Sender initialized"
        );
        Ok(sender)
    }

    pub fn engine(&self) -> &ConfirmEngine {
        &self.engine
    }

    pub fn relay(&self) -> Option<&RelayTarget> {
        self.relay.as_ref()
    }

    pub fn fee_params(&self) -> Option<&FeeParams> {
        self.fee_params.as_ref()
    }

    pub fn registry(&self) -> &ProgramRegistry {
        &self.registry
    }

    /// Fee breakdown of a transaction confirmed by this sender, resolved
    /// against its program registry.
    pub fn fee_breakdown(&self, confirmed: &ConfirmedTransaction) -> Result<FeeBreakdown, FeeError> {
        FeeBreakdown::from_confirmed_with(confirmed, &self.registry)
    }

    /// Build, sign and confirm through the regular ledger and fan-out endpoints.
    ///
    /// `fee_params` falls back to the sender's configured defaults.
    pub async fn send_tx(
        &self,
        signer: &dyn Signer,
        instructions: &[&dyn OnChainInstruction],
        pinned_blockhash: Option<Hash>,
        fee_params: Option<&FeeParams>,
    ) -> Result<ConfirmedTransaction, BroadcastError> {
        let context_id = CorrelationId::new();
        let tx = self
            .builder
            .build_with_context(
                signer,
                instructions,
                pinned_blockhash,
                fee_params.or(self.fee_params.as_ref()),
                &context_id,
            )
            .await?;

        let plan = BroadcastPlan::with_fanout(self.fanout.clone());
        self.engine
            .confirm_with_context(&tx, &plan, context_id)
            .await
            .into_result()
    }

    /// Append a tip transfer and confirm through the configured relay.
    pub async fn send_tx_via_relay(
        &self,
        signer: &dyn Signer,
        instructions: &[&dyn OnChainInstruction],
        pinned_blockhash: Option<Hash>,
        fee_params: Option<&FeeParams>,
    ) -> Result<ConfirmedTransaction, BroadcastError> {
        let relay = self
            .relay
            .as_ref()
            .ok_or_else(|| BroadcastError::Configuration("no relay configured".to_string()))?;
        let payer = signer
            .try_pubkey()
            .map_err(|e| TransactionBuilderError::Signing(e.to_string()))?;

        let tip = sol_transfer(
            &payer,
            &relay.tip_account,
            &TokenAmount::sol(relay.tip_amount_sol.as_str()),
        )
        .map_err(TransactionBuilderError::from)?;

        let mut with_tip: Vec<&dyn OnChainInstruction> = instructions.to_vec();
        with_tip.push(&tip);

        let context_id = CorrelationId::new();
        let tx = self
            .builder
            .build_with_context(
                signer,
                &with_tip,
                pinned_blockhash,
                fee_params.or(self.fee_params.as_ref()),
                &context_id,
            )
            .await?;

        let plan = BroadcastPlan::relay(Arc::clone(&relay.endpoint));
        self.engine
            .confirm_with_context(&tx, &plan, context_id)
            .await
            .into_result()
    }
}
