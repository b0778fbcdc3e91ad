//! Test Utilities Module
//!
//! In-memory ledger for deterministic builder and confirm-engine tests.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use crate::rpc_manager::{ExecutionMeta, LedgerRpc, RpcManagerError, TransactionRecord};
use async_trait::async_trait;
use solana_sdk::{hash::Hash, signature::Signature, transaction::VersionedTransaction};
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

/// Slot assigned to records created by the mock
pub const MOCK_SLOT: u64 = 4242;

/// Block time (unix seconds) assigned to records created by the mock
pub const MOCK_BLOCK_TIME: i64 = 1_700_000_000;

/// Transaction lands once this many submissions have been seen
#[derive(Debug, Clone)]
struct Landing {
    after_sends: u32,
    err: Option<String>,
    fee: u64,
}

#[derive(Debug, Default)]
struct MockState {
    blockhash_error: Option<String>,
    blockhash_requests: u32,
    send_script: VecDeque<String>,
    send_error: Option<String>,
    send_delay: Option<Duration>,
    sends: u32,
    submitted: Vec<Signature>,
    landing: Option<Landing>,
    query_error: Option<String>,
    queries: u32,
    records: HashMap<Signature, TransactionRecord>,
}

/// Scriptable [`LedgerRpc`] that never touches the network
#[derive(Debug, Clone)]
pub struct MockLedger {
    endpoint: String,
    blockhash: Hash,
    state: Arc<Mutex<MockState>>,
}

impl MockLedger {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            blockhash: Hash::new_unique(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // a panicking test thread must not hide the state from the assertions
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Blockhash returned by `get_latest_blockhash`
    pub fn blockhash(&self) -> Hash {
        self.blockhash
    }

    pub fn fail_blockhash(&self, message: &str) {
        self.state().blockhash_error = Some(message.to_string());
    }

    /// Queue one submission error per entry, consumed in order
    pub fn script_send_errors<I, S>(&self, messages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state()
            .send_script
            .extend(messages.into_iter().map(Into::into));
    }

    /// Every submission fails with `message` once the script is drained
    pub fn always_fail_send(&self, message: &str) {
        self.state().send_error = Some(message.to_string());
    }

    pub fn set_send_delay(&self, delay: Duration) {
        self.state().send_delay = Some(delay);
    }

    /// The submitted transaction appears once `after_sends` submissions reached this ledger
    pub fn land_after(&self, after_sends: u32, err: Option<&str>, fee: u64) {
        self.state().landing = Some(Landing {
            after_sends,
            err: err.map(str::to_string),
            fee,
        });
    }

    pub fn fail_queries(&self, message: &str) {
        self.state().query_error = Some(message.to_string());
    }

    pub fn insert_record(&self, record: TransactionRecord) {
        let signature = record.transaction.signatures[0];
        self.state().records.insert(signature, record);
    }

    pub fn blockhash_requests(&self) -> u32 {
        self.state().blockhash_requests
    }

    pub fn send_count(&self) -> u32 {
        self.state().sends
    }

    pub fn query_count(&self) -> u32 {
        self.state().queries
    }

    pub fn submitted(&self) -> Vec<Signature> {
        self.state().submitted.clone()
    }
}

/// Record for `tx` as the mock ledger would report it
pub fn record_for(tx: &VersionedTransaction, err: Option<&str>, fee: u64) -> TransactionRecord {
    TransactionRecord {
        slot: MOCK_SLOT,
        block_time: Some(MOCK_BLOCK_TIME),
        transaction: tx.clone(),
        meta: Some(ExecutionMeta {
            err: err.map(str::to_string),
            fee,
            ..Default::default()
        }),
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send_transaction(
        &self,
        tx: &VersionedTransaction,
        _skip_preflight: bool,
    ) -> Result<Signature, RpcManagerError> {
        let delay = self.state().send_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        state.sends += 1;
        let signature = tx.signatures[0];
        state.submitted.push(signature);

        if let Some(landing) = state.landing.clone() {
            if state.sends >= landing.after_sends && !state.records.contains_key(&signature) {
                let record = record_for(tx, landing.err.as_deref(), landing.fee);
                state.records.insert(signature, record);
            }
        }

        if let Some(message) = state.send_script.pop_front() {
            return Err(RpcManagerError::from_message(&self.endpoint, &message));
        }
        if let Some(message) = &state.send_error {
            return Err(RpcManagerError::from_message(&self.endpoint, message));
        }
        Ok(signature)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, RpcManagerError> {
        let mut state = self.state();
        state.blockhash_requests += 1;
        match &state.blockhash_error {
            Some(message) => Err(RpcManagerError::from_message(&self.endpoint, message)),
            None => Ok(self.blockhash),
        }
    }

    async fn get_transaction(
        &self,
        signature: &Signature,
    ) -> Result<Option<TransactionRecord>, RpcManagerError> {
        let mut state = self.state();
        state.queries += 1;
        if let Some(message) = &state.query_error {
            return Err(RpcManagerError::from_message(&self.endpoint, message));
        }
        Ok(state.records.get(signature).cloned())
    }
}
