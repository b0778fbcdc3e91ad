use super::{LedgerRpc, RpcManagerError, TransactionRecord};
use async_trait::async_trait;
use solana_client::{
    client_error::ClientErrorKind,
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcSendTransactionConfig, RpcTransactionConfig},
};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, signature::Signature,
    transaction::VersionedTransaction,
};
use solana_transaction_status::UiTransactionEncoding;
use std::{fmt, sync::Arc, time::Duration};
use tracing::debug;

/// [`LedgerRpc`] over the nonblocking `solana-client` RPC client
#[derive(Clone)]
pub struct SolanaRpc {
    client: Arc<RpcClient>,
    endpoint: String,
}

impl SolanaRpc {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let endpoint = url.into();
        let client = RpcClient::new_with_timeout_and_commitment(
            endpoint.clone(),
            timeout,
            CommitmentConfig::confirmed(),
        );
        Self {
            client: Arc::new(client),
            endpoint,
        }
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }
}

impl fmt::Debug for SolanaRpc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolanaRpc")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl LedgerRpc for SolanaRpc {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send_transaction(
        &self,
        tx: &VersionedTransaction,
        skip_preflight: bool,
    ) -> Result<Signature, RpcManagerError> {
        let config = RpcSendTransactionConfig {
            skip_preflight,
            encoding: Some(UiTransactionEncoding::Base64),
            ..Default::default()
        };
        self.client
            .send_transaction_with_config(tx, config)
            .await
            .map_err(|e| RpcManagerError::from_client_error(e, &self.endpoint))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, RpcManagerError> {
        let (blockhash, _last_valid_height) = self
            .client
            .get_latest_blockhash_with_commitment(CommitmentConfig::finalized())
            .await
            .map_err(|e| RpcManagerError::from_client_error(e, &self.endpoint))?;
        Ok(blockhash)
    }

    async fn get_transaction(
        &self,
        signature: &Signature,
    ) -> Result<Option<TransactionRecord>, RpcManagerError> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Base64),
            commitment: Some(CommitmentConfig::confirmed()),
            max_supported_transaction_version: Some(0),
        };

        match self.client.get_transaction_with_config(signature, config).await {
            Ok(encoded) => TransactionRecord::try_from(encoded).map(Some),
            // Unknown signatures come back as a null result
            Err(e) if matches!(e.kind(), ClientErrorKind::SerdeJson(_)) => {
                debug!(endpoint = %self.endpoint, signature = %signature, "Transaction not found yet");
                Ok(None)
            }
            Err(e) => Err(RpcManagerError::from_client_error(e, &self.endpoint)),
        }
    }
}
