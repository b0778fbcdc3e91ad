//! Confirmed transaction records
//!
//! RPC responses are mapped once into these plain types so the confirm engine
//! and the fee extractor never touch UI encodings.

use crate::rpc_manager::RpcManagerError;
use solana_sdk::{pubkey::Pubkey, transaction::VersionedTransaction};
use solana_transaction_status::{
    option_serializer::OptionSerializer, EncodedConfirmedTransactionWithStatusMeta, UiInstruction,
    UiTransactionStatusMeta,
};
use std::str::FromStr;

/// A transaction as recorded by the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub slot: u64,
    /// Unix seconds, when the node knows the block time
    pub block_time: Option<i64>,
    pub transaction: VersionedTransaction,
    pub meta: Option<ExecutionMeta>,
}

impl TransactionRecord {
    /// Block time in milliseconds
    pub fn block_time_ms(&self) -> Option<i64> {
        self.block_time.map(|secs| secs.saturating_mul(1000))
    }
}

/// Execution metadata of a landed transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionMeta {
    /// Execution error rendered by the node; `None` means success
    pub err: Option<String>,
    /// Total fee in lamports
    pub fee: u64,
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,
    pub inner_instructions: Vec<InnerInstructions>,
    pub log_messages: Vec<String>,
    pub loaded_writable_addresses: Vec<Pubkey>,
    pub loaded_readonly_addresses: Vec<Pubkey>,
    pub compute_units_consumed: Option<u64>,
}

/// Inner (CPI) instructions invoked by one top-level instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerInstructions {
    /// Index of the top-level instruction
    pub index: u8,
    pub instructions: Vec<InnerInstruction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
    pub stack_height: Option<u32>,
}

impl TryFrom<EncodedConfirmedTransactionWithStatusMeta> for TransactionRecord {
    type Error = RpcManagerError;

    fn try_from(encoded: EncodedConfirmedTransactionWithStatusMeta) -> Result<Self, Self::Error> {
        let transaction = encoded.transaction.transaction.decode().ok_or_else(|| {
            RpcManagerError::Decode("transaction is not binary encoded".to_string())
        })?;
        let meta = encoded
            .transaction
            .meta
            .as_ref()
            .map(convert_meta)
            .transpose()?;

        Ok(Self {
            slot: encoded.slot,
            block_time: encoded.block_time,
            transaction,
            meta,
        })
    }
}

fn convert_meta(meta: &UiTransactionStatusMeta) -> Result<ExecutionMeta, RpcManagerError> {
    let inner_instructions = match &meta.inner_instructions {
        OptionSerializer::Some(inner) => inner
            .iter()
            .map(|set| {
                let instructions = set
                    .instructions
                    .iter()
                    .map(convert_inner_instruction)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(InnerInstructions {
                    index: set.index,
                    instructions,
                })
            })
            .collect::<Result<Vec<_>, RpcManagerError>>()?,
        _ => Vec::new(),
    };

    let log_messages = match &meta.log_messages {
        OptionSerializer::Some(logs) => logs.clone(),
        _ => Vec::new(),
    };

    let compute_units_consumed = match meta.compute_units_consumed {
        OptionSerializer::Some(units) => Some(units),
        _ => None,
    };

    let (loaded_writable_addresses, loaded_readonly_addresses) = match &meta.loaded_addresses {
        OptionSerializer::Some(loaded) => (
            parse_pubkeys(&loaded.writable)?,
            parse_pubkeys(&loaded.readonly)?,
        ),
        _ => (Vec::new(), Vec::new()),
    };

    Ok(ExecutionMeta {
        err: meta.err.as_ref().map(|e| format!("{e:?}")),
        fee: meta.fee,
        pre_balances: meta.pre_balances.clone(),
        post_balances: meta.post_balances.clone(),
        inner_instructions,
        log_messages,
        loaded_writable_addresses,
        loaded_readonly_addresses,
        compute_units_consumed,
    })
}

fn convert_inner_instruction(ix: &UiInstruction) -> Result<InnerInstruction, RpcManagerError> {
    match ix {
        UiInstruction::Compiled(compiled) => {
            let data = bs58::decode(&compiled.data)
                .into_vec()
                .map_err(|e| RpcManagerError::Decode(format!("inner instruction data: {e}")))?;
            Ok(InnerInstruction {
                program_id_index: compiled.program_id_index,
                accounts: compiled.accounts.clone(),
                data,
                stack_height: compiled.stack_height,
            })
        }
        UiInstruction::Parsed(_) => Err(RpcManagerError::Decode(
            "parsed inner instructions are not supported".to_string(),
        )),
    }
}

fn parse_pubkeys(keys: &[String]) -> Result<Vec<Pubkey>, RpcManagerError> {
    keys.iter()
        .map(|k| {
            Pubkey::from_str(k).map_err(|e| RpcManagerError::Decode(format!("address {k}: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{hash::Hash, message::VersionedMessage, signature::Signature};

    #[test]
    fn test_block_time_ms() {
        let record = TransactionRecord {
            slot: 1,
            block_time: Some(1_700_000_000),
            transaction: VersionedTransaction {
                signatures: vec![Signature::default()],
                message: VersionedMessage::Legacy(solana_sdk::message::Message {
                    recent_blockhash: Hash::default(),
                    ..Default::default()
                }),
            },
            meta: None,
        };
        assert_eq!(record.block_time_ms(), Some(1_700_000_000_000));
    }

    #[test]
    fn test_parse_pubkeys() {
        let key = Pubkey::new_unique();
        assert_eq!(parse_pubkeys(&[key.to_string()]).unwrap(), vec![key]);
        assert!(matches!(
            parse_pubkeys(&["nope".to_string()]),
            Err(RpcManagerError::Decode(_))
        ));
    }
}
