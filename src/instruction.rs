//! On-chain instruction abstraction
//!
//! Every call that can be composed into a transaction implements
//! [`OnChainInstruction`]: an ordered account list, a target program and an
//! opaque payload. The transaction builder only ever sees this trait, so
//! supporting a new program means adding a builder, nothing else.
//!
//! Construction is the only fallible phase. Once a value exists its accessors
//! are pure; `data()` keeps a `Result` so lazily-encoding implementors can
//! still surface a construction error to the builder untouched.

use crate::amount::{AmountError, TokenAmount};
use crate::discriminator::{self, GLOBAL_NAMESPACE};
use crate::registry::ProgramRegistry;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstructionError {
    /// Payload could not be encoded
    #[error("Instruction encoding failed (program={program}): {reason}")]
    Encoding { program: String, reason: String },

    /// An amount argument was rejected by the codec
    #[error("Invalid amount argument: {0}")]
    Amount(#[from] AmountError),

    /// A program derived address could not be found
    #[error("Address derivation failed (program={program}): {reason}")]
    AddressDerivation { program: String, reason: String },
}

/// The capability every instruction builder must provide
pub trait OnChainInstruction: Send + Sync {
    /// Accounts in the exact order the program expects
    fn accounts(&self) -> &[AccountMeta];

    /// Program that will execute the instruction
    fn program_id(&self) -> Pubkey;

    /// Serialized payload (discriminator followed by arguments)
    fn data(&self) -> Result<Vec<u8>, InstructionError>;
}

impl OnChainInstruction for Instruction {
    fn accounts(&self) -> &[AccountMeta] {
        &self.accounts
    }

    fn program_id(&self) -> Pubkey {
        self.program_id
    }

    fn data(&self) -> Result<Vec<u8>, InstructionError> {
        Ok(self.data.clone())
    }
}

/// Materialize any [`OnChainInstruction`] into an sdk `Instruction`.
pub fn to_instruction(ix: &dyn OnChainInstruction) -> Result<Instruction, InstructionError> {
    Ok(Instruction {
        program_id: ix.program_id(),
        accounts: ix.accounts().to_vec(),
        data: ix.data()?,
    })
}

/// A fully encoded, immutable instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedInstruction {
    program_id: Pubkey,
    accounts: Vec<AccountMeta>,
    data: Vec<u8>,
}

impl EncodedInstruction {
    pub fn new(program_id: Pubkey, accounts: Vec<AccountMeta>, data: Vec<u8>) -> Self {
        Self {
            program_id,
            accounts,
            data,
        }
    }

    /// Raw payload without cloning
    pub fn data_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl OnChainInstruction for EncodedInstruction {
    fn accounts(&self) -> &[AccountMeta] {
        &self.accounts
    }

    fn program_id(&self) -> Pubkey {
        self.program_id
    }

    fn data(&self) -> Result<Vec<u8>, InstructionError> {
        Ok(self.data.clone())
    }
}

/// An account slot that a program treats as optional.
///
/// Programs that accept "no account" still expect a key in that position.
/// The substitution rule is explicit: an absent slot is filled with the
/// registry's `absent_account_sentinel` (the wrapped SOL mint on mainnet),
/// unsigned, with the slot's own writability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalAccount {
    Present(Pubkey),
    Absent,
}

impl OptionalAccount {
    pub fn resolve(&self, registry: &ProgramRegistry) -> Pubkey {
        match self {
            Self::Present(key) => *key,
            Self::Absent => registry.absent_account_sentinel,
        }
    }

    /// Account meta for this slot; never a signer
    pub fn to_account_meta(&self, is_writable: bool, registry: &ProgramRegistry) -> AccountMeta {
        let pubkey = self.resolve(registry);
        if is_writable {
            AccountMeta::new(pubkey, false)
        } else {
            AccountMeta::new_readonly(pubkey, false)
        }
    }
}

impl From<Option<Pubkey>> for OptionalAccount {
    fn from(value: Option<Pubkey>) -> Self {
        value.map_or(Self::Absent, Self::Present)
    }
}

/// Builder for discriminator-tagged instructions with little-endian arguments.
///
/// Argument errors are deferred and returned by [`AnchorInstructionBuilder::build`],
/// so a builder chain reads top to bottom like the program's argument list.
#[derive(Debug, Clone)]
pub struct AnchorInstructionBuilder {
    program_id: Pubkey,
    accounts: Vec<AccountMeta>,
    data: Vec<u8>,
    error: Option<InstructionError>,
}

impl AnchorInstructionBuilder {
    /// Anchor handler in the `global` namespace
    pub fn anchor(program_id: Pubkey, name: &str) -> Self {
        Self::anchor_namespaced(program_id, GLOBAL_NAMESPACE, name)
    }

    pub fn anchor_namespaced(program_id: Pubkey, namespace: &str, name: &str) -> Self {
        Self::with_tag(program_id, &discriminator::derive(namespace, name))
    }

    /// Non-Anchor program dispatching on a fixed tag (e.g. a single opcode byte)
    pub fn with_tag(program_id: Pubkey, tag: &[u8]) -> Self {
        Self {
            program_id,
            accounts: Vec::new(),
            data: tag.to_vec(),
            error: None,
        }
    }

    pub fn account(mut self, pubkey: Pubkey, is_signer: bool, is_writable: bool) -> Self {
        self.accounts.push(AccountMeta {
            pubkey,
            is_signer,
            is_writable,
        });
        self
    }

    pub fn account_meta(mut self, meta: AccountMeta) -> Self {
        self.accounts.push(meta);
        self
    }

    pub fn optional_account(
        mut self,
        slot: OptionalAccount,
        is_writable: bool,
        registry: &ProgramRegistry,
    ) -> Self {
        self.accounts.push(slot.to_account_meta(is_writable, registry));
        self
    }

    pub fn arg_u8(mut self, value: u8) -> Self {
        self.data.push(value);
        self
    }

    pub fn arg_bool(self, value: bool) -> Self {
        self.arg_u8(u8::from(value))
    }

    pub fn arg_u16(mut self, value: u16) -> Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn arg_u32(mut self, value: u32) -> Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn arg_u64(mut self, value: u64) -> Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn arg_pubkey(mut self, value: &Pubkey) -> Self {
        self.data.extend_from_slice(value.as_ref());
        self
    }

    /// Encode a decimal amount as raw `u64`, truncating extra precision
    pub fn arg_amount(self, amount: &TokenAmount) -> Self {
        match amount.to_raw() {
            Ok(raw) => self.arg_u64(raw),
            Err(e) => self.fail(e.into()),
        }
    }

    fn fail(mut self, error: InstructionError) -> Self {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self
    }

    pub fn build(self) -> Result<EncodedInstruction, InstructionError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(EncodedInstruction::new(self.program_id, self.accounts, self.data))
    }
}

/// Associated token account of `owner` for `mint` under `token_program`.
pub fn derive_associated_token_address(
    owner: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
    registry: &ProgramRegistry,
) -> Result<Pubkey, InstructionError> {
    Pubkey::try_find_program_address(
        &[owner.as_ref(), token_program.as_ref(), mint.as_ref()],
        &registry.associated_token_program,
    )
    .map(|(address, _bump)| address)
    .ok_or_else(|| InstructionError::AddressDerivation {
        program: registry.associated_token_program.to_string(),
        reason: format!("no valid bump for owner={owner} mint={mint}"),
    })
}

/// Native SOL transfer of a decimal amount (e.g. a relay tip).
pub fn sol_transfer(
    from: &Pubkey,
    to: &Pubkey,
    amount: &TokenAmount,
) -> Result<Instruction, InstructionError> {
    let lamports = amount.to_raw()?;
    #[allow(deprecated)]
    let ix = solana_sdk::system_instruction::transfer(from, to, lamports);
    Ok(ix)
}
