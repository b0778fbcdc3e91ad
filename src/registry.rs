//! Well-known program and account identifiers
//!
//! Builders receive a [`ProgramRegistry`] instead of reaching for ambient
//! constants. The registry is resolved once at startup (mainnet defaults or
//! configuration overrides) and is immutable afterwards.

use serde::{Deserialize, Serialize};
use solana_sdk::{pubkey, pubkey::Pubkey};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid pubkey for '{name}': {value}")]
pub struct RegistryError {
    pub name: String,
    pub value: String,
}

/// Immutable table of program and sysvar ids used by instruction builders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramRegistry {
    pub system_program: Pubkey,
    pub compute_budget_program: Pubkey,
    pub token_program: Pubkey,
    pub token_2022_program: Pubkey,
    pub associated_token_program: Pubkey,
    pub rent_sysvar: Pubkey,
    /// Placeholder passed in optional account slots that are left empty
    pub absent_account_sentinel: Pubkey,
}

/// String overrides, as read from configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryOverrides {
    pub token_program: Option<String>,
    pub token_2022_program: Option<String>,
    pub associated_token_program: Option<String>,
    pub absent_account_sentinel: Option<String>,
}

const TOKEN_PROGRAM: Pubkey = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
const TOKEN_2022_PROGRAM: Pubkey = pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");
const ASSOCIATED_TOKEN_PROGRAM: Pubkey = pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");
/// Wrapped SOL mint, which AMM programs accept in unused account slots
const WRAPPED_SOL_MINT: Pubkey = pubkey!("So11111111111111111111111111111111111111112");

impl ProgramRegistry {
    /// Mainnet-beta ids
    pub fn mainnet() -> Self {
        Self {
            system_program: solana_sdk::system_program::id(),
            compute_budget_program: solana_sdk::compute_budget::id(),
            token_program: TOKEN_PROGRAM,
            token_2022_program: TOKEN_2022_PROGRAM,
            associated_token_program: ASSOCIATED_TOKEN_PROGRAM,
            rent_sysvar: solana_sdk::sysvar::rent::id(),
            absent_account_sentinel: WRAPPED_SOL_MINT,
        }
    }

    /// Mainnet ids with configured overrides applied
    pub fn with_overrides(overrides: &RegistryOverrides) -> Result<Self, RegistryError> {
        let mut registry = Self::mainnet();
        apply(&mut registry.token_program, "token_program", &overrides.token_program)?;
        apply(
            &mut registry.token_2022_program,
            "token_2022_program",
            &overrides.token_2022_program,
        )?;
        apply(
            &mut registry.associated_token_program,
            "associated_token_program",
            &overrides.associated_token_program,
        )?;
        apply(
            &mut registry.absent_account_sentinel,
            "absent_account_sentinel",
            &overrides.absent_account_sentinel,
        )?;
        Ok(registry)
    }

    pub fn is_compute_budget(&self, program_id: &Pubkey) -> bool {
        *program_id == self.compute_budget_program
    }
}

impl Default for ProgramRegistry {
    fn default() -> Self {
        Self::mainnet()
    }
}

fn apply(slot: &mut Pubkey, name: &str, value: &Option<String>) -> Result<(), RegistryError> {
    if let Some(value) = value {
        *slot = Pubkey::from_str(value).map_err(|_| RegistryError {
            name: name.to_string(),
            value: value.clone(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_ids() {
        let registry = ProgramRegistry::mainnet();
        assert_eq!(
            registry.compute_budget_program.to_string(),
            "ComputeBudget111111111111111111111111111111"
        );
        assert_eq!(registry.system_program.to_string(), "11111111111111111111111111111111");
        assert_eq!(
            registry.token_program.to_string(),
            "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"
        );
        assert!(registry.is_compute_budget(&solana_sdk::compute_budget::id()));
        assert_eq!(
            registry.absent_account_sentinel.to_string(),
            "So11111111111111111111111111111111111111112"
        );
    }

    #[test]
    fn test_overrides() {
        let custom = Pubkey::new_unique();
        let overrides = RegistryOverrides {
            absent_account_sentinel: Some(custom.to_string()),
            ..Default::default()
        };
        let registry = ProgramRegistry::with_overrides(&overrides).unwrap();
        assert_eq!(registry.absent_account_sentinel, custom);
        assert_eq!(registry.token_program, ProgramRegistry::mainnet().token_program);
    }

    #[test]
    fn test_invalid_override() {
        let overrides = RegistryOverrides {
            token_program: Some("not-a-key".to_string()),
            ..Default::default()
        };
        let err = ProgramRegistry::with_overrides(&overrides).unwrap_err();
        assert_eq!(err.name, "token_program");
    }
}
