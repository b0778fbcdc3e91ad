//! Instruction discriminators
//!
//! Anchor-style programs dispatch on the first 8 bytes of instruction data.
//! The selector is the first 8 bytes of `sha256("<namespace>:<name>")`.

use sha2::{Digest, Sha256};

/// Length of a discriminator in bytes
pub const DISCRIMINATOR_LEN: usize = 8;

/// Namespace used by Anchor for instruction handlers
pub const GLOBAL_NAMESPACE: &str = "global";

/// 8-byte function selector
pub type Discriminator = [u8; DISCRIMINATOR_LEN];

/// Derive the discriminator for `namespace:name`.
#[must_use]
pub fn derive(namespace: &str, name: &str) -> Discriminator {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b":");
    hasher.update(name.as_bytes());
    let hash = hasher.finalize();

    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&hash[..DISCRIMINATOR_LEN]);
    out
}

/// Discriminator of an instruction handler (`global:<name>`).
#[inline]
#[must_use]
pub fn anchor_instruction(name: &str) -> Discriminator {
    derive(GLOBAL_NAMESPACE, name)
}

/// Discriminator of an account type (`account:<Name>`).
#[inline]
#[must_use]
pub fn anchor_account(name: &str) -> Discriminator {
    derive("account", name)
}

/// Discriminator of an emitted event (`event:<Name>`).
#[inline]
#[must_use]
pub fn anchor_event(name: &str) -> Discriminator {
    derive("event", name)
}
