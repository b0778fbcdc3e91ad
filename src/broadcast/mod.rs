//! Broadcast and confirmation
//!
//! Takes a signed transaction to a terminal [`ConfirmationOutcome`] over an
//! unreliable submission channel: nodes may drop transactions, blockhashes
//! expire, and acceptance is only learned by polling.

pub mod engine;
pub mod errors;
pub mod outcome;
pub mod plan;

pub use engine::{ConfirmConfig, ConfirmEngine};
pub use errors::BroadcastError;
pub use outcome::{ConfirmationOutcome, ConfirmedTransaction};
pub use plan::BroadcastPlan;
