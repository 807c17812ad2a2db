//! error types for the mixer core

use thiserror::Error;

use crate::ledger::TransferError;
use crate::Digest;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    // === validation errors (nothing mutated) ===
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("unknown merkle root {0:?}")]
    UnknownRoot(Digest),

    #[error("nullifier already spent: {0:?}")]
    DoubleSpend(Digest),

    #[error("session digest mismatch: expected {expected:?}, got {actual:?}")]
    SessionDigestMismatch { expected: Digest, actual: Digest },

    #[error("invalid proof")]
    InvalidProof,

    #[error("incorrect value submitted: expected {expected}, offered {offered}")]
    IncorrectValueSubmitted { expected: u128, offered: u128 },

    // === transfer errors (staged state reverted) ===
    #[error("deposit of {amount} failed: {source}")]
    DepositFailed { amount: u128, source: TransferError },

    #[error("refund of {amount} failed: {source}")]
    RefundFailed { amount: u128, source: TransferError },

    #[error("payout of {amount} failed: {source}")]
    PayoutFailed { amount: u128, source: TransferError },

    // === protocol limits ===
    #[error("commitment tree full: depth {depth} holds {capacity} leaves")]
    CapacityExceeded { depth: u32, capacity: u64 },

    #[error("index {index} out of range (bound {bound})")]
    IndexOutOfRange { index: usize, bound: usize },

    // === configuration errors ===
    #[error("invalid config: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// true for errors raised by the transfer collaborator
    pub fn is_transfer_failure(&self) -> bool {
        matches!(
            self,
            Error::DepositFailed { .. } | Error::RefundFailed { .. } | Error::PayoutFailed { .. }
        )
    }
}
