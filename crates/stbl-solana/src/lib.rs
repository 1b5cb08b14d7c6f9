use thiserror::Error;

pub mod constants;
pub mod format;
pub mod math;
pub mod transaction;

pub use constants::{Symbol, Token};
pub use solana_sdk::pubkey::Pubkey;
pub use solana_sdk::signature::Signature;
pub use solana_sdk::transaction::VersionedTransaction;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid amount {0:?}")]
    InvalidAmount(String),

    #[error("unknown token {0}")]
    UnknownToken(String),

    #[error("invalid transaction {0}")]
    InvalidTransaction(String),

    #[error("invalid address {0}")]
    InvalidAddress(String),

    #[error("invalid signature {0}")]
    InvalidSignature(String),
}
