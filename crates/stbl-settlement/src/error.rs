use stbl_swap::QuoteError;
use thiserror::Error;
use tracing::warn;

pub const SWAP_FAILED_MESSAGE: &str = "Swap failed. Please try again.";

/// Local condition preventing a swap from being attempted
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    #[error("connect a wallet first")]
    NotConnected,

    #[error("enter an amount to swap")]
    InvalidAmount,

    #[error("no quote available for this amount")]
    NoQuote,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("wallet not found, install it from {0}")]
    ProviderUnavailable(String),

    #[error("request rejected in the wallet")]
    UserRejected,

    #[error("invalid amount")]
    InvalidAmount,

    #[error("Quote unavailable: {0}")]
    QuoteUnavailable(String),

    #[error("{0}")]
    SwapFailed(String),

    #[error("{0}")]
    SwapRejected(Precondition),

    #[error("a swap is awaiting signature")]
    Busy,
}

impl Error {
    pub fn swap_failed(message: &str) -> Self {
        if message.is_empty() {
            Self::SwapFailed(SWAP_FAILED_MESSAGE.to_string())
        } else {
            Self::SwapFailed(message.to_string())
        }
    }
}

impl From<QuoteError> for Error {
    fn from(value: QuoteError) -> Self {
        match value {
            QuoteError::InvalidAmount(_) => Self::InvalidAmount,
            QuoteError::QuoteUnavailable(message) => Self::QuoteUnavailable(message),
        }
    }
}

impl From<stbl_wallet::Error> for Error {
    fn from(value: stbl_wallet::Error) -> Self {
        match value {
            stbl_wallet::Error::ProviderUnavailable(url) => Self::ProviderUnavailable(url),
            stbl_wallet::Error::UserRejected => Self::UserRejected,
            stbl_wallet::Error::NotConnected => Self::SwapRejected(Precondition::NotConnected),
            stbl_wallet::Error::Signer(message) => Self::swap_failed(&message),
            e => Self::swap_failed(&e.to_string()),
        }
    }
}

impl From<stbl_swap::Error> for Error {
    fn from(value: stbl_swap::Error) -> Self {
        match value {
            stbl_swap::Error::Reported(message) => Self::swap_failed(&message),
            e => {
                warn!("swap build failed: {}", e);
                Self::swap_failed("")
            },
        }
    }
}

impl From<stbl_solana::Error> for Error {
    fn from(value: stbl_solana::Error) -> Self {
        warn!("invalid swap transaction: {}", value);
        Self::swap_failed("")
    }
}
