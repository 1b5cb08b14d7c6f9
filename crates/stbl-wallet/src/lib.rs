use async_trait::async_trait;
use stbl_solana::constants::WALLET_INSTALL_URL;
use stbl_solana::VersionedTransaction;
use thiserror::Error;

mod session;
pub use session::{AutoReconnect, WalletSession, WalletSessionManager, WalletState};

#[cfg(feature = "testing")]
pub mod mock;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("wallet not found, install it from {0}")]
    ProviderUnavailable(String),

    #[error("request rejected by the user")]
    UserRejected,

    #[error("wallet access was revoked")]
    Revoked,

    #[error("wallet is not connected")]
    NotConnected,

    #[error("connection attempt interrupted by a disconnect")]
    Interrupted,

    #[error("wallet error {0}")]
    Signer(String),
}

impl Error {
    pub fn provider_unavailable() -> Self {
        Self::ProviderUnavailable(WALLET_INSTALL_URL.to_string())
    }
}

/// Failures reported by the signing capability itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("signing capability unavailable")]
    Unavailable,

    #[error("user rejected the request")]
    Rejected,

    #[error("authorization revoked")]
    Revoked,

    #[error("{0}")]
    Failed(String),
}

impl From<SignerError> for Error {
    fn from(value: SignerError) -> Self {
        match value {
            SignerError::Unavailable => Error::provider_unavailable(),
            SignerError::Rejected => Error::UserRejected,
            SignerError::Revoked => Error::Revoked,
            SignerError::Failed(message) => Error::Signer(message),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Only connect if the user previously trusted this site, never prompting them
    pub only_if_trusted: bool,
}

impl ConnectOptions {
    pub fn interactive() -> Self {
        Self { only_if_trusted: false }
    }

    pub fn trusted_only() -> Self {
        Self { only_if_trusted: true }
    }
}

/// External signing capability, usually a browser wallet extension.
#[async_trait]
pub trait Signer: 'static + Send + Sync {
    /// Requests authorization and returns the base58 address of the account.
    async fn connect(&self, options: ConnectOptions) -> Result<String, SignerError>;

    async fn disconnect(&self) -> Result<(), SignerError>;

    /// Signs the transaction, broadcasts it and returns its signature.
    async fn sign_and_send(&self, transaction: &VersionedTransaction) -> Result<String, SignerError>;
}
