use stbl_common::service::monitoring::{Fmt, VerbosityConfiguration};
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Registry;

pub mod configuration;
pub use configuration::{Configuration, PriceConfiguration, SwapConfiguration};

mod widget;
pub use widget::Widget;

pub use stbl_settlement::{Error as SettlementError, Precondition, SettlementState, SettlementView};
pub use stbl_solana::constants::{DisplayAsset, Symbol, Token};
pub use stbl_wallet::{ConnectOptions, Signer, SignerError, WalletSession, WalletState};

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error {0}")]
    Configuration(String),

    #[error(transparent)]
    Prices(#[from] stbl_prices::Error),

    #[error(transparent)]
    Swap(#[from] stbl_swap::Error),

    #[error(transparent)]
    Settlement(#[from] stbl_settlement::Error),

    #[error("tracing error {0}")]
    Tracing(String),
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_tracing(verbosity: &VerbosityConfiguration) -> Result<(), Error> {
    Registry::default()
        .with(Fmt::layer(verbosity))
        .try_init()
        .map_err(|e| Error::Tracing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_is_initialized_once() {
        assert!(init_tracing(&VerbosityConfiguration::Debug).is_ok());
        assert!(matches!(init_tracing(&VerbosityConfiguration::Info), Err(Error::Tracing(_))));
    }
}
