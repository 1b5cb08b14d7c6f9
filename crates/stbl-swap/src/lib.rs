use stbl_solana::math::to_ui_amount;
use stbl_solana::Symbol;
use thiserror::Error;

pub mod client;
pub use client::{Aggregator, SwapClient, SwapClientConfigurator};

mod fetcher;
pub use fetcher::{QuoteError, QuoteFetcher, QuoteOutcome, DEFAULT_DEBOUNCE_DELAY};

#[derive(Error, Debug)]
pub enum Error {
    /// Error message reported by the aggregator itself
    #[error("{0}")]
    Reported(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("invalid url {0}")]
    URL(String),

    #[error("wrong format error {0}")]
    Format(String),

    #[error("invalid configuration {0}")]
    Configuration(String),

    #[error("Swap error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteRequest {
    pub input: Symbol,
    pub output: Symbol,
    pub amount_base_units: u128,

    /// Stamped when the debounce window elapsed, used to discard superseded responses
    pub sequence: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub input: Symbol,
    pub output: Symbol,
    pub input_amount_base_units: u128,

    pub output_amount_base_units: u128,
    pub price_impact_fraction: f64,
    pub route_hops: usize,

    /// Aggregator response, handed back as is when building the transaction
    pub route: serde_json::Value,
    pub sequence: u64,
}

impl Quote {
    pub fn output_ui_amount(&self) -> f64 {
        to_ui_amount(self.output_amount_base_units, self.output.token().decimals)
    }

    pub fn input_ui_amount(&self) -> f64 {
        to_ui_amount(self.input_amount_base_units, self.input.token().decimals)
    }
}
