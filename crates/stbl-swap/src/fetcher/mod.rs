use std::time::Duration;

use stbl_common::concurrency::{Debounced, Debouncer, Sequencer};
use stbl_common::service::tracing::{debug, warn};
use stbl_solana::math::{parse_amount, to_base_units};
use stbl_solana::Symbol;

use crate::{Error, Quote, QuoteRequest, SwapClient};

pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(600);

const RETRY_MESSAGE: &str = "try again";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("invalid amount {0:?}")]
    InvalidAmount(String),

    #[error("Quote unavailable: {0}")]
    QuoteUnavailable(String),
}

impl From<Error> for QuoteError {
    fn from(value: Error) -> Self {
        match value {
            Error::Reported(message) if !message.is_empty() => QuoteError::QuoteUnavailable(message),
            _ => QuoteError::QuoteUnavailable(RETRY_MESSAGE.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuoteOutcome {
    Ready(Quote),
    /// Nothing to quote: the amount is empty, zero or negative
    Empty,
    /// A newer request was issued before this one resolved
    Superseded,
}

/// Debounces quote requests and discards responses of superseded requests.
#[derive(Clone)]
pub struct QuoteFetcher {
    client: SwapClient,

    debouncer: Debouncer,
    sequencer: Sequencer,
}

impl QuoteFetcher {
    pub fn new(client: SwapClient, delay: Duration) -> Self {
        Self {
            client,

            debouncer: Debouncer::new(delay),
            sequencer: Sequencer::new(),
        }
    }

    pub fn client(&self) -> &SwapClient {
        &self.client
    }

    pub async fn request_quote(&self, input: Symbol, output: Symbol, amount: &str) -> Result<QuoteOutcome, QuoteError> {
        let amount_base_units = match Self::base_units(input, amount) {
            Ok(Some(x)) => x,
            Ok(None) => {
                self.cancel().await;
                return Ok(QuoteOutcome::Empty);
            },
            Err(e) => {
                self.cancel().await;
                return Err(e);
            },
        };

        if self.debouncer.wait().await == Debounced::Cancelled {
            return Ok(QuoteOutcome::Superseded);
        }

        if input == output {
            self.sequencer.advance();
            return Err(QuoteError::QuoteUnavailable(format!("cannot swap {} for itself", input)));
        }

        let sequence = self.sequencer.advance();
        let request = QuoteRequest {
            input,
            output,
            amount_base_units,
            sequence,
        };

        let result = self.client.quote(&request).await;
        if !self.sequencer.is_current(sequence) {
            debug!("discarding quote {} superseded by {}", sequence, self.sequencer.current());
            return Ok(QuoteOutcome::Superseded);
        }

        match result {
            Ok(quote) => Ok(QuoteOutcome::Ready(quote)),
            Err(e) => {
                warn!("quote {} failed: {}", sequence, e);
                Err(e.into())
            },
        }
    }

    /// Cancels the pending debounce timer and supersedes any request in flight.
    pub async fn cancel(&self) {
        self.debouncer.cancel().await;
        self.sequencer.advance();
    }

    // Zero and negative amounts floor to nothing to quote
    fn base_units(input: Symbol, amount: &str) -> Result<Option<u128>, QuoteError> {
        let trimmed = amount.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        if let Some(absolute) = trimmed.strip_prefix('-') {
            return match parse_amount(absolute) {
                Ok(_) => Ok(None),
                Err(_) => Err(QuoteError::InvalidAmount(amount.to_string())),
            };
        }

        match to_base_units(trimmed, input.token().decimals) {
            Ok(0) => Ok(None),
            Ok(x) => Ok(Some(x)),
            Err(_) => Err(QuoteError::InvalidAmount(amount.to_string())),
        }
    }
}
