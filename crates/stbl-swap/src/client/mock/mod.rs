use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use stbl_solana::math::to_ui_amount;
use stbl_solana::transaction::{encode_transaction, parse_address, unsigned_transaction};
use tokio::sync::Mutex;
use tokio::time;

use crate::{Error, Quote, QuoteRequest};

#[async_trait]
pub trait MockSwapClient: 'static + Send + Sync + Debug {
    fn new() -> Self
    where
        Self: Sized;

    async fn quote(&self, _request: &QuoteRequest) -> Result<Quote, Error> {
        unimplemented!()
    }

    async fn build(&self, _quote: &Quote, _user: &str) -> Result<String, Error> {
        unimplemented!()
    }
}

/// Quotes every pair at a fixed rate and builds empty transactions paid by the user.
/// The optional delay applies to both quote and build requests.
#[derive(Debug)]
pub struct FixedRateSwap {
    rate: f64,
    delay: Duration,

    quote_error: Option<String>,
    build_error: Option<String>,

    quotes: Mutex<Vec<QuoteRequest>>,
    builds: AtomicUsize,
}

impl FixedRateSwap {
    pub fn with_rate(rate: f64) -> Self {
        Self {
            rate,
            delay: Duration::ZERO,

            quote_error: None,
            build_error: None,

            quotes: Mutex::default(),
            builds: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_quote_error(mut self, message: &str) -> Self {
        self.quote_error = Some(message.to_string());
        self
    }

    pub fn with_build_error(mut self, message: &str) -> Self {
        self.build_error = Some(message.to_string());
        self
    }

    pub async fn quote_requests(&self) -> Vec<QuoteRequest> {
        self.quotes.lock().await.clone()
    }

    pub fn build_calls(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MockSwapClient for FixedRateSwap {
    fn new() -> Self {
        Self::with_rate(1.0)
    }

    async fn quote(&self, request: &QuoteRequest) -> Result<Quote, Error> {
        self.quotes.lock().await.push(*request);
        if !self.delay.is_zero() {
            time::sleep(self.delay).await;
        }

        if let Some(ref message) = self.quote_error {
            return Err(Error::Reported(message.clone()));
        }

        let input = to_ui_amount(request.amount_base_units, request.input.token().decimals);
        let output = (input * self.rate * 10_f64.powi(request.output.token().decimals as i32)).floor() as u128;

        Ok(Quote {
            input: request.input,
            output: request.output,
            input_amount_base_units: request.amount_base_units,

            output_amount_base_units: output,
            price_impact_fraction: 0.0012,
            route_hops: 2,

            route: json!({
                "inAmount": request.amount_base_units.to_string(),
                "outAmount": output.to_string(),
            }),
            sequence: request.sequence,
        })
    }

    async fn build(&self, _quote: &Quote, user: &str) -> Result<String, Error> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            time::sleep(self.delay).await;
        }

        if let Some(ref message) = self.build_error {
            return Err(Error::Reported(message.clone()));
        }

        let payer = parse_address(user).map_err(|e| Error::Format(e.to_string()))?;
        encode_transaction(&unsigned_transaction(&payer)).map_err(|e| Error::Format(e.to_string()))
    }
}
