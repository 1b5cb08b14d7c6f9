use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stbl_common::service::tracing::instrument;
use stbl_common::{log_if_error, measure_duration, metric};
use thiserror::Error;

use crate::coingecko::{CoingeckoConfiguration, CoingeckoPriceClient};

pub mod coingecko;

mod feed;
pub use feed::{PollOutcome, PriceFeed, PriceFeedContext, PriceFeedService, DEFAULT_POLL_PERIOD};

#[cfg(feature = "testing")]
pub mod mock;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid url {0}")]
    URL(String),

    #[error("network failure {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("wrong format error {0}")]
    Format(String),

    #[error("invalid configuration {0}")]
    Configuration(String),

    #[error("Price error: {0}")]
    Internal(String),
}

#[derive(Serialize, Deserialize, Default, Clone, Copy, Debug, PartialEq)]
pub struct SymbolPrice {
    pub price: f64,
    pub change_24h: Option<f64>,
}

/// Prices of every ticker symbol, as returned by one successful poll.
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct PriceSnapshot {
    pub prices: HashMap<String, SymbolPrice>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PriceSnapshot {
    pub fn new(prices: HashMap<String, SymbolPrice>) -> Self {
        Self {
            prices,
            updated_at: Some(Utc::now()),
        }
    }

    pub fn get(&self, symbol: &str) -> Option<SymbolPrice> {
        self.prices.get(symbol).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum Configuration {
    #[cfg(feature = "testing")]
    #[serde(skip)]
    Mock(std::sync::Arc<dyn mock::MockPriceSource>),

    Coingecko(CoingeckoConfiguration),
}

impl Default for Configuration {
    fn default() -> Self {
        Self::Coingecko(CoingeckoConfiguration::default())
    }
}

impl Configuration {
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            #[cfg(feature = "testing")]
            Self::Mock(_) => Ok(()),

            Self::Coingecko(x) => x.validate(),
        }
    }
}

#[cfg(feature = "testing")]
impl Configuration {
    pub fn mock<T: mock::MockPriceSource>() -> Self {
        Self::Mock(std::sync::Arc::new(T::new()))
    }
}

#[derive(Clone)]
pub enum Client {
    #[cfg(feature = "testing")]
    Mock(std::sync::Arc<dyn mock::MockPriceSource>),

    Coingecko(CoingeckoPriceClient),
}

impl Client {
    pub fn new(configuration: &Configuration) -> Result<Self, Error> {
        match configuration {
            #[cfg(feature = "testing")]
            Configuration::Mock(x) => Ok(Self::Mock(x.clone())),

            Configuration::Coingecko(x) => Ok(Self::Coingecko(CoingeckoPriceClient::new(x)?)),
        }
    }

    #[cfg(feature = "testing")]
    pub fn mock<I: 'static + mock::MockPriceSource>() -> Self {
        Self::Mock(std::sync::Arc::new(I::new()))
    }

    /// Fetches the prices of every ticker symbol in a single request
    #[instrument(name = "fetch_snapshot", skip(self))]
    pub async fn fetch_snapshot(&self) -> Result<PriceSnapshot, Error> {
        let (result, duration) = measure_duration!(log_if_error!(match self {
            #[cfg(feature = "testing")]
            Self::Mock(source) => source.fetch_snapshot().await,

            Self::Coingecko(client) => client.fetch_snapshot().await,
        }));

        metric!(counter[price_poll] = 1, method = "fetch_snapshot");
        metric!(histogram[price_poll_duration_milliseconds] = duration.as_millis(), method = "fetch_snapshot");
        metric!(on error result => counter [ price_poll_error ] = 1, method = "fetch_snapshot");

        result
    }
}
