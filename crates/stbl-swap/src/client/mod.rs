pub mod jupiter;

#[cfg(feature = "testing")]
pub mod mock;
#[cfg(feature = "testing")]
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stbl_common::service::tracing::instrument;
use stbl_common::{log_if_error, measure_duration, metric};

use crate::client::jupiter::{JupiterClient, JupiterConfiguration};
#[cfg(feature = "testing")]
use crate::client::mock::MockSwapClient;
use crate::{Error, Quote, QuoteRequest};

/// Liquidity aggregator able to price a swap and build its transaction
#[async_trait]
pub trait Aggregator: 'static + Send + Sync + Clone {
    async fn quote(&self, request: &QuoteRequest) -> Result<Quote, Error>;

    /// Builds the unsigned transaction executing the quote, returned base64 encoded
    async fn build(&self, quote: &Quote, user: &str) -> Result<String, Error>;
}

#[derive(Clone)]
pub enum SwapClient {
    #[cfg(feature = "testing")]
    Mock(Arc<dyn mock::MockSwapClient>),

    Jupiter(JupiterClient),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum SwapClientConfigurator {
    #[cfg(feature = "testing")]
    #[serde(skip)]
    Mock(Arc<dyn mock::MockSwapClient>),

    Jupiter(JupiterConfiguration),
}

impl Default for SwapClientConfigurator {
    fn default() -> Self {
        Self::Jupiter(JupiterConfiguration::default())
    }
}

#[cfg(feature = "testing")]
impl SwapClientConfigurator {
    pub fn mock<T: mock::MockSwapClient>() -> Self {
        Self::Mock(Arc::new(T::new()))
    }
}

impl SwapClientConfigurator {
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            #[cfg(feature = "testing")]
            SwapClientConfigurator::Mock(_) => Ok(()),
            SwapClientConfigurator::Jupiter(config) => config.validate(),
        }
    }
}

impl SwapClient {
    pub fn new(configuration: &SwapClientConfigurator) -> Result<Self, Error> {
        match configuration {
            #[cfg(feature = "testing")]
            SwapClientConfigurator::Mock(x) => Ok(Self::Mock(x.clone())),
            SwapClientConfigurator::Jupiter(x) => Ok(Self::Jupiter(JupiterClient::new(x)?)),
        }
    }

    #[cfg(feature = "testing")]
    pub fn mock<I: 'static + MockSwapClient>() -> Self {
        Self::Mock(Arc::new(I::new()))
    }

    #[instrument(name = "quote", skip(self))]
    pub async fn quote(&self, request: &QuoteRequest) -> Result<Quote, Error> {
        let (result, duration) = measure_duration!(log_if_error!(match self {
            #[cfg(feature = "testing")]
            SwapClient::Mock(x) => x.quote(request).await,
            SwapClient::Jupiter(x) => x.quote(request).await,
        }));

        metric!(counter[quote_request] = 1, method = "quote");
        metric!(histogram[quote_request_duration_milliseconds] = duration.as_millis(), method = "quote");
        metric!(on error result => counter [ quote_request_error ] = 1, method = "quote");

        result
    }

    #[instrument(name = "build", skip(self, quote))]
    pub async fn build(&self, quote: &Quote, user: &str) -> Result<String, Error> {
        let result = log_if_error!(match self {
            #[cfg(feature = "testing")]
            SwapClient::Mock(x) => x.build(quote, user).await,
            SwapClient::Jupiter(x) => x.build(quote, user).await,
        });

        metric!(counter[swap_request] = 1, method = "build");
        metric!(on error result => counter [ swap_request_error ] = 1, method = "build");

        result
    }
}
