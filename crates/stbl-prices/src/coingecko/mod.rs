use std::collections::HashMap;
use std::str::FromStr;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{ClientBuilder, Url};
use serde::{Deserialize, Serialize};
use stbl_solana::constants::DisplayAsset;

use crate::{Client, Configuration, Error, PriceSnapshot, SymbolPrice};

pub const DEFAULT_COINGECKO_PRICE_ENDPOINT: &str = "https://api.coingecko.com";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CoingeckoConfiguration {
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for CoingeckoConfiguration {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_COINGECKO_PRICE_ENDPOINT.to_string(),
            api_key: None,
        }
    }
}

impl CoingeckoConfiguration {
    pub fn validate(&self) -> Result<(), Error> {
        Url::parse(&self.endpoint).map_err(|e| Error::Configuration(format!("price endpoint {}: {}", self.endpoint, e)))?;

        if self.api_key.as_deref().is_some_and(|x| x.trim().is_empty()) {
            return Err(Error::Configuration("price api key is empty".to_string()));
        }

        Ok(())
    }
}

impl From<CoingeckoConfiguration> for Configuration {
    fn from(value: CoingeckoConfiguration) -> Self {
        Self::Coingecko(value)
    }
}

#[derive(Clone)]
pub struct CoingeckoPriceClient {
    endpoint: String,
    client: reqwest::Client,
}

impl From<CoingeckoPriceClient> for Client {
    fn from(value: CoingeckoPriceClient) -> Self {
        Self::Coingecko(value)
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    status: ErrorStatus,
}

#[derive(Deserialize)]
struct ErrorStatus {
    error_message: String,
}

#[derive(Deserialize, Debug, Clone, Copy)]
struct Price {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
}

impl CoingeckoPriceClient {
    pub fn new(configuration: &CoingeckoConfiguration) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("stbl-widget"));

        if let Some(ref api_key) = configuration.api_key {
            let name = HeaderName::from_str("x-cg-pro-api-key").map_err(|e| Error::Configuration(e.to_string()))?;
            let value = HeaderValue::from_str(api_key).map_err(|e| Error::Configuration(e.to_string()))?;
            headers.insert(name, value);
        }

        Ok(Self {
            endpoint: configuration.endpoint.to_string(),
            client: ClientBuilder::new().default_headers(headers).build()?,
        })
    }

    pub async fn fetch_snapshot(&self) -> Result<PriceSnapshot, Error> {
        let ids: Vec<&str> = DisplayAsset::TICKER.iter().map(|x| x.price_id).collect();

        let mut url = Url::parse(&self.endpoint)
            .and_then(|x| x.join("/api/v3/simple/price"))
            .map_err(|x| Error::URL(x.to_string()))?;

        url.query_pairs_mut()
            .append_pair("ids", &ids.join(","))
            .append_pair("vs_currencies", "usd")
            .append_pair("include_24hr_change", "true");

        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorResponse>(&text) {
                Ok(x) => Error::Internal(x.status.error_message),
                Err(_) => Error::Internal(format!("request error url={} status={}, body={}", url, status, text)),
            });
        }

        let response = serde_json::from_str::<HashMap<String, Price>>(&text).map_err(|e| Error::Format(e.to_string()))?;

        let mut prices = HashMap::new();
        for asset in DisplayAsset::TICKER {
            let Some(price) = response.get(asset.price_id) else {
                continue;
            };

            match price.usd {
                Some(usd) if usd.is_finite() => prices.insert(
                    asset.symbol.to_string(),
                    SymbolPrice {
                        price: usd,
                        change_24h: price.usd_24h_change.filter(|x| x.is_finite()),
                    },
                ),
                _ => return Err(Error::Format(format!("missing usd price for {}", asset.price_id))),
            };
        }

        Ok(PriceSnapshot::new(prices))
    }
}
