pub mod models;

use async_trait::async_trait;
use reqwest::{Client as HTTPClient, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::client::jupiter::models::{JupiterError, JupiterQuote, JupiterSwap, JupiterSwapRequest};
use crate::client::{Aggregator, SwapClient, SwapClientConfigurator};
use crate::{Error, Quote, QuoteRequest};

pub const DEFAULT_JUPITER_ENDPOINT: &str = "https://quote-api.jup.ag/v6";
pub const DEFAULT_SLIPPAGE_BPS: u16 = 50;

const MAX_SLIPPAGE_BPS: u16 = 10_000;

fn default_slippage_bps() -> u16 {
    DEFAULT_SLIPPAGE_BPS
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct JupiterConfiguration {
    pub endpoint: String,
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u16,
}

impl Default for JupiterConfiguration {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_JUPITER_ENDPOINT.to_string(),
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
        }
    }
}

impl JupiterConfiguration {
    pub fn validate(&self) -> Result<(), Error> {
        if self.endpoint.is_empty() {
            return Err(Error::Configuration("Jupiter endpoint cannot be empty".to_string()));
        }

        Url::parse(&self.endpoint).map_err(|e| Error::Configuration(format!("Jupiter endpoint {}: {}", self.endpoint, e)))?;

        if self.slippage_bps > MAX_SLIPPAGE_BPS {
            return Err(Error::Configuration(format!("slippage must be at most {} bps", MAX_SLIPPAGE_BPS)));
        }

        Ok(())
    }
}

impl From<JupiterConfiguration> for SwapClientConfigurator {
    fn from(value: JupiterConfiguration) -> Self {
        Self::Jupiter(value)
    }
}

#[derive(Clone)]
pub struct JupiterClient {
    endpoint: String,
    slippage_bps: u16,
    client: HTTPClient,
}

impl From<JupiterClient> for SwapClient {
    fn from(value: JupiterClient) -> Self {
        Self::Jupiter(value)
    }
}

impl JupiterClient {
    pub fn new(configuration: &JupiterConfiguration) -> Result<Self, Error> {
        Ok(Self {
            endpoint: configuration.endpoint.trim_end_matches('/').to_string(),
            slippage_bps: configuration.slippage_bps,
            client: HTTPClient::builder().build()?,
        })
    }

    fn url(&self, method: &str) -> Result<Url, Error> {
        Url::parse(&format!("{}/{}", self.endpoint, method)).map_err(|e| Error::URL(e.to_string()))
    }

    // Errors are reported as `{ "error": "..." }`, with or without an error status
    fn parse_response(url: &Url, status: StatusCode, text: &str) -> Result<serde_json::Value, Error> {
        let value = match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value) => value,
            Err(_) if !status.is_success() => {
                return Err(Error::Internal(format!("request error url={} status={}, body={}", url, status, text)));
            },
            Err(e) => return Err(Error::Format(e.to_string())),
        };

        if let Ok(JupiterError { error }) = serde_json::from_value::<JupiterError>(value.clone()) {
            return Err(Error::Reported(error));
        }

        if !status.is_success() {
            return Err(Error::Internal(format!("request error url={} status={}, body={}", url, status, text)));
        }

        Ok(value)
    }
}

#[async_trait]
impl Aggregator for JupiterClient {
    async fn quote(&self, request: &QuoteRequest) -> Result<Quote, Error> {
        let url = self.url("quote")?;

        let response = self
            .client
            .get(url.clone())
            .query(&[
                ("inputMint", request.input.token().mint.to_string()),
                ("outputMint", request.output.token().mint.to_string()),
                ("amount", request.amount_base_units.to_string()),
                ("slippageBps", self.slippage_bps.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        let route = Self::parse_response(&url, status, &text)?;
        let quote: JupiterQuote = serde_json::from_value(route.clone()).map_err(|e| Error::Format(e.to_string()))?;

        Ok(Quote {
            input: request.input,
            output: request.output,
            input_amount_base_units: request.amount_base_units,

            output_amount_base_units: quote.output_amount()?,
            price_impact_fraction: quote.price_impact()?,
            route_hops: quote.route_hops(),

            route,
            sequence: request.sequence,
        })
    }

    async fn build(&self, quote: &Quote, user: &str) -> Result<String, Error> {
        let url = self.url("swap")?;

        let response = self
            .client
            .post(url.clone())
            .json(&JupiterSwapRequest {
                quote_response: &quote.route,
                user_public_key: user,
                wrap_and_unwrap_sol: true,
            })
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        let value = Self::parse_response(&url, status, &text)?;
        let swap: JupiterSwap = serde_json::from_value(value).map_err(|e| Error::Format(e.to_string()))?;

        Ok(swap.swap_transaction)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use stbl_solana::Symbol;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> JupiterClient {
        JupiterClient::new(&JupiterConfiguration {
            endpoint: format!("{}/v6", server.uri()),
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
        })
        .unwrap()
    }

    fn request() -> QuoteRequest {
        QuoteRequest {
            input: Symbol::Sol,
            output: Symbol::Usdc,
            amount_base_units: 1_000_000_000,
            sequence: 7,
        }
    }

    fn quote_response() -> serde_json::Value {
        json!({
            "inputMint": "So11111111111111111111111111111111111111112",
            "inAmount": "1000000000",
            "outputMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
            "outAmount": "142310000",
            "otherAmountThreshold": "141598450",
            "swapMode": "ExactIn",
            "slippageBps": 50,
            "priceImpactPct": "0.00012",
            "routePlan": [{ "percent": 100 }, { "percent": 100 }]
        })
    }

    mod quote {
        use super::*;

        #[tokio::test]
        async fn should_return_quote() {
            // Given
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/v6/quote"))
                .and(query_param("inputMint", "So11111111111111111111111111111111111111112"))
                .and(query_param("outputMint", "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"))
                .and(query_param("amount", "1000000000"))
                .and(query_param("slippageBps", "50"))
                .respond_with(ResponseTemplate::new(200).set_body_json(quote_response()))
                .expect(1)
                .mount(&server)
                .await;

            // When
            let quote = client(&server).quote(&request()).await.unwrap();

            // Then
            assert_eq!(quote.output_amount_base_units, 142_310_000);
            assert_eq!(quote.price_impact_fraction, 0.00012);
            assert_eq!(quote.route_hops, 2);
            assert_eq!(quote.sequence, 7);
            assert_eq!(quote.route, quote_response());
        }

        #[tokio::test]
        async fn should_surface_reported_error() {
            // Given
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/v6/quote"))
                .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                    "error": "Could not find any route",
                    "errorCode": "COULD_NOT_FIND_ANY_ROUTE"
                })))
                .mount(&server)
                .await;

            // When
            let result = client(&server).quote(&request()).await;

            // Then
            assert!(matches!(result, Err(Error::Reported(x)) if x == "Could not find any route"));
        }

        #[tokio::test]
        async fn should_fail_on_unexpected_status() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
                .mount(&server)
                .await;

            let result = client(&server).quote(&request()).await;

            assert!(matches!(result, Err(Error::Internal(_))));
        }

        #[tokio::test]
        async fn should_fail_on_malformed_quote() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "outAmount": "lots" })))
                .mount(&server)
                .await;

            let result = client(&server).quote(&request()).await;

            assert!(matches!(result, Err(Error::Format(_))));
        }

        #[tokio::test]
        async fn should_fail_when_unreachable() {
            let client = JupiterClient::new(&JupiterConfiguration {
                endpoint: "http://127.0.0.1:1".to_string(),
                slippage_bps: DEFAULT_SLIPPAGE_BPS,
            })
            .unwrap();

            let result = client.quote(&request()).await;

            assert!(matches!(result, Err(Error::Transport(_))));
        }
    }

    mod build {
        use super::*;

        #[tokio::test]
        async fn should_send_quote_back_with_user() {
            // Given
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/v6/quote"))
                .respond_with(ResponseTemplate::new(200).set_body_json(quote_response()))
                .mount(&server)
                .await;
            Mock::given(method("POST"))
                .and(path("/v6/swap"))
                .and(body_json(json!({
                    "quoteResponse": quote_response(),
                    "userPublicKey": "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU",
                    "wrapAndUnwrapSol": true
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "swapTransaction": "AQAAAA==",
                    "lastValidBlockHeight": 279632475
                })))
                .expect(1)
                .mount(&server)
                .await;

            let client = client(&server);
            let quote = client.quote(&request()).await.unwrap();

            // When
            let transaction = client
                .build(&quote, "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU")
                .await
                .unwrap();

            // Then
            assert_eq!(transaction, "AQAAAA==");
        }

        #[tokio::test]
        async fn should_surface_reported_error() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/v6/swap"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "Quote expired" })))
                .mount(&server)
                .await;

            let quote = Quote {
                input: Symbol::Sol,
                output: Symbol::Usdc,
                input_amount_base_units: 1,
                output_amount_base_units: 1,
                price_impact_fraction: 0.0,
                route_hops: 1,
                route: json!({}),
                sequence: 1,
            };

            let result = client(&server).build(&quote, "user").await;

            assert!(matches!(result, Err(Error::Reported(x)) if x == "Quote expired"));
        }
    }

    #[test]
    fn configuration_is_validated() {
        assert!(JupiterConfiguration::default().validate().is_ok());

        let configuration = JupiterConfiguration {
            slippage_bps: 10_001,
            ..Default::default()
        };
        assert!(configuration.validate().is_err());

        let configuration = JupiterConfiguration {
            endpoint: String::new(),
            ..Default::default()
        };
        assert!(configuration.validate().is_err());
    }

    #[test]
    fn configuration_defaults_slippage() {
        let configuration: SwapClientConfigurator = serde_json::from_value(json!({
            "provider": "jupiter",
            "endpoint": "https://quote-api.jup.ag/v6"
        }))
        .unwrap();

        assert!(matches!(configuration, SwapClientConfigurator::Jupiter(x) if x.slippage_bps == 50));
    }
}
