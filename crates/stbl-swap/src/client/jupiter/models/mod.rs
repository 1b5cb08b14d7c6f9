use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Deserialize)]
pub struct JupiterError {
    pub error: String,
}

// Subset of the quote response, the full document is kept as the route handle
#[derive(Debug, Deserialize, Clone)]
pub struct JupiterQuote {
    #[serde(rename = "outAmount")]
    pub out_amount: String,
    #[serde(rename = "priceImpactPct", default)]
    pub price_impact_pct: Option<String>,
    #[serde(rename = "routePlan", default)]
    pub route_plan: Option<Vec<serde_json::Value>>,
}

impl JupiterQuote {
    pub fn output_amount(&self) -> Result<u128, Error> {
        self.out_amount
            .parse()
            .map_err(|_| Error::Format(format!("invalid outAmount {:?}", self.out_amount)))
    }

    pub fn price_impact(&self) -> Result<f64, Error> {
        match self.price_impact_pct.as_deref() {
            None | Some("") => Ok(0.0),
            Some(value) => value
                .parse::<f64>()
                .ok()
                .filter(|x| x.is_finite())
                .ok_or_else(|| Error::Format(format!("invalid priceImpactPct {:?}", value))),
        }
    }

    /// Single hop when the aggregator omits the route plan
    pub fn route_hops(&self) -> usize {
        self.route_plan.as_ref().map(|x| x.len()).unwrap_or(1)
    }
}

#[derive(Debug, Serialize)]
pub struct JupiterSwapRequest<'a> {
    #[serde(rename = "quoteResponse")]
    pub quote_response: &'a serde_json::Value,
    #[serde(rename = "userPublicKey")]
    pub user_public_key: &'a str,
    #[serde(rename = "wrapAndUnwrapSol")]
    pub wrap_and_unwrap_sol: bool,
}

#[derive(Debug, Deserialize)]
pub struct JupiterSwap {
    #[serde(rename = "swapTransaction")]
    pub swap_transaction: String,
}
