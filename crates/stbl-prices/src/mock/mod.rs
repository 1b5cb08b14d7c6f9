use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;

use crate::{Error, PriceSnapshot, SymbolPrice};

#[async_trait]
pub trait MockPriceSource: 'static + Send + Sync + Debug {
    fn new() -> Self
    where
        Self: Sized;

    async fn fetch_snapshot(&self) -> Result<PriceSnapshot, Error> {
        unimplemented!()
    }
}

/// Source answering every poll with the same prices and no 24h change.
#[derive(Debug, Default)]
pub struct FixedPriceSource {
    prices: HashMap<String, SymbolPrice>,
}

impl FixedPriceSource {
    pub fn with_prices(prices: &[(&str, f64)]) -> Self {
        Self {
            prices: prices
                .iter()
                .map(|(symbol, price)| {
                    (
                        symbol.to_string(),
                        SymbolPrice {
                            price: *price,
                            change_24h: None,
                        },
                    )
                })
                .collect(),
        }
    }
}

#[async_trait]
impl MockPriceSource for FixedPriceSource {
    fn new() -> Self {
        Self::default()
    }

    async fn fetch_snapshot(&self) -> Result<PriceSnapshot, Error> {
        Ok(PriceSnapshot::new(self.prices.clone()))
    }
}
