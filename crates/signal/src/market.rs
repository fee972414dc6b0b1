use std::time::Duration;

use async_trait::async_trait;
use midas_ports::{MarketData, MarketError};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Market-data adapter over a JSON chart endpoint.
///
/// The configured URL may carry a `{symbol}` placeholder; the response body
/// must be a JSON object with a numeric `price` field. Anything else maps to
/// a market error and the caller skips the tick.
pub struct HttpMarketData {
    http: Client,
    url_template: String,
}

#[derive(Debug, Deserialize)]
struct PriceWire {
    price: f64,
}

impl HttpMarketData {
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            url_template: url_template.into(),
        }
    }

    fn endpoint(&self, symbol: &str) -> String {
        if self.url_template.contains("{symbol}") {
            self.url_template.replace("{symbol}", symbol)
        } else {
            self.url_template.clone()
        }
    }
}

#[async_trait]
impl MarketData for HttpMarketData {
    async fn price_of(&self, symbol: &str) -> Result<Decimal, MarketError> {
        let endpoint = self.endpoint(symbol);
        let response = self
            .http
            .get(&endpoint)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|err| MarketError::Unavailable(err.to_string()))?
            .error_for_status()
            .map_err(|err| MarketError::Unavailable(err.to_string()))?;

        let wire: PriceWire = response
            .json()
            .await
            .map_err(|err| MarketError::Malformed(err.to_string()))?;

        let price = Decimal::from_f64_retain(wire.price)
            .ok_or_else(|| MarketError::Malformed(format!("price not decimal: {}", wire.price)))?;
        if price <= Decimal::ZERO {
            return Err(MarketError::Malformed(format!(
                "non-positive price for {symbol}: {price}"
            )));
        }
        Ok(price)
    }
}
