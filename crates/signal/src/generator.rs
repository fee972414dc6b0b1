use std::sync::{Arc, Mutex};

use midas_core::{Direction, Signal, Symbol};
use midas_ports::{Clock, MarketData, MarketError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Generator configuration
#[derive(Debug, Clone)]
pub struct SignalConfig {
    /// Symbols to draw from, uniformly
    pub symbols: Vec<Symbol>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["XAUUSD".into(), "EURUSD".into(), "GBPUSD".into()],
        }
    }
}

/// Combines the market adapter with randomized direction and the fixed
/// offset policy to emit one [`Signal`] per call.
///
/// The RNG is injectable so tests can pin the draws; the clock stamps the
/// signal timestamp.
pub struct SignalGenerator {
    market: Arc<dyn MarketData>,
    clock: Arc<dyn Clock>,
    config: SignalConfig,
    rng: Mutex<StdRng>,
}

impl SignalGenerator {
    pub fn new(market: Arc<dyn MarketData>, clock: Arc<dyn Clock>, config: SignalConfig) -> Self {
        Self::with_rng(market, clock, config, StdRng::from_entropy())
    }

    pub fn with_rng(
        market: Arc<dyn MarketData>,
        clock: Arc<dyn Clock>,
        config: SignalConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            market,
            clock,
            config,
            rng: Mutex::new(rng),
        }
    }

    /// Generate one signal, or surface the market failure for the caller to
    /// skip the tick on
    pub async fn generate(&self) -> Result<Signal, MarketError> {
        // Draw before the fetch; the lock is never held across an await
        let (symbol, direction, confidence) = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let symbol = self
                .config
                .symbols
                .choose(&mut *rng)
                .cloned()
                .ok_or_else(|| MarketError::Unavailable("no symbols configured".into()))?;
            let direction = if rng.gen_bool(0.5) {
                Direction::Buy
            } else {
                Direction::Sell
            };
            let confidence: u8 = rng.gen_range(70..=90);
            (symbol, direction, confidence)
        };

        let price = self.market.price_of(&symbol).await?;
        log::debug!("generated {direction:?} {symbol} @ {price} ({confidence}%)");

        Ok(Signal::from_market(
            symbol,
            direction,
            price,
            confidence,
            self.clock.now(),
        ))
    }
}
