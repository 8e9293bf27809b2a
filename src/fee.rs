use crate::chain::ChainClient;
use crate::error::ConfigError;
use crate::types::GAS_LIMIT;
use ethers::types::U256;
use ethers::utils::{format_ether, format_units};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

const BASIS_POINTS: u64 = 10_000;

pub fn gwei_to_wei(gwei: f64) -> U256 {
    U256::from((gwei * 1e9).round() as u128)
}

/// How the gas price of each transfer is chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum FeePolicy {
    /// Constant price for every transfer.
    Fixed { gwei: f64 },
    /// `eth_gasPrice` per transfer, `fallback_gwei` when the query fails.
    Live { fallback_gwei: f64 },
    /// Live price scaled by a random factor, clamped to `[min_gwei, max_gwei]`.
    LiveMarkup {
        min_factor: f64,
        max_factor: f64,
        min_gwei: f64,
        max_gwei: f64,
        fallback_gwei: f64,
    },
}

impl Default for FeePolicy {
    fn default() -> Self {
        FeePolicy::Fixed { gwei: 100.0 }
    }
}

impl FeePolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name: &str, value: f64| {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::InvalidFee(format!("{} must be positive, got {}", name, value)))
            }
        };

        match *self {
            FeePolicy::Fixed { gwei } => positive("gwei", gwei),
            FeePolicy::Live { fallback_gwei } => positive("fallback_gwei", fallback_gwei),
            FeePolicy::LiveMarkup {
                min_factor,
                max_factor,
                min_gwei,
                max_gwei,
                fallback_gwei,
            } => {
                positive("min_factor", min_factor)?;
                positive("max_factor", max_factor)?;
                positive("min_gwei", min_gwei)?;
                positive("max_gwei", max_gwei)?;
                positive("fallback_gwei", fallback_gwei)?;
                if min_factor > max_factor {
                    return Err(ConfigError::InvalidFee(format!(
                        "min_factor {} exceeds max_factor {}",
                        min_factor, max_factor
                    )));
                }
                if min_gwei > max_gwei {
                    return Err(ConfigError::InvalidFee(format!(
                        "min_gwei {} exceeds max_gwei {}",
                        min_gwei, max_gwei
                    )));
                }
                Ok(())
            }
        }
    }

    /// Gas price in wei for the next transfer.
    pub async fn gas_price<R: Rng + ?Sized>(&self, client: &dyn ChainClient, rng: &mut R) -> U256 {
        match *self {
            FeePolicy::Fixed { gwei } => gwei_to_wei(gwei),
            FeePolicy::Live { fallback_gwei } => live_or_fallback(client, fallback_gwei).await,
            FeePolicy::LiveMarkup {
                min_factor,
                max_factor,
                min_gwei,
                max_gwei,
                fallback_gwei,
            } => {
                let factor = rng.gen_range(min_factor..=max_factor);
                let base = live_or_fallback(client, fallback_gwei).await;
                let marked_up = base
                    .saturating_mul(U256::from((factor * BASIS_POINTS as f64).round() as u64))
                    / U256::from(BASIS_POINTS);
                marked_up.clamp(gwei_to_wei(min_gwei), gwei_to_wei(max_gwei))
            }
        }
    }
}

async fn live_or_fallback(client: &dyn ChainClient, fallback_gwei: f64) -> U256 {
    match client.gas_price().await {
        Ok(price) => price,
        Err(e) => {
            warn!("Unable to fetch gas price, using {} gwei: {:#}", fallback_gwei, e);
            gwei_to_wei(fallback_gwei)
        }
    }
}

fn default_decimals() -> u32 {
    2
}

/// Transfer amount range in whole tokens. Amounts are drawn on a
/// `10^-decimals` grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountRange {
    pub min: f64,
    pub max: f64,
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

impl Default for AmountRange {
    fn default() -> Self {
        Self {
            min: 0.01,
            max: 3.0,
            decimals: default_decimals(),
        }
    }
}

impl AmountRange {
    fn grid_bounds(&self) -> (u128, u128) {
        let scale = 10f64.powi(self.decimals as i32);
        (
            (self.min * scale).round() as u128,
            (self.max * scale).round() as u128,
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decimals > 18 {
            return Err(ConfigError::InvalidAmount(format!(
                "decimals must be at most 18, got {}",
                self.decimals
            )));
        }
        if !(self.min.is_finite() && self.max.is_finite()) || self.min <= 0.0 {
            return Err(ConfigError::InvalidAmount(format!(
                "min must be positive, got {}",
                self.min
            )));
        }
        if self.min > self.max {
            return Err(ConfigError::InvalidAmount(format!(
                "min {} exceeds max {}",
                self.min, self.max
            )));
        }
        if self.grid_bounds().0 == 0 {
            return Err(ConfigError::InvalidAmount(format!(
                "min {} rounds to zero with {} decimals",
                self.min, self.decimals
            )));
        }
        Ok(())
    }

    /// Random amount in wei.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> U256 {
        let (low, high) = self.grid_bounds();
        let units = if low >= high {
            low
        } else {
            rng.gen_range(low..=high)
        };
        U256::from(units) * U256::exp10(18 - self.decimals as usize)
    }
}

/// Logs the current network gas price and what a plain transfer would cost.
pub async fn report_network_fee(client: &dyn ChainClient, token_symbol: &str) {
    match client.gas_price().await {
        Ok(price) => {
            let gwei = format_units(price, "gwei").unwrap_or_else(|_| price.to_string());
            info!("Gas price: {} gwei", gwei);
            match price.checked_mul(U256::from(GAS_LIMIT)) {
                Some(fee) => {
                    info!("Estimated transfer fee: {} {}", format_ether(fee), token_symbol)
                }
                None => warn!("Gas price {} wei is out of range for a transfer fee", price),
            }
        }
        Err(e) => error!("Unable to fetch gas price from the network: {:#}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockChain;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[tokio::test]
    async fn fixed_policy_ignores_network() {
        let chain = MockChain::default().with_gas_price(Some(gwei_to_wei(1.0)));
        let mut rng = StdRng::seed_from_u64(1);
        let price = FeePolicy::default().gas_price(&chain, &mut rng).await;
        assert_eq!(price, U256::from(100_000_000_000u64));
        assert_eq!(chain.gas_price_calls(), 0);
    }

    #[tokio::test]
    async fn live_policy_falls_back_when_unavailable() {
        let mut rng = StdRng::seed_from_u64(1);
        let policy = FeePolicy::Live { fallback_gwei: 3.0 };

        let chain = MockChain::default().with_gas_price(Some(gwei_to_wei(7.5)));
        assert_eq!(policy.gas_price(&chain, &mut rng).await, gwei_to_wei(7.5));

        let offline = MockChain::default().with_gas_price(None);
        assert_eq!(policy.gas_price(&offline, &mut rng).await, gwei_to_wei(3.0));
    }

    #[tokio::test]
    async fn markup_is_applied_and_clamped() {
        let mut rng = StdRng::seed_from_u64(9);
        let policy = FeePolicy::LiveMarkup {
            min_factor: 1.1,
            max_factor: 1.3,
            min_gwei: 5.0,
            max_gwei: 50.0,
            fallback_gwei: 10.0,
        };

        let cheap = MockChain::default().with_gas_price(Some(gwei_to_wei(1.0)));
        assert_eq!(policy.gas_price(&cheap, &mut rng).await, gwei_to_wei(5.0));

        let expensive = MockChain::default().with_gas_price(Some(gwei_to_wei(100.0)));
        assert_eq!(policy.gas_price(&expensive, &mut rng).await, gwei_to_wei(50.0));

        let absurd = MockChain::default().with_gas_price(Some(U256::MAX / 2));
        assert_eq!(policy.gas_price(&absurd, &mut rng).await, gwei_to_wei(50.0));

        let normal = MockChain::default().with_gas_price(Some(gwei_to_wei(20.0)));
        for _ in 0..20 {
            let price = policy.gas_price(&normal, &mut rng).await;
            assert!(price >= gwei_to_wei(22.0) && price <= gwei_to_wei(26.0));
        }
    }

    #[test]
    fn rejects_inverted_markup_band() {
        let policy = FeePolicy::LiveMarkup {
            min_factor: 1.5,
            max_factor: 1.1,
            min_gwei: 1.0,
            max_gwei: 2.0,
            fallback_gwei: 1.0,
        };
        assert!(matches!(policy.validate(), Err(ConfigError::InvalidFee(_))));
        assert!(FeePolicy::Fixed { gwei: 0.0 }.validate().is_err());
    }

    #[test]
    fn amounts_stay_on_grid_and_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let range = AmountRange::default();
        let step = U256::exp10(16);

        for _ in 0..500 {
            let amount = range.sample(&mut rng);
            assert!(amount >= U256::exp10(16));
            assert!(amount <= U256::from(3) * U256::exp10(18));
            assert!((amount % step).is_zero());
        }
    }

    #[test]
    fn equal_bounds_give_fixed_amount() {
        let mut rng = StdRng::seed_from_u64(3);
        let range = AmountRange {
            min: 0.001,
            max: 0.001,
            decimals: 3,
        };
        range.validate().unwrap();
        assert_eq!(range.sample(&mut rng), U256::exp10(15));
    }

    #[test]
    fn rejects_bad_amount_ranges() {
        let inverted = AmountRange {
            min: 1.0,
            max: 0.5,
            decimals: 2,
        };
        assert!(inverted.validate().is_err());

        let too_fine = AmountRange {
            min: 0.001,
            max: 0.1,
            decimals: 2,
        };
        assert!(too_fine.validate().is_err());

        let negative = AmountRange {
            min: -1.0,
            max: 0.1,
            decimals: 2,
        };
        assert!(negative.validate().is_err());
    }
}
