use soroban_sdk::{contractclient, contracttype, Address, Env, Symbol};

use crate::math::pow10;
use crate::types::Error;

/// Reflector-compatible price feed. Every allocation names one of these as
/// its price source and is quoted as `Asset::Stellar(underlying)`.
#[contractclient(name = "ReflectorClient")]
pub trait ReflectorContract {
    fn decimals(env: Env) -> u32;
    fn lastprice(env: Env, asset: Asset) -> Option<PriceData>;
}

#[contracttype]
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum Asset {
    Stellar(Address),
    Other(Symbol),
}

#[contracttype]
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct PriceData {
    pub price: i128,
    pub timestamp: u64,
}

impl PriceData {
    /// Check if price data is stale (older than specified seconds)
    pub fn is_stale(&self, current_timestamp: u64, max_age_seconds: u64) -> bool {
        current_timestamp.saturating_sub(self.timestamp) > max_age_seconds
    }
}

/// A usable price: `value = amount * price / scale`.
#[contracttype]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PriceQuote {
    pub price: i128,
    pub scale: i128,
}

/// Reads the latest price of `token` from `source`.
///
/// A missing, non-positive or stale reading aborts with `StaleData`; a
/// broken feed is never folded into the valuation as zero.
pub fn read_price(
    env: &Env,
    source: &Address,
    token: &Address,
    max_age: u64,
) -> Result<PriceQuote, Error> {
    let client = ReflectorClient::new(env, source);
    let data = match client.try_lastprice(&Asset::Stellar(token.clone())) {
        Ok(Ok(Some(data))) => data,
        _ => return Err(Error::StaleData),
    };
    if data.price <= 0 || data.is_stale(env.ledger().timestamp(), max_age) {
        return Err(Error::StaleData);
    }
    let decimals = match client.try_decimals() {
        Ok(Ok(decimals)) => decimals,
        _ => return Err(Error::StaleData),
    };
    Ok(PriceQuote {
        price: data.price,
        scale: pow10(decimals)?,
    })
}
