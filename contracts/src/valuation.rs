use soroban_sdk::{contracttype, token, Env, Vec};

use crate::math::{bps_of, mul_div_floor, RATE_SCALE};
use crate::reflector::{read_price, PriceQuote};
use crate::registry;
use crate::types::{Allocation, AllocationValue, Config, Error};
use crate::wrapper;

/// Live state of one allocation as read at the start of a call.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Holding {
    pub allocation: Allocation,
    pub shares: i128,
    pub rate: i128,
    /// Zero when the holding is empty and its feed was never read.
    pub price: PriceQuote,
    pub value: i128,
}

pub struct Snapshot {
    /// Holdings plus the idle intermediate currency.
    pub total_value: i128,
    pub holdings: Vec<Holding>,
}

pub fn to_underlying(env: &Env, shares: i128, rate: i128) -> Result<i128, Error> {
    mul_div_floor(env, shares, rate, RATE_SCALE)
}

pub fn to_shares(env: &Env, underlying: i128, rate: i128) -> Result<i128, Error> {
    mul_div_floor(env, underlying, RATE_SCALE, rate)
}

pub fn value(env: &Env, amount: i128, price: &PriceQuote) -> Result<i128, Error> {
    mul_div_floor(env, amount, price.price, price.scale)
}

/// Inverse of [`value`]: units of the priced asset worth `value`.
pub fn amount_for(env: &Env, value: i128, price: &PriceQuote) -> Result<i128, Error> {
    mul_div_floor(env, value, price.scale, price.price)
}

/// Intermediate currency the portfolio holds between passes.
pub fn idle(env: &Env, config: &Config) -> i128 {
    token::Client::new(env, &config.intermediate).balance(&env.current_contract_address())
}

pub fn holding(env: &Env, config: &Config, allocation: &Allocation) -> Result<Holding, Error> {
    let shares = wrapper::held_shares(env, &allocation.wrapper);
    if shares <= 0 {
        return Ok(Holding {
            allocation: allocation.clone(),
            shares: 0,
            rate: 0,
            price: PriceQuote { price: 0, scale: 1 },
            value: 0,
        });
    }
    let rate = wrapper::exchange_rate(env, &allocation.wrapper)?;
    let price = read_price(
        env,
        &allocation.price_source,
        &allocation.underlying,
        config.max_price_age,
    )?;
    let worth = value(env, to_underlying(env, shares, rate)?, &price)?;
    Ok(Holding {
        allocation: allocation.clone(),
        shares,
        rate,
        price,
        value: worth,
    })
}

pub fn snapshot(env: &Env, config: &Config) -> Result<Snapshot, Error> {
    let mut holdings = Vec::new(env);
    let mut total_value: i128 = 0;
    for allocation in registry::load(env).iter() {
        let entry = holding(env, config, &allocation)?;
        total_value = total_value
            .checked_add(entry.value)
            .ok_or(Error::ArithmeticError)?;
        holdings.push_back(entry);
    }
    // Undeployed intermediate still belongs to the portfolio, so targets
    // are sized to absorb it.
    let held = idle(env, config);
    if held > 0 {
        let price = read_price(
            env,
            &config.intermediate_oracle,
            &config.intermediate,
            config.max_price_age,
        )?;
        total_value = total_value
            .checked_add(value(env, held, &price)?)
            .ok_or(Error::ArithmeticError)?;
    }
    Ok(Snapshot {
        total_value,
        holdings,
    })
}

impl Snapshot {
    /// Current, target and signed delta per allocation, in registry order.
    pub fn values(&self, env: &Env) -> Result<Vec<AllocationValue>, Error> {
        let mut values = Vec::new(env);
        for holding in self.holdings.iter() {
            let target_value = bps_of(env, self.total_value, holding.allocation.target_bps)?;
            values.push_back(AllocationValue {
                wrapper: holding.allocation.wrapper.clone(),
                current_value: holding.value,
                target_value,
                delta: holding.value - target_value,
            });
        }
        Ok(values)
    }

    /// Half-width of the band around each target inside which nothing moves.
    pub fn tolerance(&self, env: &Env, config: &Config) -> Result<i128, Error> {
        bps_of(env, self.total_value, config.rebalance_threshold_bps)
    }
}
