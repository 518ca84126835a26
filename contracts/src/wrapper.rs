use soroban_sdk::{contractclient, log, Address, Env};

use crate::auth::authorize_transfer;
use crate::types::{Allocation, Error, SkipReason};

/// Yield-bearing wrapper around an underlying token. Balances are wrapper
/// shares; `exchange_rate` is underlying per share scaled by `RATE_SCALE`.
#[contractclient(name = "YieldWrapperClient")]
pub trait YieldWrapper {
    fn underlying(env: Env) -> Address;
    fn balance(env: Env, id: Address) -> i128;
    fn exchange_rate(env: Env) -> i128;
    fn deposit(env: Env, from: Address, amount: i128, receiver: Address) -> i128;
    fn withdraw(env: Env, shares: i128, receiver: Address, owner: Address) -> i128;
    fn is_unlocked(env: Env, holder: Address) -> bool;
}

pub fn underlying(env: &Env, wrapper: &Address) -> Address {
    YieldWrapperClient::new(env, wrapper).underlying()
}

/// Wrapper shares held by the portfolio.
pub fn held_shares(env: &Env, wrapper: &Address) -> i128 {
    YieldWrapperClient::new(env, wrapper).balance(&env.current_contract_address())
}

pub fn exchange_rate(env: &Env, wrapper: &Address) -> Result<i128, Error> {
    let rate = YieldWrapperClient::new(env, wrapper).exchange_rate();
    if rate <= 0 {
        return Err(Error::InvalidExchangeRate);
    }
    Ok(rate)
}

/// Deposits `amount` of underlying the portfolio already holds, crediting
/// the shares to the portfolio. Failure aborts the caller.
pub fn deposit(env: &Env, allocation: &Allocation, amount: i128) -> i128 {
    let this = env.current_contract_address();
    authorize_transfer(env, &allocation.underlying, &allocation.wrapper, amount);
    YieldWrapperClient::new(env, &allocation.wrapper).deposit(&this, &amount, &this)
}

/// Redeems `shares` of the portfolio's holding straight to `receiver`.
pub fn withdraw(env: &Env, wrapper: &Address, shares: i128, receiver: &Address) -> i128 {
    let this = env.current_contract_address();
    YieldWrapperClient::new(env, wrapper).withdraw(&shares, receiver, &this)
}

/// False when the holding is locked or the wrapper cannot say.
pub fn try_is_unlocked(env: &Env, wrapper: &Address) -> bool {
    let client = YieldWrapperClient::new(env, wrapper);
    matches!(
        client.try_is_unlocked(&env.current_contract_address()),
        Ok(Ok(true))
    )
}

/// Like [`deposit`] but a failing wrapper is reported instead of aborting.
pub fn try_deposit(env: &Env, allocation: &Allocation, amount: i128) -> Result<i128, SkipReason> {
    let this = env.current_contract_address();
    authorize_transfer(env, &allocation.underlying, &allocation.wrapper, amount);
    match YieldWrapperClient::new(env, &allocation.wrapper).try_deposit(&this, &amount, &this) {
        Ok(Ok(shares)) => Ok(shares),
        _ => {
            log!(env, "wrapper deposit failed", allocation.wrapper.clone(), amount);
            Err(SkipReason::DepositFailed)
        }
    }
}

/// Redeems portfolio shares back into the portfolio, reporting a failing
/// wrapper instead of aborting.
pub fn try_withdraw(env: &Env, wrapper: &Address, shares: i128) -> Result<i128, SkipReason> {
    let this = env.current_contract_address();
    match YieldWrapperClient::new(env, wrapper).try_withdraw(&shares, &this, &this) {
        Ok(Ok(received)) => Ok(received),
        _ => {
            log!(env, "wrapper withdraw failed", wrapper.clone(), shares);
            Err(SkipReason::WithdrawFailed)
        }
    }
}
