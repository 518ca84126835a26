//! Deposits mint portfolio shares against one allocation; withdrawals burn
//! shares and pay out a pro-rata slice of every allocation.

use soroban_sdk::{contractclient, log, token, Address, BytesN, Env, Vec};

use crate::events;
use crate::math::mul_div_floor;
use crate::registry;
use crate::share;
use crate::types::{Allocation, Error, Permit, PermitDeposit};
use crate::valuation::to_shares;
use crate::wrapper;

/// Underlying tokens that accept signed approvals. The token checks the
/// signature against its own domain-separated digest and burns the nonce.
#[contractclient(name = "PermitTokenClient")]
pub trait PermitToken {
    fn permit(
        env: Env,
        owner: Address,
        spender: Address,
        amount: i128,
        deadline: u64,
        signature: BytesN<64>,
    );
}

/// How the depositor's underlying reaches the portfolio.
pub enum Funding {
    /// The depositor authorizes this call, and the transfer within it.
    Transfer,
    Permit(Permit),
}

fn check_permit(env: &Env, permit: &Permit) -> Result<(), Error> {
    if permit.deadline < env.ledger().timestamp() {
        return Err(Error::PermitExpired);
    }
    Ok(())
}

fn pull(env: &Env, from: &Address, allocation: &Allocation, amount: i128, funding: Funding) {
    let this = env.current_contract_address();
    let underlying = token::Client::new(env, &allocation.underlying);
    match funding {
        Funding::Transfer => underlying.transfer(from, &this, &amount),
        Funding::Permit(permit) => {
            PermitTokenClient::new(env, &allocation.underlying).permit(
                from,
                &this,
                &amount,
                &permit.deadline,
                &permit.signature,
            );
            underlying.transfer_from(&this, from, &this, &amount);
        }
    }
}

/// Mints `amount * RATE_SCALE / exchange_rate` shares to `from` and moves
/// `amount` of underlying into the allocation's wrapper.
pub fn deposit(
    env: &Env,
    from: &Address,
    wrapper: &Address,
    amount: i128,
    funding: Funding,
) -> Result<i128, Error> {
    let allocation = registry::require(env, wrapper)?;
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    if let Funding::Permit(permit) = &funding {
        check_permit(env, permit)?;
    }
    let rate = wrapper::exchange_rate(env, wrapper)?;
    let shares = to_shares(env, amount, rate)?;
    if shares <= 0 {
        log!(env, "deposit too small to mint a share", amount, rate);
        return Err(Error::InvalidAmount);
    }

    share::mint(env, from, shares)?;
    pull(env, from, &allocation, amount, funding);
    wrapper::deposit(env, &allocation, amount);
    events::deposited(env, wrapper, from, amount, shares);
    Ok(shares)
}

/// Applies every request or none of them.
pub fn deposit_batch(
    env: &Env,
    from: &Address,
    requests: &Vec<PermitDeposit>,
) -> Result<i128, Error> {
    if requests.is_empty() {
        return Err(Error::InvalidAmount);
    }
    for request in requests.iter() {
        registry::require(env, &request.wrapper)?;
        if request.amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        check_permit(env, &request.permit)?;
    }
    let mut minted: i128 = 0;
    for request in requests.iter() {
        let shares = deposit(
            env,
            from,
            &request.wrapper,
            request.amount,
            Funding::Permit(request.permit),
        )?;
        minted = minted.checked_add(shares).ok_or(Error::ArithmeticError)?;
    }
    Ok(minted)
}

/// Burns `shares` and redeems `held * shares / supply_before_burn` wrapper
/// shares of every allocation to `receiver`. Returns those amounts in
/// registry order; zero amounts are not redeemed.
pub fn withdraw(
    env: &Env,
    from: &Address,
    shares: i128,
    receiver: &Address,
) -> Result<Vec<i128>, Error> {
    if shares <= 0 {
        return Err(Error::InvalidAmount);
    }
    if shares > share::balance(env, from) {
        return Err(Error::InsufficientBalance);
    }
    let supply = share::total_supply(env);
    let allocations = registry::load(env);
    let mut amounts = Vec::new(env);
    for allocation in allocations.iter() {
        let held = wrapper::held_shares(env, &allocation.wrapper);
        amounts.push_back(mul_div_floor(env, held, shares, supply)?);
    }

    share::burn(env, from, shares)?;

    for (allocation, amount) in allocations.iter().zip(amounts.iter()) {
        if amount > 0 {
            let underlying = wrapper::withdraw(env, &allocation.wrapper, amount, receiver);
            events::withdrawn(env, &allocation.wrapper, receiver, amount, underlying);
        }
    }
    Ok(amounts)
}
