//! Portfolio share accounting. Supply moves only through `mint` (deposits)
//! and `burn` (withdrawals); `transfer` just reassigns claims.

use soroban_sdk::{Address, Env};

use crate::events;
use crate::storage::{BALANCE_BUMP_AMOUNT, BALANCE_LIFETIME_THRESHOLD};
use crate::types::{AllowanceDataKey, AllowanceValue, DataKey, Error};

pub const SHARE_DECIMALS: u32 = 7;

pub fn balance(env: &Env, id: &Address) -> i128 {
    let key = DataKey::Balance(id.clone());
    match env.storage().persistent().get::<_, i128>(&key) {
        Some(balance) => {
            env.storage()
                .persistent()
                .extend_ttl(&key, BALANCE_LIFETIME_THRESHOLD, BALANCE_BUMP_AMOUNT);
            balance
        }
        None => 0,
    }
}

fn write_balance(env: &Env, id: &Address, amount: i128) {
    let key = DataKey::Balance(id.clone());
    env.storage().persistent().set(&key, &amount);
    env.storage()
        .persistent()
        .extend_ttl(&key, BALANCE_LIFETIME_THRESHOLD, BALANCE_BUMP_AMOUNT);
}

pub fn total_supply(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::TotalSupply)
        .unwrap_or(0)
}

fn write_total_supply(env: &Env, supply: i128) {
    env.storage().instance().set(&DataKey::TotalSupply, &supply);
}

fn credit(env: &Env, id: &Address, amount: i128) -> Result<(), Error> {
    let balance = balance(env, id)
        .checked_add(amount)
        .ok_or(Error::ArithmeticError)?;
    write_balance(env, id, balance);
    Ok(())
}

fn debit(env: &Env, id: &Address, amount: i128) -> Result<(), Error> {
    let balance = balance(env, id);
    if balance < amount {
        return Err(Error::InsufficientBalance);
    }
    write_balance(env, id, balance - amount);
    Ok(())
}

pub fn mint(env: &Env, to: &Address, amount: i128) -> Result<(), Error> {
    let supply = total_supply(env)
        .checked_add(amount)
        .ok_or(Error::ArithmeticError)?;
    credit(env, to, amount)?;
    write_total_supply(env, supply);
    events::mint(env, to, amount);
    Ok(())
}

pub fn burn(env: &Env, from: &Address, amount: i128) -> Result<(), Error> {
    debit(env, from, amount)?;
    write_total_supply(env, total_supply(env) - amount);
    events::burn(env, from, amount);
    Ok(())
}

pub fn transfer(env: &Env, from: &Address, to: &Address, amount: i128) -> Result<(), Error> {
    if amount < 0 {
        return Err(Error::InvalidAmount);
    }
    debit(env, from, amount)?;
    credit(env, to, amount)?;
    events::transfer(env, from, to, amount);
    Ok(())
}

fn read_allowance_value(env: &Env, from: &Address, spender: &Address) -> AllowanceValue {
    let key = DataKey::Allowance(AllowanceDataKey {
        from: from.clone(),
        spender: spender.clone(),
    });
    match env.storage().temporary().get::<_, AllowanceValue>(&key) {
        Some(allowance) if allowance.expiration_ledger >= env.ledger().sequence() => allowance,
        Some(allowance) => AllowanceValue {
            amount: 0,
            expiration_ledger: allowance.expiration_ledger,
        },
        None => AllowanceValue {
            amount: 0,
            expiration_ledger: 0,
        },
    }
}

pub fn allowance(env: &Env, from: &Address, spender: &Address) -> i128 {
    read_allowance_value(env, from, spender).amount
}

pub fn approve(
    env: &Env,
    from: &Address,
    spender: &Address,
    amount: i128,
    expiration_ledger: u32,
) -> Result<(), Error> {
    if amount < 0 {
        return Err(Error::InvalidAmount);
    }
    if amount > 0 && expiration_ledger < env.ledger().sequence() {
        return Err(Error::InvalidExpiration);
    }
    let key = DataKey::Allowance(AllowanceDataKey {
        from: from.clone(),
        spender: spender.clone(),
    });
    env.storage().temporary().set(
        &key,
        &AllowanceValue {
            amount,
            expiration_ledger,
        },
    );
    if amount > 0 {
        let live_for = expiration_ledger
            .checked_sub(env.ledger().sequence())
            .ok_or(Error::InvalidExpiration)?;
        env.storage().temporary().extend_ttl(&key, live_for, live_for);
    }
    events::approve(env, from, spender, amount, expiration_ledger);
    Ok(())
}

pub fn spend_allowance(
    env: &Env,
    from: &Address,
    spender: &Address,
    amount: i128,
) -> Result<(), Error> {
    let allowance = read_allowance_value(env, from, spender);
    if allowance.amount < amount {
        return Err(Error::InsufficientAllowance);
    }
    if amount > 0 {
        let key = DataKey::Allowance(AllowanceDataKey {
            from: from.clone(),
            spender: spender.clone(),
        });
        env.storage().temporary().set(
            &key,
            &AllowanceValue {
                amount: allowance.amount - amount,
                expiration_ledger: allowance.expiration_ledger,
            },
        );
    }
    Ok(())
}
