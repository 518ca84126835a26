//! Ordered, uniquely keyed allocation set: a vector in registry order plus a
//! wrapper -> position index.

use soroban_sdk::{Address, Env, Vec};

use crate::math::BPS_DENOMINATOR;
use crate::types::{Allocation, Config, DataKey, Error};

pub fn load(env: &Env) -> Vec<Allocation> {
    env.storage()
        .instance()
        .get(&DataKey::Allocations)
        .unwrap_or(Vec::new(env))
}

fn save(env: &Env, allocations: &Vec<Allocation>) {
    env.storage()
        .instance()
        .set(&DataKey::Allocations, allocations);
}

fn index_of(env: &Env, wrapper: &Address) -> Option<u32> {
    env.storage()
        .instance()
        .get(&DataKey::AllocationIndex(wrapper.clone()))
}

fn set_index(env: &Env, wrapper: &Address, index: u32) {
    env.storage()
        .instance()
        .set(&DataKey::AllocationIndex(wrapper.clone()), &index);
}

pub fn get(env: &Env, wrapper: &Address) -> Option<Allocation> {
    index_of(env, wrapper).and_then(|index| load(env).get(index))
}

pub fn require(env: &Env, wrapper: &Address) -> Result<Allocation, Error> {
    get(env, wrapper).ok_or(Error::AllocationNotFound)
}

pub fn total_bps(allocations: &Vec<Allocation>) -> u32 {
    allocations.iter().map(|a| a.target_bps).sum()
}

pub fn validate_percentage(target_bps: u32) -> Result<(), Error> {
    if target_bps == 0 || target_bps >= BPS_DENOMINATOR {
        return Err(Error::InvalidPercentage);
    }
    Ok(())
}

/// Checks everything `add` needs short of reading the wrapper itself.
pub fn check_new(
    env: &Env,
    config: &Config,
    wrapper: &Address,
    price_source: &Address,
    target_bps: u32,
) -> Result<(), Error> {
    let this = env.current_contract_address();
    if *wrapper == this
        || *price_source == this
        || wrapper == price_source
        || *wrapper == config.intermediate
    {
        return Err(Error::InvalidAddress);
    }
    validate_percentage(target_bps)?;
    if index_of(env, wrapper).is_some() {
        return Err(Error::DuplicateAllocation);
    }
    if total_bps(&load(env)) + target_bps > BPS_DENOMINATOR {
        return Err(Error::AllocationOversubscribed);
    }
    Ok(())
}

pub fn push(env: &Env, allocation: &Allocation) {
    let mut allocations = load(env);
    set_index(env, &allocation.wrapper, allocations.len());
    allocations.push_back(allocation.clone());
    save(env, &allocations);
}

/// Replaces the target of an existing allocation, returning the old one.
/// The sum over all allocations must stay within 100%.
pub fn set_percentage(env: &Env, wrapper: &Address, target_bps: u32) -> Result<u32, Error> {
    let index = index_of(env, wrapper).ok_or(Error::AllocationNotFound)?;
    validate_percentage(target_bps)?;
    let mut allocations = load(env);
    let mut allocation = allocations.get(index).ok_or(Error::AllocationNotFound)?;
    let others = total_bps(&allocations) - allocation.target_bps;
    if others + target_bps > BPS_DENOMINATOR {
        return Err(Error::AllocationOversubscribed);
    }
    let previous = allocation.target_bps;
    allocation.target_bps = target_bps;
    allocations.set(index, allocation);
    save(env, &allocations);
    Ok(previous)
}

/// Swap-with-last removal; the moved allocation's index is rewritten.
pub fn remove(env: &Env, wrapper: &Address) -> Result<Allocation, Error> {
    let index = index_of(env, wrapper).ok_or(Error::AllocationNotFound)?;
    let mut allocations = load(env);
    let removed = allocations.get(index).ok_or(Error::AllocationNotFound)?;
    let last = allocations.len() - 1;
    if index != last {
        let moved = allocations.get(last).ok_or(Error::AllocationNotFound)?;
        set_index(env, &moved.wrapper, index);
        allocations.set(index, moved);
    }
    allocations.pop_back();
    env.storage()
        .instance()
        .remove(&DataKey::AllocationIndex(wrapper.clone()));
    save(env, &allocations);
    Ok(removed)
}
