use soroban_sdk::{symbol_short, Address, Env};

use crate::types::{Allocation, Config, RebalanceReport, SkipReason};

pub fn allocation_added(env: &Env, allocation: &Allocation) {
    env.events().publish(
        (symbol_short!("alloc_add"), allocation.wrapper.clone()),
        (
            allocation.underlying.clone(),
            allocation.price_source.clone(),
            allocation.target_bps,
        ),
    );
}

pub fn allocation_percentage_changed(env: &Env, wrapper: &Address, previous: u32, target_bps: u32) {
    env.events().publish(
        (symbol_short!("alloc_pct"), wrapper.clone()),
        (previous, target_bps),
    );
}

pub fn allocation_removed(env: &Env, wrapper: &Address) {
    env.events()
        .publish((symbol_short!("alloc_rm"), wrapper.clone()), ());
}

pub fn deposited(env: &Env, wrapper: &Address, from: &Address, amount: i128, shares: i128) {
    env.events().publish(
        (symbol_short!("deposited"), wrapper.clone(), from.clone()),
        (amount, shares),
    );
}

/// `amount` is in wrapper shares; `underlying` is what the receiver got.
pub fn withdrawn(env: &Env, wrapper: &Address, receiver: &Address, amount: i128, underlying: i128) {
    env.events().publish(
        (symbol_short!("withdrawn"), wrapper.clone(), receiver.clone()),
        (amount, underlying),
    );
}

/// Value moved out of an over-weight allocation into the intermediate.
pub fn shed(env: &Env, wrapper: &Address, shares: i128, underlying: i128, proceeds: i128) {
    env.events().publish(
        (symbol_short!("shed"), wrapper.clone()),
        (shares, underlying, proceeds),
    );
}

/// Intermediate spent on an under-weight allocation.
pub fn acquired(env: &Env, wrapper: &Address, spent: i128, underlying: i128, shares: i128) {
    env.events().publish(
        (symbol_short!("acquire"), wrapper.clone()),
        (spent, underlying, shares),
    );
}

pub fn skipped(env: &Env, wrapper: &Address, reason: SkipReason) {
    env.events()
        .publish((symbol_short!("skipped"), wrapper.clone()), reason);
}

pub fn rebalanced(env: &Env, report: &RebalanceReport) {
    env.events()
        .publish((symbol_short!("rebalance"),), report.clone());
}

pub fn config_updated(env: &Env, config: &Config) {
    env.events()
        .publish((symbol_short!("config"),), config.clone());
}

pub fn paused(env: &Env, paused: bool) {
    env.events().publish((symbol_short!("paused"),), paused);
}

pub fn admin_changed(env: &Env, admin: &Address) {
    env.events()
        .publish((symbol_short!("admin"),), admin.clone());
}

pub fn transfer(env: &Env, from: &Address, to: &Address, amount: i128) {
    env.events().publish(
        (symbol_short!("transfer"), from.clone(), to.clone()),
        amount,
    );
}

pub fn approve(env: &Env, from: &Address, spender: &Address, amount: i128, expiration_ledger: u32) {
    env.events().publish(
        (symbol_short!("approve"), from.clone(), spender.clone()),
        (amount, expiration_ledger),
    );
}

pub fn mint(env: &Env, to: &Address, amount: i128) {
    env.events()
        .publish((symbol_short!("mint"), to.clone()), amount);
}

pub fn burn(env: &Env, from: &Address, amount: i128) {
    env.events()
        .publish((symbol_short!("burn"), from.clone()), amount);
}
