//! Single-pass rebalancing.
//!
//! One snapshot is taken and turned into a plan of shed legs (over target)
//! and acquire legs (under target) before anything moves. Shed legs turn
//! excess into the intermediate currency; acquire legs spend whatever
//! intermediate the portfolio actually holds at that point, including
//! carry-over from earlier passes, which the snapshot counts as value. A leg
//! that cannot run is reported and skipped, never fatal; anything it leaves
//! on the portfolio is picked up by a later pass.

use soroban_sdk::{contracttype, log, token, Address, Env, Vec};

use crate::events;
use crate::registry;
use crate::reflector::{read_price, PriceQuote};
use crate::storage;
use crate::swap;
use crate::types::{Allocation, Config, Error, RebalanceReport, SkipReason};
use crate::valuation::{self, amount_for, idle, to_shares, to_underlying, Holding, Snapshot};
use crate::wrapper;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ShedLeg {
    pub holding: Holding,
    pub excess: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AcquireLeg {
    pub allocation: Allocation,
    pub deficit: i128,
}

pub struct Plan {
    pub total_value: i128,
    pub sheds: Vec<ShedLeg>,
    pub acquires: Vec<AcquireLeg>,
    /// Read only when there is something to acquire.
    pub intermediate_price: Option<PriceQuote>,
}

struct Fill {
    shares: i128,
    underlying: i128,
    intermediate: i128,
}

fn overflow(_: Error) -> SkipReason {
    SkipReason::Overflow
}

pub fn needs_rebalance(env: &Env, config: &Config, snapshot: &Snapshot) -> Result<bool, Error> {
    if snapshot.total_value == 0 {
        return Ok(false);
    }
    let band = snapshot.tolerance(env, config)?;
    Ok(snapshot
        .values(env)?
        .iter()
        .any(|row| row.delta > band || -row.delta > band))
}

/// Classifies every allocation against the snapshot, preserving registry
/// order, and reads every price the execution will need.
pub fn plan(env: &Env, config: &Config, snapshot: &Snapshot) -> Result<Plan, Error> {
    let band = snapshot.tolerance(env, config)?;
    let mut sheds = Vec::new(env);
    let mut acquires = Vec::new(env);
    for (holding, row) in snapshot.holdings.iter().zip(snapshot.values(env)?.iter()) {
        if row.delta > band {
            sheds.push_back(ShedLeg {
                holding,
                excess: row.delta,
            });
        } else if -row.delta > band {
            acquires.push_back(AcquireLeg {
                allocation: holding.allocation,
                deficit: -row.delta,
            });
        }
    }
    let intermediate_price = if acquires.is_empty() {
        None
    } else {
        Some(read_price(
            env,
            &config.intermediate_oracle,
            &config.intermediate,
            config.max_price_age,
        )?)
    };
    Ok(Plan {
        total_value: snapshot.total_value,
        sheds,
        acquires,
        intermediate_price,
    })
}

/// Underlying left on the portfolio by an earlier pass whose redeposit
/// failed goes back into its wrapper. Tokens shared by several allocations
/// go to the first one; the intermediate currency is left for acquire legs.
fn sweep(env: &Env, config: &Config) {
    let this = env.current_contract_address();
    let mut seen: Vec<Address> = Vec::new(env);
    for allocation in registry::load(env).iter() {
        let underlying = allocation.underlying.clone();
        if underlying == config.intermediate || seen.contains(&underlying) {
            continue;
        }
        seen.push_back(underlying.clone());
        let stray = token::Client::new(env, &underlying).balance(&this);
        if stray <= 0 {
            continue;
        }
        match wrapper::try_deposit(env, &allocation, stray) {
            Ok(_) => log!(env, "swept stray underlying", allocation.wrapper, stray),
            Err(_) => log!(env, "stray underlying still idle", allocation.wrapper, stray),
        }
    }
}

fn shed(env: &Env, config: &Config, leg: &ShedLeg) -> Result<Fill, SkipReason> {
    let holding = &leg.holding;
    let allocation = &holding.allocation;
    if holding.shares <= 0 {
        return Err(SkipReason::ZeroAmount);
    }

    let wanted = amount_for(env, leg.excess, &holding.price).map_err(overflow)?;
    let shares = to_shares(env, wanted, holding.rate)
        .map_err(overflow)?
        .min(holding.shares);
    let expected = to_underlying(env, shares, holding.rate).map_err(overflow)?;
    if shares <= 0 || expected <= 0 {
        return Err(SkipReason::ZeroAmount);
    }
    if !wrapper::try_is_unlocked(env, &allocation.wrapper) {
        return Err(SkipReason::Locked);
    }
    // Nothing is withdrawn unless the venue can price the exit.
    swap::quote(env, config, &allocation.underlying, &config.intermediate, expected)?;

    let received = wrapper::try_withdraw(env, &allocation.wrapper, shares)?;
    if received <= 0 {
        return Err(SkipReason::WithdrawFailed);
    }
    match swap::swap_exact_in(
        env,
        config,
        &allocation.underlying,
        &config.intermediate,
        received,
    ) {
        Ok(proceeds) => Ok(Fill {
            shares,
            underlying: received,
            intermediate: proceeds,
        }),
        Err(reason) => {
            if wrapper::try_deposit(env, allocation, received).is_err() {
                log!(env, "withdrawn underlying left idle", allocation.wrapper.clone(), received);
            }
            Err(reason)
        }
    }
}

fn acquire(
    env: &Env,
    config: &Config,
    leg: &AcquireLeg,
    price: &PriceQuote,
) -> Result<Fill, SkipReason> {
    let allocation = &leg.allocation;
    let needed = amount_for(env, leg.deficit, price).map_err(overflow)?;
    let spend = needed.min(idle(env, config));
    if spend <= 0 {
        return Err(SkipReason::NoLiquidity);
    }
    let bought = swap::swap_exact_in(
        env,
        config,
        &config.intermediate,
        &allocation.underlying,
        spend,
    )?;
    if bought <= 0 {
        return Err(SkipReason::SwapFailed);
    }
    let shares = match wrapper::try_deposit(env, allocation, bought) {
        Ok(shares) => shares,
        Err(reason) => {
            // Back to the intermediate so the next pass can place it.
            if swap::swap_exact_in(
                env,
                config,
                &allocation.underlying,
                &config.intermediate,
                bought,
            )
            .is_err()
            {
                log!(env, "bought underlying left idle", allocation.wrapper.clone(), bought);
            }
            return Err(reason);
        }
    };
    Ok(Fill {
        shares,
        underlying: bought,
        intermediate: spend,
    })
}

pub fn execute(env: &Env, config: &Config, plan: &Plan) -> RebalanceReport {
    let mut report = RebalanceReport {
        total_value: plan.total_value,
        ..Default::default()
    };

    for leg in plan.sheds.iter() {
        let wrapper = &leg.holding.allocation.wrapper;
        match shed(env, config, &leg) {
            Ok(fill) => {
                report.shed += 1;
                events::shed(env, wrapper, fill.shares, fill.underlying, fill.intermediate);
            }
            Err(reason) => {
                report.skipped += 1;
                events::skipped(env, wrapper, reason);
            }
        }
    }

    if let Some(price) = plan.intermediate_price {
        for leg in plan.acquires.iter() {
            let wrapper = &leg.allocation.wrapper;
            match acquire(env, config, &leg, &price) {
                Ok(fill) => {
                    report.acquired += 1;
                    events::acquired(env, wrapper, fill.intermediate, fill.underlying, fill.shares);
                }
                Err(reason) => {
                    report.skipped += 1;
                    events::skipped(env, wrapper, reason);
                }
            }
        }
    }

    report.idle = idle(env, config);
    report
}

/// Runs one pass. Fails only before anything moves: on cooldown, on an
/// unusable price or on arithmetic overflow while planning.
pub fn run(env: &Env, config: &Config) -> Result<RebalanceReport, Error> {
    let now = env.ledger().timestamp();
    let last = storage::last_rebalance(env);
    if config.rebalance_cooldown > 0
        && last > 0
        && now < last.saturating_add(config.rebalance_cooldown)
    {
        return Err(Error::CooldownActive);
    }

    sweep(env, config);
    let snapshot = valuation::snapshot(env, config)?;
    if snapshot.total_value == 0 {
        return Ok(RebalanceReport::default());
    }
    let plan = plan(env, config, &snapshot)?;

    storage::set_last_rebalance(env, now);
    let report = execute(env, config, &plan);
    log!(
        env,
        "rebalance: value {} shed {} acquired {} skipped {}",
        report.total_value,
        report.shed,
        report.acquired,
        report.skipped
    );
    events::rebalanced(env, &report);
    Ok(report)
}
