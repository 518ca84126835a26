#![no_std]
use soroban_sdk::{contract, contractimpl, Address, Env, String, Vec};

mod auth;
mod events;
mod ledger;
mod math;
mod rebalance;
mod reflector;
mod registry;
mod share;
mod storage;
mod swap;
mod types;
mod valuation;
mod wrapper;

pub use ledger::{PermitToken, PermitTokenClient};
pub use math::{BPS_DENOMINATOR, RATE_SCALE};
pub use reflector::*;
pub use swap::{SwapVenue, SwapVenueClient};
pub use types::*;
pub use wrapper::{YieldWrapper, YieldWrapperClient};

use ledger::Funding;

#[contract]
pub struct PortfolioRebalancer;

#[contractimpl]
impl PortfolioRebalancer {
    pub fn initialize(
        env: Env,
        admin: Address,
        config: Config,
        name: String,
        symbol: String,
    ) -> Result<(), Error> {
        if storage::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }
        admin.require_auth();
        storage::validate_config(&env, &config)?;

        storage::set_admin(&env, &admin);
        storage::set_config(&env, &config);
        storage::set_metadata(
            &env,
            &TokenMetadata {
                name,
                symbol,
                decimals: share::SHARE_DECIMALS,
            },
        );
        storage::bump_instance(&env);
        events::config_updated(&env, &config);
        Ok(())
    }

    pub fn admin(env: Env) -> Result<Address, Error> {
        storage::admin(&env)
    }

    pub fn set_admin(env: Env, new_admin: Address) -> Result<(), Error> {
        storage::require_admin(&env)?;
        storage::set_admin(&env, &new_admin);
        storage::bump_instance(&env);
        events::admin_changed(&env, &new_admin);
        Ok(())
    }

    pub fn get_config(env: Env) -> Result<Config, Error> {
        storage::config(&env)
    }

    pub fn update_config(env: Env, config: Config) -> Result<(), Error> {
        storage::require_admin(&env)?;
        storage::validate_config(&env, &config)?;
        if registry::load(&env)
            .iter()
            .any(|allocation| allocation.wrapper == config.intermediate)
        {
            return Err(Error::InvalidAddress);
        }
        storage::set_config(&env, &config);
        storage::bump_instance(&env);
        events::config_updated(&env, &config);
        Ok(())
    }

    /// Emergency stop. Withdrawals stay open while paused.
    pub fn set_paused(env: Env, paused: bool) -> Result<(), Error> {
        storage::require_admin(&env)?;
        storage::set_paused(&env, paused);
        storage::bump_instance(&env);
        events::paused(&env, paused);
        Ok(())
    }

    pub fn is_paused(env: Env) -> bool {
        storage::is_paused(&env)
    }

    pub fn add_allocation(
        env: Env,
        wrapper: Address,
        price_source: Address,
        target_bps: u32,
    ) -> Result<(), Error> {
        storage::require_admin(&env)?;
        let config = storage::config(&env)?;
        storage::guarded(&env, || {
            registry::check_new(&env, &config, &wrapper, &price_source, target_bps)?;
            let allocation = Allocation {
                underlying: wrapper::underlying(&env, &wrapper),
                wrapper,
                price_source,
                target_bps,
            };
            registry::push(&env, &allocation);
            events::allocation_added(&env, &allocation);
            Ok(())
        })
    }

    pub fn set_allocation_percentage(
        env: Env,
        wrapper: Address,
        target_bps: u32,
    ) -> Result<(), Error> {
        storage::require_admin(&env)?;
        storage::guarded(&env, || {
            let previous = registry::set_percentage(&env, &wrapper, target_bps)?;
            events::allocation_percentage_changed(&env, &wrapper, previous, target_bps);
            Ok(())
        })
    }

    /// Drops an allocation the portfolio no longer holds any shares of.
    pub fn remove_allocation(env: Env, wrapper: Address) -> Result<(), Error> {
        storage::require_admin(&env)?;
        storage::guarded(&env, || {
            registry::require(&env, &wrapper)?;
            if wrapper::held_shares(&env, &wrapper) > 0 {
                return Err(Error::AllocationNotEmpty);
            }
            registry::remove(&env, &wrapper)?;
            events::allocation_removed(&env, &wrapper);
            Ok(())
        })
    }

    pub fn get_allocation(env: Env, wrapper: Address) -> Option<Allocation> {
        registry::get(&env, &wrapper)
    }

    pub fn list_allocations(env: Env) -> Vec<Allocation> {
        registry::load(&env)
    }

    /// Value of the portfolio's holding in `wrapper`; zero for unknown wrappers.
    pub fn value_of(env: Env, wrapper: Address) -> Result<i128, Error> {
        let config = storage::config(&env)?;
        match registry::get(&env, &wrapper) {
            Some(allocation) => Ok(valuation::holding(&env, &config, &allocation)?.value),
            None => Ok(0),
        }
    }

    pub fn total_value(env: Env) -> Result<i128, Error> {
        let config = storage::config(&env)?;
        Ok(valuation::snapshot(&env, &config)?.total_value)
    }

    pub fn valuation(env: Env) -> Result<Vec<AllocationValue>, Error> {
        let config = storage::config(&env)?;
        valuation::snapshot(&env, &config)?.values(&env)
    }

    pub fn rebalance_needed(env: Env) -> Result<bool, Error> {
        let config = storage::config(&env)?;
        let snapshot = valuation::snapshot(&env, &config)?;
        rebalance::needs_rebalance(&env, &config, &snapshot)
    }

    /// Moves value from over-weight to under-weight allocations. Anyone may
    /// call it; legs that cannot execute are skipped and reported.
    pub fn rebalance(env: Env) -> Result<RebalanceReport, Error> {
        storage::ensure_active(&env)?;
        let config = storage::config(&env)?;
        storage::guarded(&env, || rebalance::run(&env, &config))
    }

    pub fn last_rebalance(env: Env) -> u64 {
        storage::last_rebalance(&env)
    }

    pub fn deposit(env: Env, from: Address, wrapper: Address, amount: i128) -> Result<i128, Error> {
        from.require_auth();
        storage::ensure_active(&env)?;
        storage::guarded(&env, || {
            ledger::deposit(&env, &from, &wrapper, amount, Funding::Transfer)
        })
    }

    /// Deposit funded through a signed approval instead of a prior one; any
    /// relayer may submit it.
    pub fn deposit_with_permit(
        env: Env,
        from: Address,
        wrapper: Address,
        amount: i128,
        permit: Permit,
    ) -> Result<i128, Error> {
        storage::ensure_active(&env)?;
        storage::guarded(&env, || {
            ledger::deposit(&env, &from, &wrapper, amount, Funding::Permit(permit))
        })
    }

    pub fn deposit_batch_with_permit(
        env: Env,
        from: Address,
        requests: Vec<PermitDeposit>,
    ) -> Result<i128, Error> {
        storage::ensure_active(&env)?;
        storage::guarded(&env, || ledger::deposit_batch(&env, &from, &requests))
    }

    pub fn withdraw(
        env: Env,
        from: Address,
        shares: i128,
        receiver: Address,
    ) -> Result<Vec<i128>, Error> {
        from.require_auth();
        storage::guarded(&env, || ledger::withdraw(&env, &from, shares, &receiver))
    }
}

#[contractimpl]
impl PortfolioRebalancer {
    pub fn name(env: Env) -> Result<String, Error> {
        Ok(storage::metadata(&env)?.name)
    }

    pub fn symbol(env: Env) -> Result<String, Error> {
        Ok(storage::metadata(&env)?.symbol)
    }

    pub fn decimals(env: Env) -> Result<u32, Error> {
        Ok(storage::metadata(&env)?.decimals)
    }

    pub fn balance(env: Env, id: Address) -> i128 {
        share::balance(&env, &id)
    }

    pub fn total_supply(env: Env) -> i128 {
        share::total_supply(&env)
    }

    pub fn allowance(env: Env, from: Address, spender: Address) -> i128 {
        share::allowance(&env, &from, &spender)
    }

    pub fn approve(
        env: Env,
        from: Address,
        spender: Address,
        amount: i128,
        expiration_ledger: u32,
    ) -> Result<(), Error> {
        from.require_auth();
        storage::bump_instance(&env);
        share::approve(&env, &from, &spender, amount, expiration_ledger)
    }

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) -> Result<(), Error> {
        from.require_auth();
        storage::bump_instance(&env);
        share::transfer(&env, &from, &to, amount)
    }

    pub fn transfer_from(
        env: Env,
        spender: Address,
        from: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), Error> {
        spender.require_auth();
        storage::bump_instance(&env);
        share::spend_allowance(&env, &from, &spender, amount)?;
        share::transfer(&env, &from, &to, amount)
    }
}

#[cfg(test)]
#[macro_use]
extern crate std;

#[cfg(test)]
mod mock;
