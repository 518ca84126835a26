use soroban_sdk::{log, Address, Env};

use crate::math::BPS_DENOMINATOR;
use crate::types::{Config, DataKey, Error, TokenMetadata};

pub(crate) const DAY_IN_LEDGERS: u32 = 17280;
pub(crate) const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
pub(crate) const INSTANCE_LIFETIME_THRESHOLD: u32 = INSTANCE_BUMP_AMOUNT - DAY_IN_LEDGERS;
pub(crate) const BALANCE_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
pub(crate) const BALANCE_LIFETIME_THRESHOLD: u32 = BALANCE_BUMP_AMOUNT - DAY_IN_LEDGERS;

pub fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Admin)
}

pub fn admin(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Admin)
        .ok_or(Error::NotInitialized)
}

pub fn set_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&DataKey::Admin, admin);
}

/// Loads the admin and demands its authorization for the current call.
pub fn require_admin(env: &Env) -> Result<Address, Error> {
    let admin = admin(env)?;
    admin.require_auth();
    Ok(admin)
}

pub fn config(env: &Env) -> Result<Config, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(Error::NotInitialized)
}

pub fn validate_config(env: &Env, config: &Config) -> Result<(), Error> {
    let this = env.current_contract_address();
    if config.intermediate == this
        || config.intermediate_oracle == this
        || config.swap_venue == this
    {
        return Err(Error::InvalidAddress);
    }
    if config.slippage_bps >= BPS_DENOMINATOR
        || config.rebalance_threshold_bps >= BPS_DENOMINATOR
        || config.swap_deadline == 0
        || config.max_price_age == 0
    {
        log!(
            env,
            "rejected config: slippage {} threshold {}",
            config.slippage_bps,
            config.rebalance_threshold_bps
        );
        return Err(Error::InvalidConfig);
    }
    Ok(())
}

pub fn set_config(env: &Env, config: &Config) {
    env.storage().instance().set(&DataKey::Config, config);
}

pub fn metadata(env: &Env) -> Result<TokenMetadata, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Metadata)
        .ok_or(Error::NotInitialized)
}

pub fn set_metadata(env: &Env, metadata: &TokenMetadata) {
    env.storage().instance().set(&DataKey::Metadata, metadata);
}

pub fn is_paused(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::EmergencyStop)
        .unwrap_or(false)
}

pub fn set_paused(env: &Env, paused: bool) {
    env.storage().instance().set(&DataKey::EmergencyStop, &paused);
}

pub fn ensure_active(env: &Env) -> Result<(), Error> {
    if is_paused(env) {
        return Err(Error::EmergencyStop);
    }
    Ok(())
}

pub fn last_rebalance(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::LastRebalance)
        .unwrap_or(0)
}

pub fn set_last_rebalance(env: &Env, timestamp: u64) {
    env.storage()
        .instance()
        .set(&DataKey::LastRebalance, &timestamp);
}

/// Runs `f` with the re-entrancy flag held. The flag is cleared on both
/// outcomes; a failed call is rolled back by the host anyway.
pub fn guarded<T>(env: &Env, f: impl FnOnce() -> Result<T, Error>) -> Result<T, Error> {
    let key = DataKey::ReentrancyGuard;
    if env.storage().instance().get(&key).unwrap_or(false) {
        log!(env, "re-entrant call rejected");
        return Err(Error::ReentrancyDetected);
    }
    env.storage().instance().set(&key, &true);
    let result = f();
    env.storage().instance().remove(&key);
    bump_instance(env);
    result
}
