use soroban_sdk::{contractclient, log, vec, Address, Env, Vec};

use crate::auth::authorize_transfer;
use crate::math::min_out;
use crate::types::{Config, SkipReason};

#[contractclient(name = "SwapVenueClient")]
pub trait SwapVenue {
    fn quote(env: Env, amount_in: i128, path: Vec<Address>) -> i128;
    fn swap(
        env: Env,
        sender: Address,
        amount_in: i128,
        min_amount_out: i128,
        path: Vec<Address>,
        receiver: Address,
        deadline: u64,
    ) -> i128;
}

/// Expected output of swapping `amount_in` along `from -> to`.
pub fn quote(
    env: &Env,
    config: &Config,
    from: &Address,
    to: &Address,
    amount_in: i128,
) -> Result<i128, SkipReason> {
    if from == to {
        return Ok(amount_in);
    }
    let path = vec![env, from.clone(), to.clone()];
    match SwapVenueClient::new(env, &config.swap_venue).try_quote(&amount_in, &path) {
        Ok(Ok(out)) if out > 0 => Ok(out),
        _ => Err(SkipReason::QuoteFailed),
    }
}

/// Swaps the portfolio's `amount_in` of `from` into `to`, received by the
/// portfolio. The minimum output is the fresh quote less slippage and the
/// swap expires `swap_deadline` seconds from now; either bound failing only
/// fails this swap.
pub fn swap_exact_in(
    env: &Env,
    config: &Config,
    from: &Address,
    to: &Address,
    amount_in: i128,
) -> Result<i128, SkipReason> {
    if from == to {
        return Ok(amount_in);
    }
    let quoted = quote(env, config, from, to, amount_in)?;
    let min_amount_out =
        min_out(env, quoted, config.slippage_bps).map_err(|_| SkipReason::Overflow)?;
    let deadline = env
        .ledger()
        .timestamp()
        .saturating_add(config.swap_deadline);
    let this = env.current_contract_address();
    let path = vec![env, from.clone(), to.clone()];

    authorize_transfer(env, from, &config.swap_venue, amount_in);
    let result = SwapVenueClient::new(env, &config.swap_venue).try_swap(
        &this,
        &amount_in,
        &min_amount_out,
        &path,
        &this,
        &deadline,
    );
    match result {
        Ok(Ok(out)) => Ok(out),
        _ => {
            log!(env, "swap failed", from.clone(), to.clone(), amount_in, min_amount_out);
            Err(SkipReason::SwapFailed)
        }
    }
}
