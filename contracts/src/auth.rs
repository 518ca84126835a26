use soroban_sdk::auth::{ContractContext, InvokerContractAuthEntry, SubContractInvocation};
use soroban_sdk::{vec, Address, Env, IntoVal, Symbol};

/// Pre-authorizes a `transfer` of the portfolio's own `token` balance to
/// `to`, performed by a contract the portfolio calls next (a wrapper
/// deposit or a venue swap pulling its input).
pub fn authorize_transfer(env: &Env, token: &Address, to: &Address, amount: i128) {
    let from = env.current_contract_address();
    env.authorize_as_current_contract(vec![
        env,
        InvokerContractAuthEntry::Contract(SubContractInvocation {
            context: ContractContext {
                contract: token.clone(),
                fn_name: Symbol::new(env, "transfer"),
                args: (from, to.clone(), amount).into_val(env),
            },
            sub_invocations: vec![env],
        }),
    ]);
}
