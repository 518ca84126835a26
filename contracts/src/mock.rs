//! In-test stand-ins for the contracts the portfolio talks to, plus a
//! fixture wiring them together.

use soroban_sdk::testutils::{Address as _, Events as _, Ledger};
use soroban_sdk::token::{self, StellarAssetClient};
use soroban_sdk::{Address, Env, String, Symbol, TryFromVal, Val, Vec};

use crate::{Config, PortfolioRebalancer, PortfolioRebalancerClient, RATE_SCALE};

pub use oracle::{MockOracle, MockOracleClient};
pub use permit::{MockPermitToken, MockPermitTokenClient};
pub use venue::{MockVenue, MockVenueClient};
pub use wrapper::{MockWrapper, MockWrapperClient};

pub const NOW: u64 = 1_700_000_000;
pub const PRICE_DECIMALS: u32 = 7;
/// One value unit per underlying unit at `PRICE_DECIMALS`.
pub const PRICE_ONE: i128 = 10_000_000;
pub const LIQUIDITY: i128 = 1_000_000_000_000_000;

mod oracle {
    use soroban_sdk::{contract, contractimpl, contracttype, Address, Env};

    use super::PRICE_DECIMALS;
    use crate::{Asset, PriceData};

    #[contracttype]
    enum OracleKey {
        Decimals,
        Price(Asset),
    }

    #[contract]
    pub struct MockOracle;

    #[contractimpl]
    impl MockOracle {
        pub fn set_decimals(env: Env, decimals: u32) {
            env.storage().instance().set(&OracleKey::Decimals, &decimals);
        }

        pub fn set_price(env: Env, token: Address, price: i128, timestamp: u64) {
            env.storage().instance().set(
                &OracleKey::Price(Asset::Stellar(token)),
                &PriceData { price, timestamp },
            );
        }

        pub fn decimals(env: Env) -> u32 {
            env.storage()
                .instance()
                .get(&OracleKey::Decimals)
                .unwrap_or(PRICE_DECIMALS)
        }

        pub fn lastprice(env: Env, asset: Asset) -> Option<PriceData> {
            env.storage().instance().get(&OracleKey::Price(asset))
        }
    }
}

mod wrapper {
    use soroban_sdk::{contract, contractimpl, contracttype, token, Address, Env};

    use crate::RATE_SCALE;

    #[contracttype]
    enum WrapperKey {
        Underlying,
        Rate,
        Locked,
        Broken,
        Balance(Address),
    }

    /// Yield wrapper with a settable exchange rate, lock and failure switches.
    #[contract]
    pub struct MockWrapper;

    impl MockWrapper {
        fn read_balance(env: &Env, id: &Address) -> i128 {
            env.storage()
                .instance()
                .get(&WrapperKey::Balance(id.clone()))
                .unwrap_or(0)
        }

        fn write_balance(env: &Env, id: &Address, amount: i128) {
            env.storage()
                .instance()
                .set(&WrapperKey::Balance(id.clone()), &amount);
        }

        fn flag(env: &Env, key: &WrapperKey) -> bool {
            env.storage().instance().get(key).unwrap_or(false)
        }
    }

    #[contractimpl]
    impl MockWrapper {
        pub fn init(env: Env, underlying: Address, rate: i128) {
            env.storage().instance().set(&WrapperKey::Underlying, &underlying);
            env.storage().instance().set(&WrapperKey::Rate, &rate);
        }

        pub fn set_rate(env: Env, rate: i128) {
            env.storage().instance().set(&WrapperKey::Rate, &rate);
        }

        pub fn set_locked(env: Env, locked: bool) {
            env.storage().instance().set(&WrapperKey::Locked, &locked);
        }

        pub fn set_broken(env: Env, broken: bool) {
            env.storage().instance().set(&WrapperKey::Broken, &broken);
        }

        pub fn underlying(env: Env) -> Address {
            env.storage().instance().get(&WrapperKey::Underlying).unwrap()
        }

        pub fn balance(env: Env, id: Address) -> i128 {
            Self::read_balance(&env, &id)
        }

        pub fn exchange_rate(env: Env) -> i128 {
            env.storage().instance().get(&WrapperKey::Rate).unwrap()
        }

        pub fn deposit(env: Env, from: Address, amount: i128, receiver: Address) -> i128 {
            if Self::flag(&env, &WrapperKey::Broken) {
                panic!("wrapper broken");
            }
            from.require_auth();
            let underlying = Self::underlying(env.clone());
            token::Client::new(&env, &underlying).transfer(
                &from,
                &env.current_contract_address(),
                &amount,
            );
            let shares = amount * RATE_SCALE / Self::exchange_rate(env.clone());
            let balance = Self::read_balance(&env, &receiver);
            Self::write_balance(&env, &receiver, balance + shares);
            shares
        }

        pub fn withdraw(env: Env, shares: i128, receiver: Address, owner: Address) -> i128 {
            owner.require_auth();
            if Self::flag(&env, &WrapperKey::Locked) {
                panic!("holding locked");
            }
            if Self::flag(&env, &WrapperKey::Broken) {
                panic!("wrapper broken");
            }
            let balance = Self::read_balance(&env, &owner);
            if balance < shares {
                panic!("insufficient shares");
            }
            Self::write_balance(&env, &owner, balance - shares);
            let assets = shares * Self::exchange_rate(env.clone()) / RATE_SCALE;
            let underlying = Self::underlying(env.clone());
            token::Client::new(&env, &underlying).transfer(
                &env.current_contract_address(),
                &receiver,
                &assets,
            );
            assets
        }

        pub fn is_unlocked(env: Env, _holder: Address) -> bool {
            !Self::flag(&env, &WrapperKey::Locked)
        }
    }
}

mod venue {
    use soroban_sdk::{contract, contractimpl, contracttype, token, Address, Env, Vec};

    #[contracttype]
    enum VenueKey {
        Price(Address),
        Broken(Address),
    }

    /// Constant-price venue: `out = in * price_in / price_out`. Pays from its
    /// own inventory, so tests must fund it.
    #[contract]
    pub struct MockVenue;

    #[contractimpl]
    impl MockVenue {
        pub fn set_price(env: Env, token: Address, price: i128) {
            env.storage().instance().set(&VenueKey::Price(token), &price);
        }

        pub fn set_broken(env: Env, token: Address, broken: bool) {
            env.storage().instance().set(&VenueKey::Broken(token), &broken);
        }

        /// Unpriced tokens cannot be quoted.
        pub fn clear_price(env: Env, token: Address) {
            env.storage().instance().remove(&VenueKey::Price(token));
        }

        pub fn quote(env: Env, amount_in: i128, path: Vec<Address>) -> i128 {
            let from = path.first().unwrap();
            let to = path.last().unwrap();
            let price_in: i128 = env.storage().instance().get(&VenueKey::Price(from)).unwrap();
            let price_out: i128 = env.storage().instance().get(&VenueKey::Price(to)).unwrap();
            amount_in * price_in / price_out
        }

        pub fn swap(
            env: Env,
            sender: Address,
            amount_in: i128,
            min_amount_out: i128,
            path: Vec<Address>,
            receiver: Address,
            deadline: u64,
        ) -> i128 {
            sender.require_auth();
            if deadline < env.ledger().timestamp() {
                panic!("expired");
            }
            let from = path.first().unwrap();
            let to = path.last().unwrap();
            for token in [from.clone(), to.clone()] {
                if env
                    .storage()
                    .instance()
                    .get(&VenueKey::Broken(token))
                    .unwrap_or(false)
                {
                    panic!("pool unavailable");
                }
            }
            let out = Self::quote(env.clone(), amount_in, path);
            if out < min_amount_out {
                panic!("slippage");
            }
            let this = env.current_contract_address();
            token::Client::new(&env, &from).transfer(&sender, &this, &amount_in);
            token::Client::new(&env, &to).transfer(&this, &receiver, &out);
            out
        }
    }
}

mod permit {
    use soroban_sdk::{contract, contractimpl, contracttype, Address, BytesN, Env};

    #[contracttype]
    enum PermitKey {
        Balance(Address),
        Allowance(Address, Address),
        Nonce(Address),
    }

    /// Minimal token accepting signed approvals. An all-zero signature is
    /// treated as forged.
    #[contract]
    pub struct MockPermitToken;

    #[contractimpl]
    impl MockPermitToken {
        pub fn mint(env: Env, to: Address, amount: i128) {
            let balance = Self::balance(env.clone(), to.clone());
            env.storage()
                .instance()
                .set(&PermitKey::Balance(to), &(balance + amount));
        }

        pub fn balance(env: Env, id: Address) -> i128 {
            env.storage()
                .instance()
                .get(&PermitKey::Balance(id))
                .unwrap_or(0)
        }

        pub fn nonces(env: Env, owner: Address) -> u64 {
            env.storage()
                .instance()
                .get(&PermitKey::Nonce(owner))
                .unwrap_or(0)
        }

        pub fn transfer(env: Env, from: Address, to: Address, amount: i128) {
            from.require_auth();
            let from_balance = Self::balance(env.clone(), from.clone());
            if from_balance < amount {
                panic!("insufficient balance");
            }
            env.storage()
                .instance()
                .set(&PermitKey::Balance(from), &(from_balance - amount));
            Self::mint(env, to, amount);
        }

        pub fn transfer_from(env: Env, spender: Address, from: Address, to: Address, amount: i128) {
            spender.require_auth();
            let key = PermitKey::Allowance(from.clone(), spender);
            let allowance: i128 = env.storage().instance().get(&key).unwrap_or(0);
            if allowance < amount {
                panic!("insufficient allowance");
            }
            env.storage().instance().set(&key, &(allowance - amount));
            let from_balance = Self::balance(env.clone(), from.clone());
            if from_balance < amount {
                panic!("insufficient balance");
            }
            env.storage()
                .instance()
                .set(&PermitKey::Balance(from), &(from_balance - amount));
            Self::mint(env, to, amount);
        }

        pub fn permit(
            env: Env,
            owner: Address,
            spender: Address,
            amount: i128,
            deadline: u64,
            signature: BytesN<64>,
        ) {
            if deadline < env.ledger().timestamp() {
                panic!("permit expired");
            }
            if signature == BytesN::from_array(&env, &[0u8; 64]) {
                panic!("bad signature");
            }
            let nonce = Self::nonces(env.clone(), owner.clone());
            env.storage()
                .instance()
                .set(&PermitKey::Nonce(owner.clone()), &(nonce + 1));
            env.storage()
                .instance()
                .set(&PermitKey::Allowance(owner, spender), &amount);
        }
    }
}

pub struct Position<'a> {
    pub underlying: Address,
    pub wrapper: Address,
    pub wrapper_client: MockWrapperClient<'a>,
}

pub struct Fixture<'a> {
    pub env: Env,
    pub admin: Address,
    pub contract: Address,
    pub client: PortfolioRebalancerClient<'a>,
    pub oracle: MockOracleClient<'a>,
    pub venue: MockVenueClient<'a>,
    pub intermediate: Address,
}

impl<'a> Fixture<'a> {
    pub fn new() -> Self {
        Self::with(|_| {})
    }

    /// Builds the fixture, letting the caller tweak the config first.
    pub fn with(tweak: impl FnOnce(&mut Config)) -> Self {
        let env = Env::default();
        env.mock_all_auths();
        env.budget().reset_unlimited();
        env.ledger().with_mut(|li| li.timestamp = NOW);

        let admin = Address::generate(&env);
        let intermediate = env
            .register_stellar_asset_contract_v2(admin.clone())
            .address();

        let oracle = MockOracleClient::new(&env, &env.register_contract(None, MockOracle));
        oracle.set_decimals(&PRICE_DECIMALS);
        oracle.set_price(&intermediate, &PRICE_ONE, &NOW);

        let venue = MockVenueClient::new(&env, &env.register_contract(None, MockVenue));
        venue.set_price(&intermediate, &PRICE_ONE);
        StellarAssetClient::new(&env, &intermediate).mint(&venue.address, &LIQUIDITY);

        let mut config = Config {
            intermediate: intermediate.clone(),
            intermediate_oracle: oracle.address.clone(),
            swap_venue: venue.address.clone(),
            slippage_bps: 50,
            swap_deadline: 300,
            max_price_age: 3_600,
            rebalance_threshold_bps: 0,
            rebalance_cooldown: 0,
        };
        tweak(&mut config);

        let contract = env.register_contract(None, PortfolioRebalancer);
        let client = PortfolioRebalancerClient::new(&env, &contract);
        client.initialize(
            &admin,
            &config,
            &String::from_str(&env, "Slice Portfolio"),
            &String::from_str(&env, "SLICE"),
        );

        Fixture {
            env,
            admin,
            contract,
            client,
            oracle,
            venue,
            intermediate,
        }
    }

    /// Registers a fresh underlying token with a wrapper at rate 1.0, a
    /// price of `price` on both the oracle and the venue, and venue
    /// inventory. Not yet added to the portfolio.
    pub fn asset(&self, price: i128) -> Position<'a> {
        let underlying = self
            .env
            .register_stellar_asset_contract_v2(self.admin.clone())
            .address();
        self.mint(&underlying, &self.venue.address, LIQUIDITY);
        self.wrapped(underlying, price)
    }

    pub fn wrapped(&self, underlying: Address, price: i128) -> Position<'a> {
        let wrapper = self.env.register_contract(None, MockWrapper);
        let wrapper_client = MockWrapperClient::new(&self.env, &wrapper);
        wrapper_client.init(&underlying, &RATE_SCALE);
        self.oracle.set_price(&underlying, &price, &NOW);
        self.venue.set_price(&underlying, &price);
        Position {
            underlying,
            wrapper,
            wrapper_client,
        }
    }

    pub fn allocate(&self, position: &Position, target_bps: u32) {
        self.client
            .add_allocation(&position.wrapper, &self.oracle.address, &target_bps);
    }

    pub fn mint(&self, token: &Address, to: &Address, amount: i128) {
        StellarAssetClient::new(&self.env, token).mint(to, &amount);
    }

    pub fn balance_of(&self, token: &Address, id: &Address) -> i128 {
        token::Client::new(&self.env, token).balance(id)
    }

    /// New user holding `amount` of `position`'s underlying, deposited in full.
    pub fn depositor(&self, position: &Position, amount: i128) -> Address {
        let user = Address::generate(&self.env);
        self.mint(&position.underlying, &user, amount);
        self.client.deposit(&user, &position.wrapper, &amount);
        user
    }

    pub fn set_time(&self, timestamp: u64) {
        self.env.ledger().with_mut(|li| li.timestamp = timestamp);
    }

    /// `(topics, data)` of every event this portfolio emitted under `name`.
    pub fn events(&self, name: &str) -> std::vec::Vec<(Vec<Val>, Val)> {
        let name = Symbol::new(&self.env, name);
        self.env
            .events()
            .all()
            .iter()
            .filter(|(contract, topics, _)| {
                *contract == self.contract
                    && topics
                        .get(0)
                        .and_then(|topic| Symbol::try_from_val(&self.env, &topic).ok())
                        .map_or(false, |symbol| symbol == name)
            })
            .map(|(_, topics, data)| (topics, data))
            .collect()
    }
}
