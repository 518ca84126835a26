use soroban_sdk::{contracterror, contracttype, Address, BytesN, String};

/// A tracked wrapper asset and the share of portfolio value it should hold.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Allocation {
    pub wrapper: Address,
    pub underlying: Address,
    pub price_source: Address,
    /// Target share of total value in basis points, strictly inside (0, 10000).
    pub target_bps: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Token that carries value from shed legs to acquire legs.
    pub intermediate: Address,
    pub intermediate_oracle: Address,
    pub swap_venue: Address,
    pub slippage_bps: u32,
    /// Seconds added to the ledger timestamp to form each swap deadline.
    pub swap_deadline: u64,
    pub max_price_age: u64,
    /// Allocations within this band around target are left alone.
    pub rebalance_threshold_bps: u32,
    pub rebalance_cooldown: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

/// Per-allocation row of a valuation snapshot. Never persisted.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllocationValue {
    pub wrapper: Address,
    pub current_value: i128,
    pub target_value: i128,
    pub delta: i128,
}

#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RebalanceReport {
    pub total_value: i128,
    pub shed: u32,
    pub acquired: u32,
    pub skipped: u32,
    /// Intermediate currency left undeployed after the pass.
    pub idle: i128,
}

/// Why a single rebalance leg was not executed.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SkipReason {
    Locked,
    ZeroAmount,
    QuoteFailed,
    WithdrawFailed,
    SwapFailed,
    DepositFailed,
    NoLiquidity,
    Overflow,
}

/// Pre-signed, deadline-bounded authorization consumed by the underlying
/// token's `permit`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Permit {
    pub deadline: u64,
    pub signature: BytesN<64>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PermitDeposit {
    pub wrapper: Address,
    pub amount: i128,
    pub permit: Permit,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllowanceDataKey {
    pub from: Address,
    pub spender: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllowanceValue {
    pub amount: i128,
    pub expiration_ledger: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Admin,
    Config,
    Metadata,
    EmergencyStop,
    ReentrancyGuard,
    LastRebalance,
    Allocations,
    AllocationIndex(Address),
    TotalSupply,
    Balance(Address),
    Allowance(AllowanceDataKey),
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    InvalidConfig = 3,
    InvalidAddress = 4,
    InvalidPercentage = 5,
    AllocationOversubscribed = 6,
    DuplicateAllocation = 7,
    AllocationNotFound = 8,
    AllocationNotEmpty = 9,
    InvalidAmount = 10,
    InsufficientBalance = 11,
    InsufficientAllowance = 12,
    InvalidExpiration = 13,
    PermitExpired = 14,
    EmergencyStop = 15,
    CooldownActive = 16,
    StaleData = 17,
    InvalidExchangeRate = 18,
    ArithmeticError = 19,
    ReentrancyDetected = 20,
}
