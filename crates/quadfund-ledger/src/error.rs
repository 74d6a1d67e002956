use quadfund_types::{AccountAddress, Mutez, TokenAmount};
use thiserror::Error;

/// Ledger operation result type
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Token ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("Ledger is paused")]
    Paused,

    #[error("Insufficient balance for {address}: has {has}, needs {needs}")]
    InsufficientBalance {
        address: AccountAddress,
        has: TokenAmount,
        needs: TokenAmount,
    },

    #[error("Insufficient allowance from {owner} to {spender}: has {has}, needs {needs}")]
    InsufficientAllowance {
        owner: AccountAddress,
        spender: AccountAddress,
        has: TokenAmount,
        needs: TokenAmount,
    },

    #[error("Unsafe allowance change: reset the current allowance to zero first")]
    UnsafeAllowanceChange,

    #[error("Holder check failed for {address}: balance {balance} not above {required}")]
    NotAHolder {
        address: AccountAddress,
        balance: TokenAmount,
        required: TokenAmount,
    },

    #[error("Balance overflow for {0}")]
    BalanceOverflow(AccountAddress),

    #[error("Total supply arithmetic overflow")]
    SupplyOverflow,

    #[error("Sale is closed")]
    SaleClosed,

    #[error("Sale has not ended yet")]
    SaleNotEnded,

    #[error("Payment mismatch: expected {expected}, got {got}")]
    PaymentMismatch { expected: Mutez, got: Mutez },

    #[error("DAO allocation already minted")]
    DaoAllocationMinted,

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
