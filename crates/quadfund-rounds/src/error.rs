use quadfund_math::MathError;
use quadfund_types::Mutez;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RoundError>;

#[derive(Debug, Error)]
pub enum RoundError {
    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("No active funding round")]
    NoActiveRound,

    #[error("A funding round is already active")]
    RoundAlreadyActive,

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(&'static str),

    #[error("Funding round is not open for this operation")]
    RoundNotOpen,

    #[error("Funding round has not ended yet")]
    RoundNotEnded,

    #[error("Funding round not found: {0}")]
    RoundNotFound(u64),

    #[error("Entry not found: {0}")]
    EntryNotFound(u64),

    #[error("Entry {0} is disqualified")]
    EntryDisqualified(u64),

    #[error("Contributor already has a contribution on this entry")]
    AlreadyContributed,

    #[error("Entry owners cannot contribute to their own entry")]
    SelfContribution,

    #[error("Contributions must be non-zero")]
    ZeroContribution,

    #[error("Entry {0} is already under dispute")]
    AlreadyDisputed(u64),

    #[error("Dispute window is still open")]
    DisputeWindowOpen,

    #[error("Entry is not disqualified")]
    NotDisqualified,

    #[error("Nothing to withdraw for this contributor")]
    NothingToWithdraw,

    #[error("Contribution already refunded")]
    AlreadyRefunded,

    #[error("Payment mismatch: expected {expected}, got {got}")]
    PaymentMismatch { expected: Mutez, got: Mutez },

    #[error("No qualifying subsidy power in this round")]
    NoQualifyingSubsidy,

    #[error("Funding round is not settled")]
    NotSettled,

    #[error("Matching payout already retrieved")]
    AlreadyRetrieved,

    #[error("Caller does not own this entry")]
    NotEntryOwner,

    #[error("Arithmetic overflow in payout computation")]
    ArithmeticOverflow,

    #[error("Math error: {0}")]
    Math(#[from] MathError),

    #[error("Payment gateway error: {0}")]
    Gateway(#[from] anyhow::Error),
}
