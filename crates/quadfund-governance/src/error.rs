use quadfund_ledger::LedgerError;
use quadfund_math::MathError;
use quadfund_rounds::RoundError;
use quadfund_types::AccountAddress;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GovernanceError>;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("Holder check failed: {0}")]
    HolderCheck(#[from] anyhow::Error),

    #[error("A round proposal is already being voted on")]
    ProposalAlreadyActive,

    #[error("No round proposal is being voted on")]
    NoActiveProposal,

    #[error("Round proposal not found: {0}")]
    ProposalNotFound(u64),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(&'static str),

    #[error("Voting is still open")]
    VotingOpen,

    #[error("Voting has closed")]
    VotingClosed,

    #[error("Proposal is already resolved")]
    AlreadyResolved,

    #[error("Proposal was not accepted")]
    NotAccepted,

    #[error("Round proposal has already been listed")]
    AlreadyListed,

    #[error("{0} already donated to this round")]
    AlreadyDonated(AccountAddress),

    #[error("A funding round is already ongoing")]
    RoundOngoing,

    #[error("No funding round is ongoing")]
    NoOngoingRound,

    #[error("Funding round has not ended yet")]
    RoundNotEnded,

    #[error("Votes must stake a non-zero amount")]
    ZeroStake,

    #[error("{0} has already voted")]
    AlreadyVoted(AccountAddress),

    #[error("No stake recorded for {0}")]
    StakeNotFound(AccountAddress),

    #[error("Stake already withdrawn")]
    AlreadyWithdrawn,

    #[error("Entry {0} is already under dispute")]
    AlreadyDisputed(u64),

    #[error("No dispute found for entry {0}")]
    DisputeNotFound(u64),

    #[error("Dispute is already resolved")]
    DisputeResolved,

    #[error("Round manager is already set")]
    RoundManagerSet,

    #[error("Round manager has not been set")]
    RoundManagerMissing,

    #[error("Amount overflow")]
    AmountOverflow,

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Round error: {0}")]
    Round(#[from] RoundError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}
