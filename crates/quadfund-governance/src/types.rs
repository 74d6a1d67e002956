use crate::ballot::BallotBox;
use chrono::{DateTime, Utc};
use quadfund_rounds::Sponsor;
use quadfund_types::{AccountAddress, Mutez, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalResolution {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisputeResolution {
    Pending,
    Upheld,
    Rejected,
}

/// Proposal to run a funding round. Accepted proposals collect sponsor
/// donations and are then listed as an actual round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundProposal {
    pub id: u64,
    pub description: String,
    pub creator: AccountAddress,
    pub created: DateTime<Utc>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub ballot: BallotBox,
    pub resolution: ProposalResolution,
    pub listed: bool,
    pub total_donations: Mutez,
    pub donors: HashMap<AccountAddress, Sponsor>,
}

/// Challenge against one entry of the ongoing round, keyed by the
/// proposal that listed the round and the entry id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispute {
    pub entry_id: u64,
    pub round_proposal_id: u64,
    pub disputer: AccountAddress,
    pub description: String,
    pub created: DateTime<Utc>,
    pub ballot: BallotBox,
    pub resolution: DisputeResolution,
    pub stake: TokenAmount,
}
