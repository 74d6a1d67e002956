use chrono::{DateTime, Utc};
use quadfund_types::{AccountAddress, Mutez};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Named sponsor of a funding round and the amount it pledged to the
/// matching pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sponsor {
    pub name: String,
    pub amount: Mutez,
}

/// One contributor's slot on an entry. A contributor gets exactly one
/// slot per entry; the slot is the unit of refund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contribution {
    pub amount: Mutez,
    pub timestamp: DateTime<Utc>,
    pub refunded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub description: String,
    pub owner: AccountAddress,
    pub disputed: bool,
    pub disqualified: bool,
    pub retrieved: bool,
    /// End of the dispute window; `MAX_UTC` until a dispute is raised,
    /// so an undisputed entry can never be disqualified.
    pub dispute_end: DateTime<Utc>,
    pub contributions: HashMap<AccountAddress, Contribution>,
    pub total_contribution: Mutez,
    /// Accumulated sum of scaled square roots of contributions. Squared
    /// at settlement to give the entry's share of the matching pool.
    pub subsidy_power: u128,
    pub sponsorship_won: Mutez,
}

impl Entry {
    pub(crate) fn new(description: String, owner: AccountAddress) -> Self {
        Self {
            description,
            owner,
            disputed: false,
            disqualified: false,
            retrieved: false,
            dispute_end: DateTime::<Utc>::MAX_UTC,
            contributions: HashMap::new(),
            total_contribution: Mutez::ZERO,
            subsidy_power: 0,
            sponsorship_won: Mutez::ZERO,
        }
    }

    /// Squared power, as used in the payout split.
    pub fn clout(&self) -> Option<u128> {
        self.subsidy_power.checked_mul(self.subsidy_power)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingRound {
    pub id: u64,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub sponsors: Vec<Sponsor>,
    pub entries: BTreeMap<u64, Entry>,
    pub entry_counter: u64,
    pub total_sponsorship: Mutez,
    pub total_contribution: Mutez,
    /// Sum of squared entry powers, fixed at settlement.
    pub total_subsidy_power: u128,
    pub active: bool,
}

impl FundingRound {
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.active && now >= self.start && now < self.end
    }
}
