use crate::error::{GovernanceError, Result};
use chrono::{DateTime, Utc};
use quadfund_math::isqrt;
use quadfund_types::{AccountAddress, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoterStake {
    pub stake: TokenAmount,
    pub withdrawn: bool,
}

/// Quadratic ballot. A vote of stake `s` counts with weight `isqrt(s)`,
/// and the outcome is judged on the margin `yes^2 - no^2`. Stakes stay
/// escrowed until voting closes and each voter pulls theirs back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallotBox {
    pub votes_yes: u64,
    pub votes_no: u64,
    pub voters: HashMap<AccountAddress, VoterStake>,
    pub expiry: DateTime<Utc>,
}

impl BallotBox {
    pub fn new(expiry: DateTime<Utc>) -> Self {
        Self {
            votes_yes: 0,
            votes_no: 0,
            voters: HashMap::new(),
            expiry,
        }
    }

    /// Succeeds iff `cast` would currently accept a vote from `voter`.
    /// Called before the stake is escrowed.
    pub fn check_can_vote(&self, voter: AccountAddress, now: DateTime<Utc>) -> Result<()> {
        if now >= self.expiry {
            return Err(GovernanceError::VotingClosed);
        }
        if self.voters.contains_key(&voter) {
            return Err(GovernanceError::AlreadyVoted(voter));
        }
        Ok(())
    }

    /// Records a vote and returns its quadratic weight.
    pub fn cast(
        &mut self,
        voter: AccountAddress,
        in_favor: bool,
        stake: TokenAmount,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        self.check_can_vote(voter, now)?;
        if stake == TokenAmount::ZERO {
            return Err(GovernanceError::ZeroStake);
        }

        let weight = isqrt(stake.to_units())?;
        let tally = if in_favor {
            &mut self.votes_yes
        } else {
            &mut self.votes_no
        };
        *tally = tally
            .checked_add(weight)
            .ok_or(GovernanceError::AmountOverflow)?;
        self.voters.insert(
            voter,
            VoterStake {
                stake,
                withdrawn: false,
            },
        );
        Ok(weight)
    }

    /// `yes^2 - no^2`, the quadratic margin the outcome is judged on.
    pub fn margin(&self) -> i128 {
        let yes = self.votes_yes as i128;
        let no = self.votes_no as i128;
        yes * yes - no * no
    }

    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }

    /// Amount `voter` may pull back, available once voting has closed.
    pub fn withdrawable(&self, voter: AccountAddress, now: DateTime<Utc>) -> Result<TokenAmount> {
        if now < self.expiry {
            return Err(GovernanceError::VotingOpen);
        }
        let entry = self
            .voters
            .get(&voter)
            .ok_or(GovernanceError::StakeNotFound(voter))?;
        if entry.withdrawn {
            return Err(GovernanceError::AlreadyWithdrawn);
        }
        Ok(entry.stake)
    }

    pub(crate) fn mark_withdrawn(&mut self, voter: AccountAddress) -> Result<()> {
        let entry = self
            .voters
            .get_mut(&voter)
            .ok_or(GovernanceError::StakeNotFound(voter))?;
        entry.withdrawn = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn addr(b: u8) -> AccountAddress {
        AccountAddress::from_bytes([b; 32])
    }

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_quadratic_weight_and_margin() {
        let mut ballot = BallotBox::new(t(100));

        // isqrt(400) = 20, isqrt(100) = 10
        assert_eq!(
            ballot
                .cast(addr(1), true, TokenAmount::from_units(400), t(10))
                .unwrap(),
            20
        );
        assert_eq!(
            ballot
                .cast(addr(2), false, TokenAmount::from_units(100), t(10))
                .unwrap(),
            10
        );

        assert_eq!(ballot.votes_yes, 20);
        assert_eq!(ballot.votes_no, 10);
        assert_eq!(ballot.margin(), 400 - 100);
        assert_eq!(ballot.voter_count(), 2);
    }

    #[test]
    fn test_one_vote_per_voter() {
        let mut ballot = BallotBox::new(t(100));
        ballot
            .cast(addr(1), true, TokenAmount::from_units(25), t(10))
            .unwrap();
        assert!(matches!(
            ballot.cast(addr(1), true, TokenAmount::from_units(25), t(20)),
            Err(GovernanceError::AlreadyVoted(_))
        ));
    }

    #[test]
    fn test_expiry_gates_votes_and_withdrawals() {
        let mut ballot = BallotBox::new(t(100));
        ballot
            .cast(addr(1), true, TokenAmount::from_units(25), t(10))
            .unwrap();

        assert!(matches!(
            ballot.check_can_vote(addr(2), t(100)),
            Err(GovernanceError::VotingClosed)
        ));
        assert!(matches!(
            ballot.withdrawable(addr(1), t(50)),
            Err(GovernanceError::VotingOpen)
        ));

        assert_eq!(
            ballot.withdrawable(addr(1), t(100)).unwrap(),
            TokenAmount::from_units(25)
        );
        ballot.mark_withdrawn(addr(1)).unwrap();
        assert!(matches!(
            ballot.withdrawable(addr(1), t(100)),
            Err(GovernanceError::AlreadyWithdrawn)
        ));
        assert!(matches!(
            ballot.withdrawable(addr(9), t(100)),
            Err(GovernanceError::StakeNotFound(_))
        ));
    }

    #[test]
    fn test_zero_stake_rejected() {
        let mut ballot = BallotBox::new(t(100));
        assert!(matches!(
            ballot.cast(addr(1), true, TokenAmount::ZERO, t(10)),
            Err(GovernanceError::ZeroStake)
        ));
        assert_eq!(ballot.voter_count(), 0);
    }
}
