use crate::ballot::BallotBox;
use crate::error::{GovernanceError, Result};
use crate::types::{Dispute, DisputeResolution, ProposalResolution, RoundProposal};
use chrono::{DateTime, Duration, Utc};
use quadfund_ledger::{BalanceOracle, TokenLedger};
use quadfund_rounds::{RoundManager, Sponsor};
use quadfund_types::{AccountAddress, Mutez, TokenAmount};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct GovernanceConfig {
    /// Share balance an account must exceed to use holder-gated
    /// operations.
    pub min_proposal_balance: TokenAmount,
    /// How long a round proposal ballot stays open.
    pub voting_window: Duration,
    /// Quadratic margin a proposal ballot must reach to be accepted.
    pub proposal_vote_threshold: i128,
    /// Minimum number of distinct voters for a proposal to be accepted.
    pub min_proposal_voters: usize,
    /// Stake escrowed by whoever raises a dispute; forfeited to the
    /// treasury if the dispute is rejected.
    pub dispute_stake: TokenAmount,
    /// Quadratic margin a dispute ballot must exceed for the entry to
    /// be disqualified.
    pub dispute_vote_threshold: i128,
    /// How long a dispute ballot stays open. Must outlast the round
    /// manager's `entry_dispute_window`, otherwise an upheld dispute
    /// cannot disqualify the entry at settlement.
    pub dispute_window: Duration,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            min_proposal_balance: TokenAmount::ZERO,
            voting_window: Duration::hours(72),
            proposal_vote_threshold: 0,
            min_proposal_voters: 1,
            dispute_stake: TokenAmount::from_units(200),
            dispute_vote_threshold: 20,
            dispute_window: Duration::hours(48),
        }
    }
}

struct EngineState {
    proposals: BTreeMap<u64, RoundProposal>,
    next_proposal_id: u64,
    active_proposal: Option<u64>,
    /// `(proposal id, round id)` of the currently listed round.
    ongoing_round: Option<(u64, u64)>,
    disputes: HashMap<(u64, u64), Dispute>,
}

/// Coordinates the DAO: round proposals and their quadratic ballots,
/// sponsor donations, round listing and settlement, and entry disputes.
/// Vote stakes are escrowed on the share ledger under the DAO account
/// and pulled back by each voter after their ballot closes.
pub struct GovernanceEngine {
    config: GovernanceConfig,
    administrator: AccountAddress,
    dao_account: AccountAddress,
    ledger: Arc<TokenLedger>,
    oracle: Arc<dyn BalanceOracle>,
    round_manager: RwLock<Option<Arc<RoundManager>>>,
    state: RwLock<EngineState>,
}

impl GovernanceEngine {
    pub fn new(
        config: GovernanceConfig,
        administrator: AccountAddress,
        dao_account: AccountAddress,
        ledger: Arc<TokenLedger>,
        oracle: Arc<dyn BalanceOracle>,
    ) -> Self {
        Self {
            config,
            administrator,
            dao_account,
            ledger,
            oracle,
            round_manager: RwLock::new(None),
            state: RwLock::new(EngineState {
                proposals: BTreeMap::new(),
                next_proposal_id: 1,
                active_proposal: None,
                ongoing_round: None,
                disputes: HashMap::new(),
            }),
        }
    }

    /// Wires in the round manager. Administrator-only, exactly once.
    pub async fn set_round_manager(
        &self,
        caller: AccountAddress,
        manager: Arc<RoundManager>,
    ) -> Result<()> {
        if caller != self.administrator {
            return Err(GovernanceError::Unauthorized(
                "set_round_manager is administrator-only",
            ));
        }
        let mut slot = self.round_manager.write().await;
        if slot.is_some() {
            return Err(GovernanceError::RoundManagerSet);
        }
        *slot = Some(manager);
        Ok(())
    }

    async fn rounds(&self) -> Result<Arc<RoundManager>> {
        self.round_manager
            .read()
            .await
            .clone()
            .ok_or(GovernanceError::RoundManagerMissing)
    }

    async fn require_holder(&self, caller: AccountAddress) -> Result<()> {
        self.oracle
            .assert_min_balance(caller, self.config.min_proposal_balance)
            .await?;
        Ok(())
    }

    /// Moves `value` shares from `from` into DAO escrow. Relies on the
    /// ledger's allowance rule, so voters must have approved the DAO
    /// account beforehand.
    async fn escrow(&self, from: AccountAddress, value: TokenAmount) -> Result<()> {
        self.ledger
            .transfer(self.dao_account, from, self.dao_account, value)
            .await?;
        Ok(())
    }

    async fn release(&self, to: AccountAddress, value: TokenAmount) -> Result<()> {
        self.ledger
            .transfer(self.dao_account, self.dao_account, to, value)
            .await?;
        Ok(())
    }

    pub async fn propose_new_round(
        &self,
        caller: AccountAddress,
        description: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        self.require_holder(caller).await?;

        let mut state = self.state.write().await;
        if state.active_proposal.is_some() {
            return Err(GovernanceError::ProposalAlreadyActive);
        }
        if end <= start {
            return Err(GovernanceError::InvalidSchedule("round must end after it starts"));
        }
        let expiry = now + self.config.voting_window;
        if start <= expiry {
            return Err(GovernanceError::InvalidSchedule(
                "round must start after voting closes",
            ));
        }

        let id = state.next_proposal_id;
        state.next_proposal_id += 1;
        state.proposals.insert(
            id,
            RoundProposal {
                id,
                description,
                creator: caller,
                created: now,
                start,
                end,
                ballot: BallotBox::new(expiry),
                resolution: ProposalResolution::Pending,
                listed: false,
                total_donations: Mutez::ZERO,
                donors: HashMap::new(),
            },
        );
        state.active_proposal = Some(id);

        info!(proposal_id = id, creator = %caller, voting_until = %expiry, "🗳️ Round proposed");
        Ok(id)
    }

    /// Casts a quadratic vote on the active proposal, escrowing the
    /// stake. Returns the vote's weight.
    pub async fn vote_for_new_round_proposal(
        &self,
        caller: AccountAddress,
        in_favor: bool,
        stake: TokenAmount,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        if stake == TokenAmount::ZERO {
            return Err(GovernanceError::ZeroStake);
        }

        let mut state = self.state.write().await;
        let id = state
            .active_proposal
            .ok_or(GovernanceError::NoActiveProposal)?;
        let proposal = state
            .proposals
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        proposal.ballot.check_can_vote(caller, now)?;

        self.escrow(caller, stake).await?;
        let weight = proposal.ballot.cast(caller, in_favor, stake, now)?;

        info!(proposal_id = id, voter = %caller, in_favor, weight, "🗳️ Proposal vote cast");
        Ok(weight)
    }

    /// Resolves the active proposal once its ballot has closed.
    pub async fn execute_new_round_proposal(
        &self,
        caller: AccountAddress,
        now: DateTime<Utc>,
    ) -> Result<ProposalResolution> {
        self.require_holder(caller).await?;

        let mut state = self.state.write().await;
        let id = state
            .active_proposal
            .ok_or(GovernanceError::NoActiveProposal)?;
        let proposal = state
            .proposals
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        if now < proposal.ballot.expiry {
            return Err(GovernanceError::VotingOpen);
        }
        if proposal.resolution != ProposalResolution::Pending {
            return Err(GovernanceError::AlreadyResolved);
        }

        let margin = proposal.ballot.margin();
        let accepted = margin >= self.config.proposal_vote_threshold
            && proposal.ballot.voter_count() >= self.config.min_proposal_voters;
        proposal.resolution = if accepted {
            ProposalResolution::Accepted
        } else {
            ProposalResolution::Rejected
        };
        state.active_proposal = None;

        info!(proposal_id = id, margin, accepted, "✅ Proposal resolved");
        Ok(if accepted {
            ProposalResolution::Accepted
        } else {
            ProposalResolution::Rejected
        })
    }

    /// Records a sponsor donation to the latest accepted, unlisted
    /// proposal. One donation per sponsor.
    pub async fn donate_to_round(
        &self,
        caller: AccountAddress,
        name: String,
        payment: Mutez,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let proposal = state
            .proposals
            .values_mut()
            .next_back()
            .ok_or(GovernanceError::NoActiveProposal)?;
        if proposal.resolution != ProposalResolution::Accepted {
            return Err(GovernanceError::NotAccepted);
        }
        if proposal.listed {
            return Err(GovernanceError::AlreadyListed);
        }
        if proposal.donors.contains_key(&caller) {
            return Err(GovernanceError::AlreadyDonated(caller));
        }

        proposal.total_donations = proposal
            .total_donations
            .checked_add(payment)
            .ok_or(GovernanceError::AmountOverflow)?;
        proposal.donors.insert(
            caller,
            Sponsor {
                name,
                amount: payment,
            },
        );

        info!(proposal_id = proposal.id, sponsor = %caller, amount = %payment, "💰 Donation received");
        Ok(())
    }

    /// Lists the latest accepted proposal as an actual funding round
    /// with the collected donations as its matching pool.
    pub async fn list_new_round(&self, caller: AccountAddress, now: DateTime<Utc>) -> Result<u64> {
        self.require_holder(caller).await?;
        let manager = self.rounds().await?;

        let mut state = self.state.write().await;
        if state.ongoing_round.is_some() {
            return Err(GovernanceError::RoundOngoing);
        }
        let proposal = state
            .proposals
            .values_mut()
            .next_back()
            .ok_or(GovernanceError::NoActiveProposal)?;
        if proposal.resolution != ProposalResolution::Accepted {
            return Err(GovernanceError::NotAccepted);
        }
        if proposal.listed {
            return Err(GovernanceError::AlreadyListed);
        }

        let sponsors: Vec<Sponsor> = proposal.donors.values().cloned().collect();
        let round_id = manager
            .create_new_round(
                self.dao_account,
                proposal.description.clone(),
                proposal.start,
                proposal.end,
                sponsors,
                proposal.total_donations,
                now,
            )
            .await?;
        proposal.listed = true;
        let proposal_id = proposal.id;
        state.ongoing_round = Some((proposal_id, round_id));

        info!(proposal_id, round_id, "🏁 Round listed");
        Ok(round_id)
    }

    /// Settles the ongoing round after it ends, handing the donation
    /// pool over for matching payouts.
    pub async fn settle_round(&self, caller: AccountAddress, now: DateTime<Utc>) -> Result<()> {
        self.require_holder(caller).await?;
        let manager = self.rounds().await?;

        let mut state = self.state.write().await;
        let (proposal_id, round_id) = state.ongoing_round.ok_or(GovernanceError::NoOngoingRound)?;
        let proposal = state
            .proposals
            .get(&proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))?;
        if now <= proposal.end {
            return Err(GovernanceError::RoundNotEnded);
        }

        manager
            .disburse(self.dao_account, proposal.total_donations, now)
            .await?;
        state.ongoing_round = None;

        info!(proposal_id, round_id, "✅ Round settled");
        Ok(())
    }

    /// Pull-based recovery of a proposal vote stake, once per voter.
    pub async fn withdraw_tokens_proposal(
        &self,
        caller: AccountAddress,
        proposal_id: u64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let proposal = state
            .proposals
            .get_mut(&proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))?;

        let amount = proposal.ballot.withdrawable(caller, now)?;
        self.release(caller, amount).await?;
        proposal.ballot.mark_withdrawn(caller)?;

        info!(proposal_id, voter = %caller, amount = %amount, "💸 Proposal stake withdrawn");
        Ok(())
    }

    /// Challenges an entry of the ongoing round, escrowing the dispute
    /// stake and opening a dispute ballot.
    pub async fn raise_dispute(
        &self,
        caller: AccountAddress,
        entry_id: u64,
        description: String,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.require_holder(caller).await?;
        let manager = self.rounds().await?;

        let mut state = self.state.write().await;
        let (proposal_id, _) = state.ongoing_round.ok_or(GovernanceError::NoOngoingRound)?;
        if state.disputes.contains_key(&(proposal_id, entry_id)) {
            return Err(GovernanceError::AlreadyDisputed(entry_id));
        }

        // Probe before escrowing so a doomed dispute never moves funds.
        manager.check_disputable(entry_id).await?;
        self.escrow(caller, self.config.dispute_stake).await?;
        manager.dispute(self.dao_account, entry_id, now).await?;

        state.disputes.insert(
            (proposal_id, entry_id),
            Dispute {
                entry_id,
                round_proposal_id: proposal_id,
                disputer: caller,
                description,
                created: now,
                ballot: BallotBox::new(now + self.config.dispute_window),
                resolution: DisputeResolution::Pending,
                stake: self.config.dispute_stake,
            },
        );

        warn!(proposal_id, entry_id, disputer = %caller, "⚖️ Dispute raised");
        Ok(())
    }

    /// Casts a quadratic vote on an open dispute of the ongoing round.
    pub async fn vote_for_dispute(
        &self,
        caller: AccountAddress,
        entry_id: u64,
        in_favor: bool,
        stake: TokenAmount,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        if stake == TokenAmount::ZERO {
            return Err(GovernanceError::ZeroStake);
        }

        let mut state = self.state.write().await;
        let (proposal_id, _) = state.ongoing_round.ok_or(GovernanceError::NoOngoingRound)?;
        let dispute = state
            .disputes
            .get_mut(&(proposal_id, entry_id))
            .ok_or(GovernanceError::DisputeNotFound(entry_id))?;
        if dispute.resolution != DisputeResolution::Pending {
            return Err(GovernanceError::DisputeResolved);
        }
        dispute.ballot.check_can_vote(caller, now)?;

        self.escrow(caller, stake).await?;
        let weight = dispute.ballot.cast(caller, in_favor, stake, now)?;

        info!(entry_id, voter = %caller, in_favor, weight, "🗳️ Dispute vote cast");
        Ok(weight)
    }

    /// Resolves a dispute once its ballot has closed. An upheld dispute
    /// disqualifies the entry and refunds the disputer's stake; a
    /// rejected one forfeits the stake to the treasury.
    pub async fn settle_dispute(
        &self,
        caller: AccountAddress,
        entry_id: u64,
        now: DateTime<Utc>,
    ) -> Result<DisputeResolution> {
        self.require_holder(caller).await?;
        let manager = self.rounds().await?;

        let mut state = self.state.write().await;
        let (proposal_id, _) = state.ongoing_round.ok_or(GovernanceError::NoOngoingRound)?;
        let dispute = state
            .disputes
            .get_mut(&(proposal_id, entry_id))
            .ok_or(GovernanceError::DisputeNotFound(entry_id))?;
        if dispute.resolution != DisputeResolution::Pending {
            return Err(GovernanceError::DisputeResolved);
        }
        if now < dispute.ballot.expiry {
            return Err(GovernanceError::VotingOpen);
        }

        let margin = dispute.ballot.margin();
        let upheld = margin > self.config.dispute_vote_threshold;
        if upheld {
            // Probe and refund before the entry flag commits. A failed
            // refund (a paused ledger, say) then leaves the dispute
            // pending and the whole call retryable.
            manager.check_disqualifiable(entry_id, now).await?;
            let disputer = dispute.disputer;
            let stake = dispute.stake;
            self.release(disputer, stake).await?;
            manager.disqualify(self.dao_account, entry_id, now).await?;
            dispute.resolution = DisputeResolution::Upheld;
        } else {
            dispute.resolution = DisputeResolution::Rejected;
        }

        warn!(proposal_id, entry_id, margin, upheld, "⚖️ Dispute settled");
        Ok(dispute.resolution)
    }

    /// Pull-based recovery of a dispute vote stake, once per voter.
    pub async fn withdraw_tokens_dispute(
        &self,
        caller: AccountAddress,
        round_proposal_id: u64,
        entry_id: u64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let dispute = state
            .disputes
            .get_mut(&(round_proposal_id, entry_id))
            .ok_or(GovernanceError::DisputeNotFound(entry_id))?;

        let amount = dispute.ballot.withdrawable(caller, now)?;
        self.release(caller, amount).await?;
        dispute.ballot.mark_withdrawn(caller)?;

        info!(entry_id, voter = %caller, amount = %amount, "💸 Dispute stake withdrawn");
        Ok(())
    }

    pub async fn proposal(&self, id: u64) -> Option<RoundProposal> {
        self.state.read().await.proposals.get(&id).cloned()
    }

    pub async fn dispute(&self, round_proposal_id: u64, entry_id: u64) -> Option<Dispute> {
        self.state
            .read()
            .await
            .disputes
            .get(&(round_proposal_id, entry_id))
            .cloned()
    }

    pub async fn active_proposal_id(&self) -> Option<u64> {
        self.state.read().await.active_proposal
    }

    pub async fn ongoing_round(&self) -> Option<(u64, u64)> {
        self.state.read().await.ongoing_round
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use quadfund_ledger::{LedgerConfig, MemoryStorage};
    use quadfund_rounds::{MemoryGateway, RoundManagerConfig};

    fn addr(b: u8) -> AccountAddress {
        AccountAddress::from_bytes([b; 32])
    }

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    const ADMIN: u8 = 0xAD;
    const DAO: u8 = 0xDA;

    async fn setup() -> (Arc<TokenLedger>, GovernanceEngine) {
        let admin = addr(ADMIN);
        let dao = addr(DAO);
        let ledger = Arc::new(TokenLedger::new(
            Arc::new(MemoryStorage::new()),
            LedgerConfig {
                administrator: admin,
            },
        ));
        for holder in [addr(1), addr(2)] {
            ledger
                .mint(admin, holder, TokenAmount::from_units(1_000))
                .await
                .unwrap();
            ledger
                .approve(holder, dao, TokenAmount::from_units(500))
                .await
                .unwrap();
        }

        let config = GovernanceConfig {
            voting_window: Duration::seconds(100),
            dispute_window: Duration::seconds(50),
            ..GovernanceConfig::default()
        };
        let engine = GovernanceEngine::new(config, admin, dao, ledger.clone(), ledger.clone());
        (ledger, engine)
    }

    #[tokio::test]
    async fn test_vote_escrows_stake_with_quadratic_weight() {
        let (ledger, engine) = setup().await;
        let alice = addr(1);

        let id = engine
            .propose_new_round(alice, "spring round".into(), t(200), t(1_000), t(0))
            .await
            .unwrap();

        let weight = engine
            .vote_for_new_round_proposal(alice, true, TokenAmount::from_units(400), t(10))
            .await
            .unwrap();
        assert_eq!(weight, 20);

        let proposal = engine.proposal(id).await.unwrap();
        assert_eq!(proposal.ballot.votes_yes, 20);
        assert_eq!(
            ledger.balance_of(alice).await.unwrap(),
            TokenAmount::from_units(600)
        );
        assert_eq!(
            ledger.balance_of(addr(DAO)).await.unwrap(),
            TokenAmount::from_units(400)
        );

        assert!(matches!(
            engine
                .vote_for_new_round_proposal(alice, true, TokenAmount::from_units(100), t(20))
                .await,
            Err(GovernanceError::AlreadyVoted(_))
        ));
    }

    #[tokio::test]
    async fn test_vote_without_approval_leaves_ballot_untouched() {
        let (ledger, engine) = setup().await;
        let alice = addr(1);
        let stranger = addr(7);
        ledger
            .mint(addr(ADMIN), stranger, TokenAmount::from_units(100))
            .await
            .unwrap();

        let id = engine
            .propose_new_round(alice, "spring round".into(), t(200), t(1_000), t(0))
            .await
            .unwrap();

        // No allowance was granted to the DAO account
        assert!(matches!(
            engine
                .vote_for_new_round_proposal(stranger, true, TokenAmount::from_units(100), t(10))
                .await,
            Err(GovernanceError::Ledger(_))
        ));
        let proposal = engine.proposal(id).await.unwrap();
        assert_eq!(proposal.ballot.voter_count(), 0);
        assert_eq!(
            ledger.balance_of(stranger).await.unwrap(),
            TokenAmount::from_units(100)
        );
    }

    #[tokio::test]
    async fn test_schedule_validation() {
        let (_ledger, engine) = setup().await;
        let alice = addr(1);

        assert!(matches!(
            engine
                .propose_new_round(alice, "bad".into(), t(200), t(150), t(0))
                .await,
            Err(GovernanceError::InvalidSchedule(_))
        ));
        // Starts before the ballot closes
        assert!(matches!(
            engine
                .propose_new_round(alice, "bad".into(), t(50), t(1_000), t(0))
                .await,
            Err(GovernanceError::InvalidSchedule(_))
        ));
    }

    #[tokio::test]
    async fn test_execute_resolves_and_stake_withdrawal() {
        let (ledger, engine) = setup().await;
        let alice = addr(1);
        let bob = addr(2);

        let id = engine
            .propose_new_round(alice, "spring round".into(), t(200), t(1_000), t(0))
            .await
            .unwrap();
        engine
            .vote_for_new_round_proposal(alice, true, TokenAmount::from_units(400), t(10))
            .await
            .unwrap();
        engine
            .vote_for_new_round_proposal(bob, false, TokenAmount::from_units(100), t(10))
            .await
            .unwrap();

        assert!(matches!(
            engine.execute_new_round_proposal(alice, t(50)).await,
            Err(GovernanceError::VotingOpen)
        ));

        // margin = 20^2 - 10^2 = 300
        let resolution = engine
            .execute_new_round_proposal(alice, t(100))
            .await
            .unwrap();
        assert_eq!(resolution, ProposalResolution::Accepted);
        assert_eq!(engine.active_proposal_id().await, None);

        engine
            .withdraw_tokens_proposal(alice, id, t(110))
            .await
            .unwrap();
        assert_eq!(
            ledger.balance_of(alice).await.unwrap(),
            TokenAmount::from_units(1_000)
        );
        assert!(matches!(
            engine.withdraw_tokens_proposal(alice, id, t(120)).await,
            Err(GovernanceError::AlreadyWithdrawn)
        ));
    }

    #[tokio::test]
    async fn test_single_active_proposal() {
        let (_ledger, engine) = setup().await;
        let alice = addr(1);

        engine
            .propose_new_round(alice, "one".into(), t(200), t(1_000), t(0))
            .await
            .unwrap();
        assert!(matches!(
            engine
                .propose_new_round(alice, "two".into(), t(200), t(1_000), t(0))
                .await,
            Err(GovernanceError::ProposalAlreadyActive)
        ));
    }

    #[tokio::test]
    async fn test_donations_require_accepted_unlisted_proposal() {
        let (_ledger, engine) = setup().await;
        let alice = addr(1);

        engine
            .propose_new_round(alice, "round".into(), t(200), t(1_000), t(0))
            .await
            .unwrap();
        assert!(matches!(
            engine
                .donate_to_round(addr(40), "acme".into(), Mutez::from_units(500))
                .await,
            Err(GovernanceError::NotAccepted)
        ));

        engine
            .vote_for_new_round_proposal(alice, true, TokenAmount::from_units(400), t(10))
            .await
            .unwrap();
        engine
            .execute_new_round_proposal(alice, t(100))
            .await
            .unwrap();

        engine
            .donate_to_round(addr(40), "acme".into(), Mutez::from_units(500))
            .await
            .unwrap();
        assert!(matches!(
            engine
                .donate_to_round(addr(40), "acme".into(), Mutez::from_units(500))
                .await,
            Err(GovernanceError::AlreadyDonated(_))
        ));
    }

    #[test]
    fn test_default_dispute_ballot_outlasts_entry_window() {
        // An upheld dispute can only disqualify once the entry's own
        // window has elapsed, so the ballot must close after it.
        assert!(
            GovernanceConfig::default().dispute_window
                > RoundManagerConfig::default().entry_dispute_window
        );
    }

    #[tokio::test]
    async fn test_round_manager_wiring_is_admin_only_and_once() {
        let (_ledger, engine) = setup().await;
        let manager = Arc::new(RoundManager::new(
            addr(DAO),
            Arc::new(MemoryGateway::new()),
            RoundManagerConfig::default(),
        ));

        assert!(matches!(
            engine.set_round_manager(addr(1), manager.clone()).await,
            Err(GovernanceError::Unauthorized(_))
        ));
        engine
            .set_round_manager(addr(ADMIN), manager.clone())
            .await
            .unwrap();
        assert!(matches!(
            engine.set_round_manager(addr(ADMIN), manager).await,
            Err(GovernanceError::RoundManagerSet)
        ));
    }
}
