use crate::error::{Result, RoundError};
use crate::gateway::PaymentGateway;
use crate::types::{Contribution, Entry, FundingRound, Sponsor};
use chrono::{DateTime, Duration, Utc};
use quadfund_math::scaled_root;
use quadfund_types::{AccountAddress, Mutez};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RoundManagerConfig {
    /// How long a disputed entry stays open for dispute voting before it
    /// becomes eligible for disqualification.
    pub entry_dispute_window: Duration,
}

impl Default for RoundManagerConfig {
    fn default() -> Self {
        Self {
            entry_dispute_window: Duration::hours(24),
        }
    }
}

struct RoundsState {
    rounds: BTreeMap<u64, FundingRound>,
    current_round: Option<u64>,
    next_round_id: u64,
}

/// Runs funding rounds: entries, contributions, disputes and the
/// quadratic matching payout. Lifecycle commands are reserved for the
/// governance account; contributing and payout retrieval are open to
/// the addresses they concern.
pub struct RoundManager {
    governance: AccountAddress,
    gateway: Arc<dyn PaymentGateway>,
    config: RoundManagerConfig,
    state: RwLock<RoundsState>,
}

impl RoundManager {
    pub fn new(
        governance: AccountAddress,
        gateway: Arc<dyn PaymentGateway>,
        config: RoundManagerConfig,
    ) -> Self {
        Self {
            governance,
            gateway,
            config,
            state: RwLock::new(RoundsState {
                rounds: BTreeMap::new(),
                current_round: None,
                next_round_id: 0,
            }),
        }
    }

    fn require_governance(&self, caller: AccountAddress) -> Result<()> {
        if caller != self.governance {
            return Err(RoundError::Unauthorized(
                "only the governance account may do this",
            ));
        }
        Ok(())
    }

    pub async fn create_new_round(
        &self,
        caller: AccountAddress,
        description: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        sponsors: Vec<Sponsor>,
        total_sponsorship: Mutez,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        self.require_governance(caller)?;
        if end <= now {
            return Err(RoundError::InvalidSchedule("round must end in the future"));
        }

        let mut state = self.state.write().await;
        if state.current_round.is_some() {
            return Err(RoundError::RoundAlreadyActive);
        }

        let id = state.next_round_id;
        state.next_round_id += 1;
        state.rounds.insert(
            id,
            FundingRound {
                id,
                description,
                start,
                end,
                sponsors,
                entries: BTreeMap::new(),
                entry_counter: 0,
                total_sponsorship,
                total_contribution: Mutez::ZERO,
                total_subsidy_power: 0,
                active: true,
            },
        );
        state.current_round = Some(id);

        info!(round_id = id, sponsorship = %total_sponsorship, "🏁 Funding round created");
        Ok(id)
    }

    /// Registers a new entry in the active round and returns its id.
    pub async fn enter_round(
        &self,
        caller: AccountAddress,
        description: String,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let mut state = self.state.write().await;
        let round = active_round_mut(&mut state)?;
        if !round.is_open(now) {
            return Err(RoundError::RoundNotOpen);
        }

        let entry_id = round.entry_counter;
        round.entry_counter += 1;
        round
            .entries
            .insert(entry_id, Entry::new(description, caller));

        info!(round_id = round.id, entry_id, owner = %caller, "📋 Entry registered");
        Ok(entry_id)
    }

    /// Accepts a contribution to an entry of the active round. Each
    /// contributor gets a single slot per entry and the entry's subsidy
    /// power grows by the scaled square root of the amount.
    pub async fn contribute(
        &self,
        caller: AccountAddress,
        entry_id: u64,
        payment: Mutez,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if payment == Mutez::ZERO {
            return Err(RoundError::ZeroContribution);
        }

        let mut state = self.state.write().await;
        let round = active_round_mut(&mut state)?;
        if !round.is_open(now) {
            return Err(RoundError::RoundNotOpen);
        }
        let entry = round
            .entries
            .get_mut(&entry_id)
            .ok_or(RoundError::EntryNotFound(entry_id))?;
        if entry.disqualified {
            return Err(RoundError::EntryDisqualified(entry_id));
        }
        if entry.owner == caller {
            return Err(RoundError::SelfContribution);
        }
        if entry.contributions.contains_key(&caller) {
            return Err(RoundError::AlreadyContributed);
        }

        let root = scaled_root(payment.to_units())?;
        entry.subsidy_power = entry
            .subsidy_power
            .checked_add(root as u128)
            .ok_or(RoundError::ArithmeticOverflow)?;
        entry.total_contribution = entry
            .total_contribution
            .checked_add(payment)
            .ok_or(RoundError::ArithmeticOverflow)?;
        entry.contributions.insert(
            caller,
            Contribution {
                amount: payment,
                timestamp: now,
                refunded: false,
            },
        );
        round.total_contribution = round
            .total_contribution
            .checked_add(payment)
            .ok_or(RoundError::ArithmeticOverflow)?;

        info!(entry_id, contributor = %caller, amount = %payment, "💸 Contribution accepted");
        Ok(())
    }

    /// Read-only probe used before escrowing a dispute stake: succeeds
    /// iff `dispute` would currently be accepted for this entry.
    pub async fn check_disputable(&self, entry_id: u64) -> Result<()> {
        let state = self.state.read().await;
        let round_id = state.current_round.ok_or(RoundError::NoActiveRound)?;
        let round = state
            .rounds
            .get(&round_id)
            .ok_or(RoundError::RoundNotFound(round_id))?;
        let entry = round
            .entries
            .get(&entry_id)
            .ok_or(RoundError::EntryNotFound(entry_id))?;
        if entry.disputed {
            return Err(RoundError::AlreadyDisputed(entry_id));
        }
        if entry.disqualified {
            return Err(RoundError::EntryDisqualified(entry_id));
        }
        Ok(())
    }

    /// Read-only counterpart of `disqualify`: succeeds iff the call
    /// would currently be accepted. Lets callers sequence their own
    /// side effects before the entry flag commits.
    pub async fn check_disqualifiable(&self, entry_id: u64, now: DateTime<Utc>) -> Result<()> {
        let state = self.state.read().await;
        let round_id = state.current_round.ok_or(RoundError::NoActiveRound)?;
        let round = state
            .rounds
            .get(&round_id)
            .ok_or(RoundError::RoundNotFound(round_id))?;
        let entry = round
            .entries
            .get(&entry_id)
            .ok_or(RoundError::EntryNotFound(entry_id))?;
        if entry.disqualified {
            return Err(RoundError::EntryDisqualified(entry_id));
        }
        if now <= entry.dispute_end {
            return Err(RoundError::DisputeWindowOpen);
        }
        Ok(())
    }

    /// Marks an entry as disputed and opens its dispute window.
    pub async fn dispute(
        &self,
        caller: AccountAddress,
        entry_id: u64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.require_governance(caller)?;

        let mut state = self.state.write().await;
        let round = active_round_mut(&mut state)?;
        let entry = round
            .entries
            .get_mut(&entry_id)
            .ok_or(RoundError::EntryNotFound(entry_id))?;
        if entry.disputed {
            return Err(RoundError::AlreadyDisputed(entry_id));
        }
        if entry.disqualified {
            return Err(RoundError::EntryDisqualified(entry_id));
        }

        entry.disputed = true;
        entry.dispute_end = now + self.config.entry_dispute_window;

        warn!(entry_id, until = %entry.dispute_end, "⚖️ Entry disputed");
        Ok(())
    }

    /// Removes a disputed entry from the matching pool once its dispute
    /// window has closed.
    pub async fn disqualify(
        &self,
        caller: AccountAddress,
        entry_id: u64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.require_governance(caller)?;

        let mut state = self.state.write().await;
        let round = active_round_mut(&mut state)?;
        let entry = round
            .entries
            .get_mut(&entry_id)
            .ok_or(RoundError::EntryNotFound(entry_id))?;
        if entry.disqualified {
            return Err(RoundError::EntryDisqualified(entry_id));
        }
        if now <= entry.dispute_end {
            return Err(RoundError::DisputeWindowOpen);
        }

        entry.disqualified = true;

        warn!(entry_id, "🔥 Entry disqualified");
        Ok(())
    }

    /// Pull-based refund of one contribution slot on a disqualified
    /// entry. Pays out at most once per contributor.
    pub async fn withdraw_contribution(
        &self,
        caller: AccountAddress,
        round_id: u64,
        entry_id: u64,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let round = state
            .rounds
            .get_mut(&round_id)
            .ok_or(RoundError::RoundNotFound(round_id))?;
        let entry = round
            .entries
            .get_mut(&entry_id)
            .ok_or(RoundError::EntryNotFound(entry_id))?;
        if !entry.disqualified {
            return Err(RoundError::NotDisqualified);
        }
        let slot = entry
            .contributions
            .get_mut(&caller)
            .ok_or(RoundError::NothingToWithdraw)?;
        if slot.refunded {
            return Err(RoundError::AlreadyRefunded);
        }

        self.gateway.send(caller, slot.amount).await?;
        slot.refunded = true;

        info!(entry_id, contributor = %caller, amount = %slot.amount, "💰 Contribution refunded");
        Ok(())
    }

    /// Settles the active round: fixes the total squared subsidy power
    /// over the qualifying entries and closes the round for payouts.
    /// `payment` must hand over exactly the pledged sponsorship pool.
    pub async fn disburse(
        &self,
        caller: AccountAddress,
        payment: Mutez,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.require_governance(caller)?;

        let mut state = self.state.write().await;
        let round = active_round_mut(&mut state)?;
        if now <= round.end {
            return Err(RoundError::RoundNotEnded);
        }
        if payment != round.total_sponsorship {
            return Err(RoundError::PaymentMismatch {
                expected: round.total_sponsorship,
                got: payment,
            });
        }

        let mut total: u128 = 0;
        for entry in round.entries.values().filter(|e| !e.disqualified) {
            let clout = entry.clout().ok_or(RoundError::ArithmeticOverflow)?;
            total = total.checked_add(clout).ok_or(RoundError::ArithmeticOverflow)?;
        }
        if total == 0 {
            return Err(RoundError::NoQualifyingSubsidy);
        }

        round.total_subsidy_power = total;
        round.active = false;
        let round_id = round.id;
        state.current_round = None;

        info!(round_id, pool = %payment, total_power = total, "✅ Round settled");
        Ok(())
    }

    /// Pays an entry owner their share of the matching pool plus the
    /// entry's own contributions. Pays out at most once per entry; any
    /// rounding remainder stays with the sponsorship holder.
    pub async fn retrieve_match(
        &self,
        caller: AccountAddress,
        round_id: u64,
        entry_id: u64,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let round = state
            .rounds
            .get_mut(&round_id)
            .ok_or(RoundError::RoundNotFound(round_id))?;
        if round.active || round.total_subsidy_power == 0 {
            return Err(RoundError::NotSettled);
        }
        let total_power = round.total_subsidy_power;
        let pool = round.total_sponsorship;
        let entry = round
            .entries
            .get_mut(&entry_id)
            .ok_or(RoundError::EntryNotFound(entry_id))?;
        if entry.owner != caller {
            return Err(RoundError::NotEntryOwner);
        }
        if entry.disqualified {
            return Err(RoundError::EntryDisqualified(entry_id));
        }
        if entry.retrieved {
            return Err(RoundError::AlreadyRetrieved);
        }

        let clout = entry.clout().ok_or(RoundError::ArithmeticOverflow)?;
        let won = (pool.to_units() as u128)
            .checked_mul(clout)
            .ok_or(RoundError::ArithmeticOverflow)?
            / total_power;
        // won <= pool, so the narrowing cast is exact
        let won = Mutez::from_units(won as u64);
        let payout = won
            .checked_add(entry.total_contribution)
            .ok_or(RoundError::ArithmeticOverflow)?;

        self.gateway.send(entry.owner, payout).await?;
        entry.retrieved = true;
        entry.sponsorship_won = won;

        info!(round_id, entry_id, won = %won, payout = %payout, "🏆 Match retrieved");
        Ok(())
    }

    pub async fn current_round_id(&self) -> Option<u64> {
        self.state.read().await.current_round
    }

    pub async fn round_snapshot(&self, round_id: u64) -> Option<FundingRound> {
        self.state.read().await.rounds.get(&round_id).cloned()
    }

    pub async fn entry(&self, round_id: u64, entry_id: u64) -> Option<Entry> {
        let state = self.state.read().await;
        state
            .rounds
            .get(&round_id)
            .and_then(|r| r.entries.get(&entry_id))
            .cloned()
    }
}

fn active_round_mut(state: &mut RoundsState) -> Result<&mut FundingRound> {
    let round_id = state.current_round.ok_or(RoundError::NoActiveRound)?;
    state
        .rounds
        .get_mut(&round_id)
        .ok_or(RoundError::RoundNotFound(round_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;
    use chrono::TimeZone;

    fn addr(b: u8) -> AccountAddress {
        AccountAddress::from_bytes([b; 32])
    }

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn setup() -> (Arc<MemoryGateway>, RoundManager, AccountAddress) {
        let governance = addr(0xF0);
        let gateway = Arc::new(MemoryGateway::new());
        let manager = RoundManager::new(
            governance,
            gateway.clone(),
            RoundManagerConfig {
                entry_dispute_window: Duration::seconds(100),
            },
        );
        (gateway, manager, governance)
    }

    async fn open_round(manager: &RoundManager, governance: AccountAddress, pool: u64) -> u64 {
        manager
            .create_new_round(
                governance,
                "climate tooling".into(),
                t(0),
                t(1_000),
                vec![Sponsor {
                    name: "acme".into(),
                    amount: Mutez::from_units(pool),
                }],
                Mutez::from_units(pool),
                t(0),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_quadratic_matching_split() {
        let (gateway, manager, governance) = setup();
        let round_id = open_round(&manager, governance, 1_000).await;

        let owner_a = addr(1);
        let owner_b = addr(2);
        let e1 = manager
            .enter_round(owner_a, "sensor net".into(), t(10))
            .await
            .unwrap();
        let e2 = manager
            .enter_round(owner_b, "open atlas".into(), t(10))
            .await
            .unwrap();

        manager
            .contribute(addr(10), e1, Mutez::from_units(100), t(20))
            .await
            .unwrap();
        manager
            .contribute(addr(11), e2, Mutez::from_units(400), t(20))
            .await
            .unwrap();

        // isqrt(100 * 10_000) = 1_000, isqrt(400 * 10_000) = 2_000
        let entry = manager.entry(round_id, e1).await.unwrap();
        assert_eq!(entry.subsidy_power, 1_000);
        let entry = manager.entry(round_id, e2).await.unwrap();
        assert_eq!(entry.subsidy_power, 2_000);

        manager
            .disburse(governance, Mutez::from_units(1_000), t(1_001))
            .await
            .unwrap();
        let round = manager.round_snapshot(round_id).await.unwrap();
        assert!(!round.active);
        assert_eq!(round.total_subsidy_power, 5_000_000);

        // Shares of the 1000 pool are 1_000_000/5_000_000 and
        // 4_000_000/5_000_000; payouts add back each entry's own
        // contributions.
        manager.retrieve_match(owner_a, round_id, e1).await.unwrap();
        manager.retrieve_match(owner_b, round_id, e2).await.unwrap();
        assert_eq!(gateway.total_sent(owner_a).await, Mutez::from_units(300));
        assert_eq!(gateway.total_sent(owner_b).await, Mutez::from_units(1_200));

        assert!(matches!(
            manager.retrieve_match(owner_a, round_id, e1).await,
            Err(RoundError::AlreadyRetrieved)
        ));
    }

    #[tokio::test]
    async fn test_contribution_guards() {
        let (_gateway, manager, governance) = setup();
        let _round_id = open_round(&manager, governance, 500).await;
        let owner = addr(1);
        let e1 = manager
            .enter_round(owner, "archive".into(), t(10))
            .await
            .unwrap();

        assert!(matches!(
            manager.contribute(owner, e1, Mutez::from_units(50), t(20)).await,
            Err(RoundError::SelfContribution)
        ));
        assert!(matches!(
            manager.contribute(addr(9), e1, Mutez::ZERO, t(20)).await,
            Err(RoundError::ZeroContribution)
        ));

        manager
            .contribute(addr(9), e1, Mutez::from_units(50), t(20))
            .await
            .unwrap();
        assert!(matches!(
            manager.contribute(addr(9), e1, Mutez::from_units(50), t(30)).await,
            Err(RoundError::AlreadyContributed)
        ));

        // After the round window closes, no further contributions
        assert!(matches!(
            manager
                .contribute(addr(12), e1, Mutez::from_units(50), t(1_001))
                .await,
            Err(RoundError::RoundNotOpen)
        ));
    }

    #[tokio::test]
    async fn test_dispute_disqualify_and_refund() {
        let (gateway, manager, governance) = setup();
        let round_id = open_round(&manager, governance, 500).await;
        let owner = addr(1);
        let contributor = addr(9);
        let e1 = manager
            .enter_round(owner, "phantom project".into(), t(10))
            .await
            .unwrap();
        manager
            .contribute(contributor, e1, Mutez::from_units(200), t(20))
            .await
            .unwrap();

        // Undisputed entries can never be disqualified
        assert!(matches!(
            manager.disqualify(governance, e1, t(30)).await,
            Err(RoundError::DisputeWindowOpen)
        ));

        manager.check_disputable(e1).await.unwrap();
        manager.dispute(governance, e1, t(30)).await.unwrap();
        assert!(matches!(
            manager.check_disputable(e1).await,
            Err(RoundError::AlreadyDisputed(_))
        ));
        assert!(matches!(
            manager.disqualify(governance, e1, t(100)).await,
            Err(RoundError::DisputeWindowOpen)
        ));

        // The read-only probe mirrors disqualify's preconditions
        assert!(matches!(
            manager.check_disqualifiable(e1, t(100)).await,
            Err(RoundError::DisputeWindowOpen)
        ));
        manager.check_disqualifiable(e1, t(131)).await.unwrap();

        manager.disqualify(governance, e1, t(131)).await.unwrap();
        assert!(matches!(
            manager.check_disqualifiable(e1, t(132)).await,
            Err(RoundError::EntryDisqualified(_))
        ));

        assert!(matches!(
            manager
                .contribute(addr(10), e1, Mutez::from_units(10), t(140))
                .await,
            Err(RoundError::EntryDisqualified(_))
        ));

        manager
            .withdraw_contribution(contributor, round_id, e1)
            .await
            .unwrap();
        assert_eq!(
            gateway.total_sent(contributor).await,
            Mutez::from_units(200)
        );
        assert!(matches!(
            manager.withdraw_contribution(contributor, round_id, e1).await,
            Err(RoundError::AlreadyRefunded)
        ));
        assert!(matches!(
            manager.withdraw_contribution(addr(33), round_id, e1).await,
            Err(RoundError::NothingToWithdraw)
        ));

        // The only entry is disqualified, so settlement has nothing to split
        assert!(matches!(
            manager
                .disburse(governance, Mutez::from_units(500), t(1_001))
                .await,
            Err(RoundError::NoQualifyingSubsidy)
        ));
    }

    #[tokio::test]
    async fn test_lifecycle_authorization() {
        let (_gateway, manager, governance) = setup();
        let intruder = addr(66);

        assert!(matches!(
            manager
                .create_new_round(
                    intruder,
                    "rogue".into(),
                    t(0),
                    t(10),
                    vec![],
                    Mutez::ZERO,
                    t(0)
                )
                .await,
            Err(RoundError::Unauthorized(_))
        ));

        open_round(&manager, governance, 100).await;
        assert!(matches!(
            manager
                .create_new_round(
                    governance,
                    "again".into(),
                    t(0),
                    t(10),
                    vec![],
                    Mutez::ZERO,
                    t(0)
                )
                .await,
            Err(RoundError::RoundAlreadyActive)
        ));

        assert!(matches!(
            manager.dispute(intruder, 0, t(5)).await,
            Err(RoundError::Unauthorized(_))
        ));
        assert!(matches!(
            manager.disburse(intruder, Mutez::from_units(100), t(11)).await,
            Err(RoundError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_disburse_requires_full_pool_after_end() {
        let (_gateway, manager, governance) = setup();
        let _id = open_round(&manager, governance, 1_000).await;
        let e1 = manager
            .enter_round(addr(1), "tool".into(), t(10))
            .await
            .unwrap();
        manager
            .contribute(addr(9), e1, Mutez::from_units(100), t(20))
            .await
            .unwrap();

        assert!(matches!(
            manager.disburse(governance, Mutez::from_units(1_000), t(500)).await,
            Err(RoundError::RoundNotEnded)
        ));
        assert!(matches!(
            manager.disburse(governance, Mutez::from_units(999), t(1_001)).await,
            Err(RoundError::PaymentMismatch { .. })
        ));
    }
}
