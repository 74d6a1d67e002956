use anyhow::Result;
use async_trait::async_trait;
use quadfund_types::{AccountAddress, TokenAmount};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type BalanceMap = HashMap<AccountAddress, TokenAmount>;
type AllowanceMap = HashMap<(AccountAddress, AccountAddress), TokenAmount>;

/// Backing store for ledger state. Durability is out of scope; any
/// implementation is acceptable as long as lookups are keyed as below.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    async fn get_balance(&self, address: AccountAddress) -> Result<TokenAmount>;
    async fn set_balance(&self, address: AccountAddress, balance: TokenAmount) -> Result<()>;

    async fn get_allowance(
        &self,
        owner: AccountAddress,
        spender: AccountAddress,
    ) -> Result<TokenAmount>;
    async fn set_allowance(
        &self,
        owner: AccountAddress,
        spender: AccountAddress,
        value: TokenAmount,
    ) -> Result<()>;

    async fn get_total_supply(&self) -> Result<TokenAmount>;
    async fn set_total_supply(&self, supply: TokenAmount) -> Result<()>;

    async fn accounts(&self) -> Result<Vec<AccountAddress>>;
}

pub struct MemoryStorage {
    balances: Arc<RwLock<BalanceMap>>,
    allowances: Arc<RwLock<AllowanceMap>>,
    total_supply: Arc<RwLock<TokenAmount>>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            balances: Arc::new(RwLock::new(HashMap::new())),
            allowances: Arc::new(RwLock::new(HashMap::new())),
            total_supply: Arc::new(RwLock::new(TokenAmount::ZERO)),
        }
    }
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn get_balance(&self, address: AccountAddress) -> Result<TokenAmount> {
        let balances = self.balances.read().await;
        Ok(balances.get(&address).copied().unwrap_or(TokenAmount::ZERO))
    }

    async fn set_balance(&self, address: AccountAddress, balance: TokenAmount) -> Result<()> {
        // Accounts are created lazily and never deleted; a zero balance
        // persists as an entry.
        let mut balances = self.balances.write().await;
        balances.insert(address, balance);
        Ok(())
    }

    async fn get_allowance(
        &self,
        owner: AccountAddress,
        spender: AccountAddress,
    ) -> Result<TokenAmount> {
        let allowances = self.allowances.read().await;
        Ok(allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(TokenAmount::ZERO))
    }

    async fn set_allowance(
        &self,
        owner: AccountAddress,
        spender: AccountAddress,
        value: TokenAmount,
    ) -> Result<()> {
        let mut allowances = self.allowances.write().await;
        allowances.insert((owner, spender), value);
        Ok(())
    }

    async fn get_total_supply(&self) -> Result<TokenAmount> {
        Ok(*self.total_supply.read().await)
    }

    async fn set_total_supply(&self, supply: TokenAmount) -> Result<()> {
        *self.total_supply.write().await = supply;
        Ok(())
    }

    async fn accounts(&self) -> Result<Vec<AccountAddress>> {
        let balances = self.balances.read().await;
        Ok(balances.keys().copied().collect())
    }
}
