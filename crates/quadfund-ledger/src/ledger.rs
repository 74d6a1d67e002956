use crate::error::{LedgerError, Result};
use crate::storage::LedgerStorage;
use quadfund_types::{AccountAddress, TokenAmount};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Root administrator: may transfer unconditionally, pause the
    /// ledger, burn, and manage mint administrators.
    pub administrator: AccountAddress,
}

struct LedgerControl {
    administrator: AccountAddress,
    mint_administrators: HashSet<AccountAddress>,
    paused: bool,
}

/// Balance and approval bookkeeping for the DAO's voting shares.
///
/// Every operation is atomic: all preconditions are checked before any
/// state is written, so a returned error implies no mutation.
pub struct TokenLedger {
    storage: Arc<dyn LedgerStorage>,
    control: RwLock<LedgerControl>,
}

impl TokenLedger {
    pub fn new(storage: Arc<dyn LedgerStorage>, config: LedgerConfig) -> Self {
        Self {
            storage,
            control: RwLock::new(LedgerControl {
                administrator: config.administrator,
                mint_administrators: HashSet::new(),
                paused: false,
            }),
        }
    }

    /// Move `value` from `from` to `to` on behalf of `caller`.
    ///
    /// Allowed iff caller is the administrator, or the ledger is not
    /// paused and caller either owns the source account or holds a
    /// sufficient allowance on it. A third-party move decrements the
    /// allowance with checked subtraction.
    pub async fn transfer(
        &self,
        caller: AccountAddress,
        from: AccountAddress,
        to: AccountAddress,
        value: TokenAmount,
    ) -> Result<()> {
        let control = self.control.write().await;
        let is_admin = caller == control.administrator;
        let spends_allowance = !is_admin && caller != from;

        if !is_admin {
            if control.paused {
                return Err(LedgerError::Paused);
            }
            if spends_allowance {
                let allowance = self.storage.get_allowance(from, caller).await?;
                if allowance < value {
                    return Err(LedgerError::InsufficientAllowance {
                        owner: from,
                        spender: caller,
                        has: allowance,
                        needs: value,
                    });
                }
            }
        }

        let from_balance = self.storage.get_balance(from).await?;
        if from_balance < value {
            return Err(LedgerError::InsufficientBalance {
                address: from,
                has: from_balance,
                needs: value,
            });
        }

        if from == to {
            // Self-transfer is a no-op on balances but still consumes the
            // allowance below, matching the general rule.
            self.storage.set_balance(from, from_balance).await?;
        } else {
            let to_balance = self.storage.get_balance(to).await?;
            let new_to = to_balance
                .checked_add(value)
                .ok_or(LedgerError::BalanceOverflow(to))?;
            self.storage
                .set_balance(from, from_balance.saturating_sub(value))
                .await?;
            self.storage.set_balance(to, new_to).await?;
        }

        if spends_allowance {
            let allowance = self.storage.get_allowance(from, caller).await?;
            let remaining = allowance
                .checked_sub(value)
                .ok_or(LedgerError::InsufficientAllowance {
                    owner: from,
                    spender: caller,
                    has: allowance,
                    needs: value,
                })?;
            self.storage.set_allowance(from, caller, remaining).await?;
        }

        info!(
            caller = %caller,
            from = %from,
            to = %to,
            value = %value,
            via_allowance = spends_allowance,
            "💸 Transfer executed"
        );
        Ok(())
    }

    /// Set the allowance `caller` grants to `spender`.
    ///
    /// Rejects a nonzero-to-nonzero change so a spender cannot race the
    /// owner and spend both the old and the new allowance.
    pub async fn approve(
        &self,
        caller: AccountAddress,
        spender: AccountAddress,
        value: TokenAmount,
    ) -> Result<()> {
        // Write lock even though control is only read: mutating ledger
        // operations are serialized on it.
        let control = self.control.write().await;
        if control.paused {
            return Err(LedgerError::Paused);
        }

        let current = self.storage.get_allowance(caller, spender).await?;
        if current != TokenAmount::ZERO && value != TokenAmount::ZERO {
            return Err(LedgerError::UnsafeAllowanceChange);
        }
        self.storage.set_allowance(caller, spender, value).await?;

        info!(owner = %caller, spender = %spender, value = %value, "✅ Allowance set");
        Ok(())
    }

    /// Credit freshly minted shares to `address`.
    pub async fn mint(
        &self,
        caller: AccountAddress,
        address: AccountAddress,
        value: TokenAmount,
    ) -> Result<()> {
        let control = self.control.write().await;
        if caller != control.administrator && !control.mint_administrators.contains(&caller) {
            return Err(LedgerError::Unauthorized("mint requires an administrator"));
        }

        let supply = self.storage.get_total_supply().await?;
        let new_supply = supply.checked_add(value).ok_or(LedgerError::SupplyOverflow)?;
        let balance = self.storage.get_balance(address).await?;
        let new_balance = balance
            .checked_add(value)
            .ok_or(LedgerError::BalanceOverflow(address))?;

        self.storage.set_balance(address, new_balance).await?;
        self.storage.set_total_supply(new_supply).await?;

        info!(
            address = %address,
            value = %value,
            total_supply = %new_supply,
            "💰 Shares minted"
        );
        Ok(())
    }

    /// Destroy shares held by `address`. Root administrator only.
    pub async fn burn(
        &self,
        caller: AccountAddress,
        address: AccountAddress,
        value: TokenAmount,
    ) -> Result<()> {
        let control = self.control.write().await;
        if caller != control.administrator {
            return Err(LedgerError::Unauthorized("burn is administrator-only"));
        }

        let balance = self.storage.get_balance(address).await?;
        if balance < value {
            return Err(LedgerError::InsufficientBalance {
                address,
                has: balance,
                needs: value,
            });
        }
        let supply = self.storage.get_total_supply().await?;
        let new_supply = supply.checked_sub(value).ok_or(LedgerError::SupplyOverflow)?;

        self.storage
            .set_balance(address, balance.saturating_sub(value))
            .await?;
        self.storage.set_total_supply(new_supply).await?;

        info!(address = %address, value = %value, total_supply = %new_supply, "🔥 Shares burned");
        Ok(())
    }

    pub async fn set_pause(&self, caller: AccountAddress, pause: bool) -> Result<()> {
        let mut control = self.control.write().await;
        if caller != control.administrator {
            return Err(LedgerError::Unauthorized("set_pause is administrator-only"));
        }
        control.paused = pause;
        info!(paused = pause, "Ledger pause flag updated");
        Ok(())
    }

    pub async fn set_administrator(
        &self,
        caller: AccountAddress,
        administrator: AccountAddress,
    ) -> Result<()> {
        let mut control = self.control.write().await;
        if caller != control.administrator {
            return Err(LedgerError::Unauthorized(
                "set_administrator is administrator-only",
            ));
        }
        control.administrator = administrator;
        info!(administrator = %administrator, "Ledger administrator changed");
        Ok(())
    }

    pub async fn add_mint_administrator(
        &self,
        caller: AccountAddress,
        address: AccountAddress,
    ) -> Result<()> {
        let mut control = self.control.write().await;
        if caller != control.administrator {
            return Err(LedgerError::Unauthorized(
                "mint administrators are managed by the administrator",
            ));
        }
        control.mint_administrators.insert(address);
        debug!(address = %address, "Mint administrator added");
        Ok(())
    }

    pub async fn remove_mint_administrator(
        &self,
        caller: AccountAddress,
        address: AccountAddress,
    ) -> Result<()> {
        let mut control = self.control.write().await;
        if caller != control.administrator {
            return Err(LedgerError::Unauthorized(
                "mint administrators are managed by the administrator",
            ));
        }
        control.mint_administrators.remove(&address);
        debug!(address = %address, "Mint administrator removed");
        Ok(())
    }

    /// Errors unless `address` holds strictly more than `min`. Used as
    /// the holder gate for governance operations.
    pub async fn assert_min_balance(
        &self,
        address: AccountAddress,
        min: TokenAmount,
    ) -> Result<()> {
        let balance = self.storage.get_balance(address).await?;
        if balance > min {
            Ok(())
        } else {
            Err(LedgerError::NotAHolder {
                address,
                balance,
                required: min,
            })
        }
    }

    pub async fn balance_of(&self, address: AccountAddress) -> Result<TokenAmount> {
        Ok(self.storage.get_balance(address).await?)
    }

    pub async fn allowance(
        &self,
        owner: AccountAddress,
        spender: AccountAddress,
    ) -> Result<TokenAmount> {
        Ok(self.storage.get_allowance(owner, spender).await?)
    }

    pub async fn total_supply(&self) -> Result<TokenAmount> {
        Ok(self.storage.get_total_supply().await?)
    }

    pub async fn administrator(&self) -> AccountAddress {
        self.control.read().await.administrator
    }

    /// Sum of all account balances; equals `total_supply` at all times.
    pub async fn sum_of_balances(&self) -> Result<TokenAmount> {
        let mut sum = TokenAmount::ZERO;
        for account in self.storage.accounts().await? {
            let balance = self.storage.get_balance(account).await?;
            sum = sum.checked_add(balance).ok_or(LedgerError::SupplyOverflow)?;
        }
        Ok(sum)
    }
}
