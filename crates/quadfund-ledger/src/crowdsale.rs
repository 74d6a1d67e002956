use crate::error::{LedgerError, Result};
use crate::ledger::TokenLedger;
use chrono::{DateTime, Utc};
use quadfund_types::{AccountAddress, Mutez, TokenAmount};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone)]
pub struct CrowdsaleConfig {
    /// Price in mutez per share.
    pub price: Mutez,
    /// Wallet controlled by the DAO members; receives the closing
    /// allocation and may not buy.
    pub dao_wallet: AccountAddress,
    /// End of the sale window.
    pub expiry: DateTime<Utc>,
    /// Account identity the sale acts under; must be registered as a
    /// mint administrator on the ledger.
    pub sale_account: AccountAddress,
}

struct SaleState {
    total_sold: TokenAmount,
    dao_minted: bool,
}

/// Initial share sale. Buyers pay exactly `price * value` and receive
/// freshly minted shares; once the window closes the DAO wallet mints a
/// one-time 10% allocation of everything sold.
pub struct Crowdsale {
    ledger: Arc<TokenLedger>,
    config: CrowdsaleConfig,
    state: RwLock<SaleState>,
}

impl Crowdsale {
    pub fn new(ledger: Arc<TokenLedger>, config: CrowdsaleConfig) -> Self {
        Self {
            ledger,
            config,
            state: RwLock::new(SaleState {
                total_sold: TokenAmount::ZERO,
                dao_minted: false,
            }),
        }
    }

    pub async fn buy_tokens(
        &self,
        caller: AccountAddress,
        value: TokenAmount,
        payment: Mutez,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if now >= self.config.expiry {
            return Err(LedgerError::SaleClosed);
        }
        if caller == self.config.dao_wallet {
            return Err(LedgerError::Unauthorized("dao wallet cannot buy shares"));
        }

        let expected = self
            .config
            .price
            .to_units()
            .checked_mul(value.to_units())
            .map(Mutez::from_units)
            .ok_or(LedgerError::SupplyOverflow)?;
        if payment != expected {
            return Err(LedgerError::PaymentMismatch {
                expected,
                got: payment,
            });
        }

        let mut state = self.state.write().await;
        self.ledger
            .mint(self.config.sale_account, caller, value)
            .await?;
        state.total_sold = state
            .total_sold
            .checked_add(value)
            .ok_or(LedgerError::SupplyOverflow)?;

        info!(buyer = %caller, value = %value, payment = %payment, "🛒 Shares sold");
        Ok(())
    }

    /// One-time 10% closing allocation for the DAO wallet.
    pub async fn mint_for_dao(&self, caller: AccountAddress, now: DateTime<Utc>) -> Result<()> {
        if caller != self.config.dao_wallet {
            return Err(LedgerError::Unauthorized(
                "closing allocation is reserved for the dao wallet",
            ));
        }
        if now < self.config.expiry {
            return Err(LedgerError::SaleNotEnded);
        }

        let mut state = self.state.write().await;
        if state.dao_minted {
            return Err(LedgerError::DaoAllocationMinted);
        }

        let allocation = TokenAmount::from_units(state.total_sold.to_units() / 10);
        self.ledger
            .mint(self.config.sale_account, self.config.dao_wallet, allocation)
            .await?;
        state.dao_minted = true;

        info!(allocation = %allocation, "🏦 DAO closing allocation minted");
        Ok(())
    }

    pub async fn total_sold(&self) -> TokenAmount {
        self.state.read().await.total_sold
    }
}
