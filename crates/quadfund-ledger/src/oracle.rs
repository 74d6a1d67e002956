use crate::ledger::TokenLedger;
use anyhow::Result;
use async_trait::async_trait;
use quadfund_types::{AccountAddress, TokenAmount};

/// Capability-style holder check.
///
/// The governance engine depends on this trait rather than on the ledger
/// type, so the ledger stays the sole owner of balance truth without a
/// hard dependency cycle.
#[async_trait]
pub trait BalanceOracle: Send + Sync {
    /// Errors unless `address` holds strictly more than `min`.
    async fn assert_min_balance(&self, address: AccountAddress, min: TokenAmount) -> Result<()>;
}

#[async_trait]
impl BalanceOracle for TokenLedger {
    async fn assert_min_balance(&self, address: AccountAddress, min: TokenAmount) -> Result<()> {
        TokenLedger::assert_min_balance(self, address, min)
            .await
            .map_err(anyhow::Error::from)
    }
}
