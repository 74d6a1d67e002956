use anyhow::Result;
use async_trait::async_trait;
use quadfund_types::{AccountAddress, Mutez};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Outbound payment seam. Refunds and matching payouts go through this
/// trait so the round manager never touches a payment rail directly.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn send(&self, to: AccountAddress, amount: Mutez) -> Result<()>;
}

/// In-memory gateway that records every payment it is asked to make.
#[derive(Default)]
pub struct MemoryGateway {
    sent: Arc<RwLock<Vec<(AccountAddress, Mutez)>>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn payments(&self) -> Vec<(AccountAddress, Mutez)> {
        self.sent.read().await.clone()
    }

    pub async fn total_sent(&self, to: AccountAddress) -> Mutez {
        let sent = self.sent.read().await;
        sent.iter()
            .filter(|(addr, _)| *addr == to)
            .fold(Mutez::ZERO, |acc, (_, amount)| acc.saturating_add(*amount))
    }
}

#[async_trait]
impl PaymentGateway for MemoryGateway {
    async fn send(&self, to: AccountAddress, amount: Mutez) -> Result<()> {
        let mut sent = self.sent.write().await;
        sent.push((to, amount));
        Ok(())
    }
}
