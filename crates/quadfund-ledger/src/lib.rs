pub mod crowdsale;
pub mod error;
pub mod ledger;
pub mod oracle;
pub mod storage;

pub use crowdsale::{Crowdsale, CrowdsaleConfig};
pub use error::{LedgerError, Result};
pub use ledger::{LedgerConfig, TokenLedger};
pub use oracle::BalanceOracle;
pub use storage::{LedgerStorage, MemoryStorage};
