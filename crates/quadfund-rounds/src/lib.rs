pub mod error;
pub mod gateway;
pub mod manager;
pub mod types;

pub use error::{Result, RoundError};
pub use gateway::{MemoryGateway, PaymentGateway};
pub use manager::{RoundManager, RoundManagerConfig};
pub use types::{Contribution, Entry, FundingRound, Sponsor};
