pub mod ballot;
pub mod engine;
pub mod error;
pub mod types;

pub use ballot::{BallotBox, VoterStake};
pub use engine::{GovernanceConfig, GovernanceEngine};
pub use error::{GovernanceError, Result};
pub use types::{Dispute, DisputeResolution, ProposalResolution, RoundProposal};
