pub mod address;
pub mod amount;

pub use address::AccountAddress;
pub use amount::{Mutez, TokenAmount};
