use thiserror::Error;

#[derive(Error, Debug)]
pub enum MathError {
    #[error("Integer square root invariant violated for {value}: candidate root {root}")]
    RootInvariant { value: u128, root: u128 },

    #[error("Overflow in calculation")]
    Overflow,
}

pub type Result<T> = std::result::Result<T, MathError>;
