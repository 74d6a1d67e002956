pub mod error;
pub mod isqrt;

pub use error::{MathError, Result};
pub use isqrt::{isqrt, scaled_root, SUBSIDY_SCALE};
