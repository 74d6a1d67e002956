use crate::error::{MathError, Result};

/// Fixed-point scale applied to contribution amounts before taking the
/// square root, so sub-unit precision survives integer arithmetic.
pub const SUBSIDY_SCALE: u64 = 10_000;

fn newton_root(n: u128) -> u128 {
    if n == 0 {
        return 0;
    }
    // `y > n / y` is the overflow-free form of `y * y > n`.
    let mut y = n;
    while y > n / y {
        y = (n / y + y) / 2;
    }
    y
}

fn checked_root(n: u128) -> Result<u128> {
    let root = newton_root(n);
    // Truncated integer square root: root^2 <= n < (root+1)^2.
    // Newton iteration on integers cannot leave this range; the check
    // guards against implementation bugs, not inputs.
    let lower_ok = root.checked_mul(root).is_some_and(|sq| sq <= n);
    let upper_ok = (root + 1)
        .checked_mul(root + 1)
        .map_or(true, |sq| n < sq);
    if lower_ok && upper_ok {
        Ok(root)
    } else {
        Err(MathError::RootInvariant { value: n, root })
    }
}

/// Truncated integer square root via Newton's method.
pub fn isqrt(n: u64) -> Result<u64> {
    checked_root(n as u128).map(|r| r as u64)
}

/// Square root of `amount * SUBSIDY_SCALE`, the per-contribution term of
/// the quadratic matching formula.
pub fn scaled_root(amount: u64) -> Result<u64> {
    let scaled = (amount as u128)
        .checked_mul(SUBSIDY_SCALE as u128)
        .ok_or(MathError::Overflow)?;
    checked_root(scaled).map(|r| r as u64)
}
