use serde::{Deserialize, Serialize};
use std::fmt;

/// Account identity as delivered by the authentication layer.
///
/// The wallet/signature layer that produces these is out of scope; every
/// operation in the workspace receives an already-authenticated address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountAddress([u8; 32]);

impl AccountAddress {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0[..8]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_short_hex() {
        let addr = AccountAddress::from_bytes([0xAB; 32]);
        assert_eq!(addr.to_string(), "0xabababababababab");
    }
}
