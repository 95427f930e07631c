//! Transaction hash type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{decode_fixed, TypesError};

/// A 32-byte transaction hash (the Blake2b-256 input hash of a signed transaction).
///
/// Ordering is lexicographic over the raw bytes; the ordering scheduler relies on
/// this as its last-resort tie-break.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl Default for TxHash {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for TxHash {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<32>(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parses_back() {
        let hash = TxHash::new([0xAB; 32]);
        let parsed: TxHash = hash.to_string().parse().unwrap();
        assert_eq!(parsed, hash);
    }

    #[test]
    fn ordering_is_lexicographic() {
        let mut low = [0u8; 32];
        low[31] = 9;
        let mut high = [0u8; 32];
        high[0] = 1;
        assert!(TxHash::new(low) < TxHash::new(high));
    }

    #[test]
    fn rejects_short_hex() {
        assert!(matches!(
            "abcd".parse::<TxHash>(),
            Err(TypesError::InvalidLength { expected: 32, actual: 2 })
        ));
    }
}
