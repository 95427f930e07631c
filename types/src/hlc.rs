//! Hybrid logical clock timestamps.
//!
//! A timestamp is `(physical_ns, logical, node)`. Comparison is lexicographic
//! over those three components, which gives a strict total order across the
//! whole network as long as node identifiers are unique. The clock algorithm
//! that issues these lives in `strata-hlc`; this module only defines the value
//! type and its encodings.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{decode_fixed, TypesError};
use crate::keys::PublicKey;

/// Width of [`HlcTimestamp::to_sort_key`]: 8 (physical) + 4 (logical) + 32 (node).
pub const SORT_KEY_LEN: usize = 44;

/// Identity of the node that stamped a timestamp (its Ed25519 public key).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct NodeId(pub [u8; 32]);

impl NodeId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<PublicKey> for NodeId {
    fn from(key: PublicKey) -> Self {
        Self(key.0)
    }
}

impl From<&PublicKey> for NodeId {
    fn from(key: &PublicKey) -> Self {
        Self(key.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// A hybrid logical clock timestamp.
///
/// Immutable once issued. Field order matters: the derived `Ord` compares
/// `physical_ns`, then `logical`, then `node`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct HlcTimestamp {
    /// Physical component, nanoseconds since the Unix epoch.
    pub physical_ns: u64,
    /// Logical counter disambiguating events within one physical tick.
    pub logical: u32,
    /// Stamping node, the final tie-break.
    pub node: NodeId,
}

impl HlcTimestamp {
    pub fn new(physical_ns: u64, logical: u32, node: NodeId) -> Self {
        Self {
            physical_ns,
            logical,
            node,
        }
    }

    /// Compare only the clock components, ignoring node identity.
    ///
    /// The HLC algorithm advances on `(physical, logical)`; the node id only
    /// matters when ordering timestamps from different nodes.
    pub fn cmp_clock(&self, other: &Self) -> Ordering {
        self.physical_ns
            .cmp(&other.physical_ns)
            .then(self.logical.cmp(&other.logical))
    }

    /// Fixed-width big-endian encoding whose byte order equals `Ord`.
    pub fn to_sort_key(&self) -> [u8; SORT_KEY_LEN] {
        let mut key = [0u8; SORT_KEY_LEN];
        key[0..8].copy_from_slice(&self.physical_ns.to_be_bytes());
        key[8..12].copy_from_slice(&self.logical.to_be_bytes());
        key[12..44].copy_from_slice(&self.node.0);
        key
    }

    /// Inverse of [`to_sort_key`](Self::to_sort_key).
    pub fn from_sort_key(key: &[u8; SORT_KEY_LEN]) -> Self {
        let mut physical = [0u8; 8];
        physical.copy_from_slice(&key[0..8]);
        let mut logical = [0u8; 4];
        logical.copy_from_slice(&key[8..12]);
        let mut node = [0u8; 32];
        node.copy_from_slice(&key[12..44]);
        Self {
            physical_ns: u64::from_be_bytes(physical),
            logical: u32::from_be_bytes(logical),
            node: NodeId(node),
        }
    }
}

impl fmt::Debug for HlcTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Hlc({}.{}@{})",
            self.physical_ns,
            self.logical,
            hex::encode(&self.node.0[..4])
        )
    }
}

/// `pppppppppppppppp-llllllll-<64 hex node>`: fixed width, so string order
/// equals timestamp order.
impl fmt::Display for HlcTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:016x}-{:08x}-{}",
            self.physical_ns, self.logical, self.node
        )
    }
}

impl FromStr for HlcTimestamp {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '-');
        let (Some(physical), Some(logical), Some(node)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(TypesError::MalformedTimestamp(s.to_string()));
        };
        if physical.len() != 16 || logical.len() != 8 {
            return Err(TypesError::MalformedTimestamp(s.to_string()));
        }
        let physical_ns = u64::from_str_radix(physical, 16)
            .map_err(|e| TypesError::MalformedTimestamp(e.to_string()))?;
        let logical = u32::from_str_radix(logical, 16)
            .map_err(|e| TypesError::MalformedTimestamp(e.to_string()))?;
        let node = NodeId(decode_fixed::<32>(node)?);
        Ok(Self {
            physical_ns,
            logical,
            node,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(physical_ns: u64, logical: u32, node: u8) -> HlcTimestamp {
        HlcTimestamp::new(physical_ns, logical, NodeId([node; 32]))
    }

    #[test]
    fn physical_dominates_ordering() {
        assert!(ts(100, 9, 9) < ts(101, 0, 0));
    }

    #[test]
    fn logical_breaks_physical_ties() {
        assert!(ts(100, 1, 9) < ts(100, 2, 0));
    }

    #[test]
    fn node_breaks_full_clock_ties() {
        assert!(ts(100, 1, 1) < ts(100, 1, 2));
        assert_eq!(ts(100, 1, 1).cmp_clock(&ts(100, 1, 2)), Ordering::Equal);
    }

    #[test]
    fn sort_key_round_trips() {
        let original = ts(0x0102_0304_0506_0708, 42, 0xEE);
        assert_eq!(HlcTimestamp::from_sort_key(&original.to_sort_key()), original);
    }

    #[test]
    fn display_is_fixed_width_and_parses() {
        let original = ts(150, 3, 0xAB);
        let rendered = original.to_string();
        assert_eq!(rendered.len(), 16 + 1 + 8 + 1 + 64);
        assert_eq!(rendered.parse::<HlcTimestamp>().unwrap(), original);
    }

    #[test]
    fn malformed_string_is_rejected() {
        assert!("12-34".parse::<HlcTimestamp>().is_err());
        assert!("zz".parse::<HlcTimestamp>().is_err());
    }
}
