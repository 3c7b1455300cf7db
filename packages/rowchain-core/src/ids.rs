use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Width in bytes of every identifier handled by the engine.
pub const UID_LEN: usize = 16;

/// Globally unique, immutable identifier with an embedded creation time.
///
/// The first 8 bytes are the creation time as big-endian unix milliseconds and
/// the last 8 bytes a per-allocator sequence number, so lexicographic byte
/// order equals creation order. The bulk relink of legacy scopes depends on
/// that property.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Uid(pub [u8; UID_LEN]);

impl Uid {
    pub const fn from_parts(millis: u64, seq: u64) -> Self {
        let m = millis.to_be_bytes();
        let s = seq.to_be_bytes();
        Self([
            m[0], m[1], m[2], m[3], m[4], m[5], m[6], m[7], s[0], s[1], s[2], s[3], s[4], s[5],
            s[6], s[7],
        ])
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != UID_LEN {
            return Err(Error::Storage(format!(
                "expected {UID_LEN}-byte id, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; UID_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Creation time embedded in the id, as unix milliseconds.
    pub fn timestamp_millis(&self) -> u64 {
        let mut m = [0u8; 8];
        m.copy_from_slice(&self.0[..8]);
        u64::from_be_bytes(m)
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid(")?;
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

/// Monotonic [`Uid`] allocator.
///
/// The production allocator lives outside the engine; this one is the stand-in
/// used by embedding hosts and tests. Ids minted by a single generator are
/// strictly increasing even within one millisecond.
#[derive(Debug, Default)]
pub struct UidGen {
    last_millis: u64,
    seq: u64,
}

impl UidGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&mut self) -> Uid {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        if now > self.last_millis {
            self.last_millis = now;
            self.seq = 0;
        } else {
            self.seq += 1;
        }
        Uid::from_parts(self.last_millis, self.seq)
    }
}
