//! Shared System Exclusive buffer
//!
//! SysEx payloads travel through the inbound queue and out to backends without
//! copying, so the bytes live behind an `Arc`. Input longer than
//! [`MAX_SYSEX_LEN`] is truncated at construction.

use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Largest SysEx buffer accepted, in bytes
pub const MAX_SYSEX_LEN: usize = 2048;

/// Reference-counted SysEx bytes, F0 .. F7 framing included
#[derive(Clone, PartialEq, Eq)]
pub struct SysEx(Arc<[u8]>);

impl SysEx {
    /// Copy `bytes` into a new shared buffer, truncating to [`MAX_SYSEX_LEN`]
    pub fn new(bytes: &[u8]) -> Self {
        let bytes = if bytes.len() > MAX_SYSEX_LEN {
            warn!(
                "SysEx of {} bytes exceeds {} byte buffer, truncating",
                bytes.len(),
                MAX_SYSEX_LEN
            );
            &bytes[..MAX_SYSEX_LEN]
        } else {
            bytes
        };
        Self(Arc::from(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the buffer starts with F0 and ends with F7
    pub fn is_terminated(&self) -> bool {
        self.0.len() >= 2 && self.0[0] == 0xF0 && self.0[self.0.len() - 1] == 0xF7
    }
}

impl fmt::Debug for SysEx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SysEx({} bytes)", self.0.len())
    }
}
