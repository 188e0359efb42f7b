//! Payload received from a client in its single read.

use bytes::Bytes;
use std::str::Utf8Error;

/// Raw bytes from one receive call. No framing is applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    data: Bytes,
}

impl Message {
    pub fn new(data: Bytes) -> Self {
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// True when the peer closed without sending anything.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decode as UTF-8. Malformed input is an error, not replaced.
    pub fn text(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(self.as_bytes())
    }
}
