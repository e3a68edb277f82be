//! Request payload building

use bytes::{BufMut, Bytes, BytesMut};

use crate::{constants::FS, text};

/// Builds an FS-separated request payload
///
/// Every field is CP866 text terminated by FS. Empty fields are placeholders
/// the register expects in fixed positions, so they are written too.
///
/// # Examples
///
/// ```
/// use vikiprint_core::PayloadBuilder;
///
/// let payload = PayloadBuilder::new()
///     .field("5")
///     .empty()
///     .field("0")
///     .build();
///
/// assert_eq!(&payload[..], b"5\x1c\x1c0\x1c");
/// ```
#[derive(Debug, Default, Clone)]
pub struct PayloadBuilder {
    buf: BytesMut,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field followed by FS
    pub fn field(mut self, value: impl AsRef<str>) -> Self {
        self.buf.put_slice(&text::encode(value.as_ref()));
        self.buf.put_u8(FS);
        self
    }

    /// Append raw bytes followed by FS
    pub fn raw(mut self, value: &[u8]) -> Self {
        self.buf.put_slice(value);
        self.buf.put_u8(FS);
        self
    }

    /// Append text without a trailing FS
    pub fn text(mut self, value: impl AsRef<str>) -> Self {
        self.buf.put_slice(&text::encode(value.as_ref()));
        self
    }

    /// Append an empty placeholder field
    pub fn empty(mut self) -> Self {
        self.buf.put_u8(FS);
        self
    }

    /// Append `count` empty placeholder fields
    pub fn empties(mut self, count: usize) -> Self {
        for _ in 0..count {
            self.buf.put_u8(FS);
        }
        self
    }

    pub fn build(self) -> Bytes {
        self.buf.freeze()
    }
}
