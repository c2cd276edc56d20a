//! Byte spans of pieces, and the packed 64-bit word used for them at the
//! foreign boundary.
//!
//! Only `SpanWord` knows the bit layout (`end` in the high half, `begin` in the
//! low half). Everything inside the crate works on `TokenSpan`.

use bytemuck::{Pod, Zeroable};
use std::ops::Range;

use crate::error::WrapperError;

/// A `[begin, end)` byte range into the UTF-8 text a piece was encoded from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct TokenSpan {
    pub begin: u32,
    /// Exclusive end offset; this is not the length.
    pub end: u32,
}

impl TokenSpan {
    pub const fn new(begin: u32, end: u32) -> Self {
        Self { begin, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.begin
    }

    pub fn range(&self) -> Range<usize> {
        self.begin as usize..self.end as usize
    }

    /// The bytes this span covers, or `None` if it does not lie inside `utf8`.
    pub fn slice<'a>(&self, utf8: &'a [u8]) -> Option<&'a [u8]> {
        if self.begin > self.end {
            return None;
        }
        utf8.get(self.range())
    }

    /// The text this span covers.
    pub fn as_str<'a>(&self, utf8: &'a [u8]) -> Result<&'a str, WrapperError> {
        let bytes = self.slice(utf8).ok_or_else(|| {
            WrapperError::InvalidArgument(format!(
                "span {}..{} lies outside a text of {} bytes",
                self.begin,
                self.end,
                utf8.len()
            ))
        })?;
        Ok(std::str::from_utf8(bytes)?)
    }
}

/// A `TokenSpan` packed into one `u64` for the boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct SpanWord(pub u64);

impl SpanWord {
    pub const fn pack(span: TokenSpan) -> Self {
        SpanWord(((span.end as u64) << 32) | span.begin as u64)
    }

    pub const fn unpack(self) -> TokenSpan {
        TokenSpan {
            begin: (self.0 & 0xFFFF_FFFF) as u32,
            end: ((self.0 >> 32) & 0xFFFF_FFFF) as u32,
        }
    }
}

impl From<TokenSpan> for SpanWord {
    fn from(span: TokenSpan) -> Self {
        SpanWord::pack(span)
    }
}

impl From<SpanWord> for TokenSpan {
    fn from(word: SpanWord) -> Self {
        word.unpack()
    }
}
