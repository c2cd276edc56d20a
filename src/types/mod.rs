//! This module defines the plain-data types that travel between the engine,
//! the processor and the foreign boundary.
//!
//! It includes the byte span of a piece (and its packed boundary form), and the
//! special-token ids reported by a model load.

pub mod span;
pub mod special_tokens;

// Re-export the main type(s) for easier access.
pub use span::{SpanWord, TokenSpan};
pub use special_tokens::{ModelPreset, SpecialTokens};
