// In: src/engine/mod.rs

//! The seam between this crate and the tokenization engine.
//!
//! The crate never tokenizes anything itself. Everything it needs from the engine
//! (loading a model, encoding text into pieces, decoding ids, looking up pieces
//! and reading the special ids) goes through `TokenizerEngine`. The production
//! implementation wraps the SentencePiece processor and is compiled with the
//! `sentencepiece` feature.

use std::path::Path;

use crate::error::WrapperError;
use crate::types::{SpecialTokens, TokenSpan};

#[cfg(feature = "sentencepiece")]
pub mod sentencepiece;

#[cfg(test)]
pub(crate) mod fixture;

#[cfg(feature = "sentencepiece")]
pub use self::sentencepiece::SentencePieceEngine;

/// One token of an encoded text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub id: i32,
    /// The UTF-8 surface form of the piece, including the word-start marker.
    pub piece: String,
    /// Where the piece came from in the input text.
    pub span: TokenSpan,
}

/// The capabilities the boundary consumes from a tokenization engine.
///
/// Failures are reported as `WrapperError::Engine` carrying the engine's own
/// status code. Calls on an engine that has no model loaded must fail rather
/// than return an empty result.
pub trait TokenizerEngine {
    /// Loads a model file, replacing any previously loaded model on success.
    fn load(&mut self, path: &Path) -> Result<(), WrapperError>;

    /// Encodes UTF-8 text into pieces with their byte spans.
    fn encode(&self, text: &[u8]) -> Result<Vec<Piece>, WrapperError>;

    /// Encodes UTF-8 text into ids only.
    fn encode_ids(&self, text: &[u8]) -> Result<Vec<i32>, WrapperError> {
        Ok(self.encode(text)?.into_iter().map(|p| p.id).collect())
    }

    /// Encodes UTF-8 text into piece strings only.
    fn encode_pieces(&self, text: &[u8]) -> Result<Vec<String>, WrapperError> {
        Ok(self.encode(text)?.into_iter().map(|p| p.piece).collect())
    }

    /// The id of a vocabulary piece, or `None` if the model has no such piece.
    fn piece_to_id(&self, piece: &str) -> Result<Option<i32>, WrapperError>;

    /// Decodes ids back into text.
    fn decode(&self, ids: &[i32]) -> Result<String, WrapperError>;

    /// Special ids and vocabulary size of the loaded model.
    fn special_tokens(&self) -> SpecialTokens;

    fn vocab_size(&self) -> i32 {
        self.special_tokens().vocab_size
    }
}
