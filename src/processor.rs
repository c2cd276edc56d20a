// In: src/processor.rs

//! The processor: an owned engine plus the special ids of its loaded model,
//! and the four encode/decode operations expressed over caller-owned buffers.
//!
//! Every operation calls the engine exactly once. An engine failure is returned
//! before capacity is looked at, and leaves the caller's buffers untouched.
//! Capacity insufficiency is not an error: it is reported through the returned
//! `Negotiated`/`Joined` value on an `Ok` result.

use std::path::Path;

use log::{debug, warn};

use crate::engine::TokenizerEngine;
use crate::error::WrapperError;
use crate::negotiation::{self, Joined, Negotiated, PieceSpans, Slice, SpanBuffers};
use crate::types::{SpecialTokens, TokenSpan};

/// An engine-owned tokenization resource.
///
/// Created without a model; `load` may be called any number of times. The
/// engine is released when the processor is dropped.
pub struct Processor<E> {
    engine: E,
    special_tokens: Option<SpecialTokens>,
}

impl<E: TokenizerEngine + Default> Processor<E> {
    pub fn new() -> Self {
        Self::with_engine(E::default())
    }
}

impl<E: TokenizerEngine + Default> Default for Processor<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: TokenizerEngine> Processor<E> {
    pub fn with_engine(engine: E) -> Self {
        Self {
            engine,
            special_tokens: None,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Special ids of the last successful load, if any.
    pub fn special_tokens(&self) -> Option<SpecialTokens> {
        self.special_tokens
    }

    /// Loads a model file. On failure the previously loaded model, if any,
    /// stays in place.
    pub fn load(&mut self, path: &Path) -> Result<SpecialTokens, WrapperError> {
        if let Err(err) = self.engine.load(path) {
            warn!("failed to load model {}: {}", path.display(), err);
            return Err(err);
        }

        let tokens = self.engine.special_tokens();
        debug!(
            "loaded model {} (vocab={}, bos={}, eos={}, pad={}, unk={})",
            path.display(),
            tokens.vocab_size,
            tokens.bos,
            tokens.eos,
            tokens.pad,
            tokens.unk
        );
        self.special_tokens = Some(tokens);
        Ok(tokens)
    }

    /// Encodes `text` into parallel id and span buffers.
    pub fn encode_as_spans<S: From<TokenSpan>>(
        &self,
        text: &[u8],
        ids: &mut [i32],
        spans: &mut [S],
    ) -> Result<Negotiated, WrapperError> {
        let pieces = self.engine.encode(text)?;
        Ok(negotiation::negotiate(
            &PieceSpans(&pieces),
            &mut SpanBuffers::new(ids, spans),
        ))
    }

    /// Encodes `text` into ids.
    pub fn encode_as_ids(&self, text: &[u8], out: &mut [i32]) -> Result<Negotiated, WrapperError> {
        let ids = self.engine.encode_ids(text)?;
        Ok(negotiation::negotiate(&Slice(&ids), out))
    }

    /// Encodes `text` into space-joined piece strings. This is the one
    /// operation that may leave a partial result in `out`; see
    /// [`negotiation::write_joined`].
    pub fn encode_as_pieces(&self, text: &[u8], out: &mut [u8]) -> Result<Joined, WrapperError> {
        let pieces = self.engine.encode_pieces(text)?;
        Ok(negotiation::write_joined(&pieces, out))
    }

    /// Decodes `ids` into UTF-8 bytes.
    pub fn decode_ids(&self, ids: &[i32], out: &mut [u8]) -> Result<Negotiated, WrapperError> {
        let text = self.engine.decode(ids)?;
        Ok(negotiation::negotiate(&Slice(text.as_bytes()), out))
    }
}
