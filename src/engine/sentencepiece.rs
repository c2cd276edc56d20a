//! The production engine: a thin adapter over the `sentencepiece` crate.
//!
//! The adapter only converts types (u32 ids to the boundary's i32, engine
//! errors to `StatusCode`s). Tokenization, normalization and model parsing are
//! all done by the SentencePiece library.

use std::path::Path;

use log::trace;
use sentencepiece::{SentencePieceError, SentencePieceProcessor};

use super::{Piece, TokenizerEngine};
use crate::error::WrapperError;
use crate::status::StatusCode;
use crate::types::special_tokens::NO_TOKEN;
use crate::types::{SpecialTokens, TokenSpan};

/// A SentencePiece processor that may not have a model yet.
#[derive(Default)]
pub struct SentencePieceEngine {
    inner: Option<SentencePieceProcessor>,
}

impl SentencePieceEngine {
    fn loaded(&self) -> Result<&SentencePieceProcessor, WrapperError> {
        self.inner.as_ref().ok_or_else(|| {
            WrapperError::engine(StatusCode::FailedPrecondition, "Model is not initialized.")
        })
    }
}

impl TokenizerEngine for SentencePieceEngine {
    fn load(&mut self, path: &Path) -> Result<(), WrapperError> {
        let processor = SentencePieceProcessor::open(path).map_err(engine_error)?;
        trace!("sentencepiece model opened: {} pieces", processor.len());
        self.inner = Some(processor);
        Ok(())
    }

    fn encode(&self, text: &[u8]) -> Result<Vec<Piece>, WrapperError> {
        let processor = self.loaded()?;
        let text = std::str::from_utf8(text)
            .map_err(|e| WrapperError::engine(StatusCode::InvalidArgument, e.to_string()))?;

        processor
            .encode(text)
            .map_err(engine_error)?
            .into_iter()
            .map(|p| {
                Ok(Piece {
                    id: to_boundary_id(p.id)?,
                    piece: p.piece,
                    span: TokenSpan::new(p.span.0, p.span.1),
                })
            })
            .collect()
    }

    fn piece_to_id(&self, piece: &str) -> Result<Option<i32>, WrapperError> {
        let id = self.loaded()?.piece_to_id(piece).map_err(engine_error)?;
        id.map(to_boundary_id).transpose()
    }

    fn decode(&self, ids: &[i32]) -> Result<String, WrapperError> {
        let processor = self.loaded()?;
        let vocab_size = processor.len();

        let engine_ids = ids
            .iter()
            .map(|&id| {
                u32::try_from(id)
                    .ok()
                    .filter(|&id| (id as usize) < vocab_size)
                    .ok_or_else(|| {
                        WrapperError::engine(
                            StatusCode::OutOfRange,
                            format!("Invalid id: {id}. must be in the range [0, {vocab_size})."),
                        )
                    })
            })
            .collect::<Result<Vec<u32>, _>>()?;

        processor.decode_piece_ids(&engine_ids).map_err(engine_error)
    }

    fn special_tokens(&self) -> SpecialTokens {
        let Some(processor) = self.inner.as_ref() else {
            return SpecialTokens::default();
        };
        let optional =
            |id: Option<u32>| id.and_then(|id| i32::try_from(id).ok()).unwrap_or(NO_TOKEN);

        SpecialTokens {
            bos: optional(processor.bos_id()),
            eos: optional(processor.eos_id()),
            pad: optional(processor.pad_id()),
            unk: i32::try_from(processor.unk_id()).unwrap_or(NO_TOKEN),
            mask: NO_TOKEN,
            vocab_size: i32::try_from(processor.len()).unwrap_or(i32::MAX),
        }
    }
}

fn to_boundary_id(id: u32) -> Result<i32, WrapperError> {
    i32::try_from(id).map_err(|_| {
        WrapperError::engine(
            StatusCode::OutOfRange,
            format!("Engine id {id} does not fit the boundary id type"),
        )
    })
}

/// Maps a `sentencepiece` error onto the engine's status enumeration.
fn engine_error(err: SentencePieceError) -> WrapperError {
    let code = match &err {
        // The C library's codes share their names with `StatusCode`.
        SentencePieceError::CError(code) => {
            StatusCode::from_name(&format!("{code:?}")).unwrap_or(StatusCode::Unknown)
        }
        SentencePieceError::FilenameContainsNul(_) => StatusCode::InvalidArgument,
        _ => StatusCode::Internal,
    };
    WrapperError::engine(code, err.to_string())
}
