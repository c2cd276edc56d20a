// In: src/marian.rs

//! Marian (OPUS-MT) models ship a SentencePiece model for segmentation and a
//! separate JSON vocabulary that assigns the ids the translation model was
//! trained on. `MarianTokenizer` segments with the base `Tokenizer` and then
//! translates every engine id into the vocabulary's id space.
//!
//! The translation table is built once at construction: each vocabulary piece
//! is looked up in the engine, and engine ids without a vocabulary entry (or
//! that belong to the engine's own control pieces) map to `<unk>`.

use std::fs;
use std::path::Path;

use hashbrown::HashMap;
use log::debug;
use serde::Deserialize;

use crate::config::WrapperConfig;
use crate::engine::TokenizerEngine;
use crate::error::WrapperError;
use crate::status::StatusCode;
use crate::tokenizer::Tokenizer;
use crate::types::special_tokens::NO_TOKEN;
use crate::types::TokenSpan;

const WORD_START: char = '\u{2581}';

/// A Marian `vocab.json`: piece → model id.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct MarianVocab(HashMap<String, i64>);

impl MarianVocab {
    pub fn from_json_str(json: &str) -> Result<Self, WrapperError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, WrapperError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn required(&self, piece: &str) -> Result<i64, WrapperError> {
        self.0.get(piece).copied().ok_or_else(|| {
            WrapperError::InvalidArgument(format!("vocabulary has no {piece} entry"))
        })
    }
}

/// A SentencePiece tokenizer whose ids follow a Marian vocabulary.
pub struct MarianTokenizer<E> {
    base: Tokenizer<E>,
    id_to_piece: HashMap<i64, String>,
    base_to_marian: Vec<i64>,
    unk: i64,
    eos: i64,
    pad: i64,
    vocab_size: usize,
}

impl<E: TokenizerEngine + Default> MarianTokenizer<E> {
    /// Loads the SentencePiece `model` and the JSON vocabulary at `vocab`.
    pub fn open(model: &Path, vocab: &Path, config: WrapperConfig) -> Result<Self, WrapperError> {
        let base = Tokenizer::open(model, config)?;
        Self::from_tokenizer(base, MarianVocab::from_file(vocab)?)
    }
}

impl<E: TokenizerEngine> MarianTokenizer<E> {
    /// Builds the id translation table for an already opened tokenizer.
    ///
    /// The vocabulary must define `<unk>`, `</s>` and `<pad>`, and no id may be
    /// negative; otherwise this fails with `InvalidArgument`.
    pub fn from_tokenizer(base: Tokenizer<E>, vocab: MarianVocab) -> Result<Self, WrapperError> {
        if let Some((piece, id)) = vocab.0.iter().find(|(_, id)| **id < 0) {
            return Err(WrapperError::InvalidArgument(format!(
                "vocabulary id {id} for {piece} is negative"
            )));
        }
        let unk = vocab.required("<unk>")?;
        let eos = vocab.required("</s>")?;
        let pad = vocab.required("<pad>")?;

        // The engine's own control pieces never carry over.
        let engine = base.processor().special_tokens().ok_or_else(|| {
            WrapperError::engine(StatusCode::FailedPrecondition, "Model is not initialized.")
        })?;
        let control = [engine.bos, engine.eos, engine.pad, engine.unk];

        let mut base_to_marian = vec![unk; usize::try_from(engine.vocab_size).unwrap_or(0)];
        let mut mapped = 0usize;
        for (piece, &id) in &vocab.0 {
            let Some(base_id) = base.processor().engine().piece_to_id(piece)? else {
                continue;
            };
            if control.contains(&base_id) {
                continue;
            }
            if let Some(slot) = usize::try_from(base_id)
                .ok()
                .and_then(|index| base_to_marian.get_mut(index))
            {
                *slot = id;
                mapped += 1;
            }
        }
        debug!(
            "marian vocabulary: {} entries, {} mapped onto {} engine ids",
            vocab.len(),
            mapped,
            base_to_marian.len()
        );

        let vocab_size = vocab.len();
        let id_to_piece = vocab.0.into_iter().map(|(piece, id)| (id, piece)).collect();
        Ok(Self {
            base,
            id_to_piece,
            base_to_marian,
            unk,
            eos,
            pad,
            vocab_size,
        })
    }

    pub fn base(&self) -> &Tokenizer<E> {
        &self.base
    }

    pub fn unk(&self) -> i64 {
        self.unk
    }

    pub fn eos(&self) -> i64 {
        self.eos
    }

    pub fn pad(&self) -> i64 {
        self.pad
    }

    /// Marian models have no begin-of-sentence token.
    pub fn bos(&self) -> i64 {
        NO_TOKEN.into()
    }

    pub fn mask(&self) -> i64 {
        NO_TOKEN.into()
    }

    /// The number of vocabulary entries.
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    fn translate(&self, base_id: i32) -> i64 {
        usize::try_from(base_id)
            .ok()
            .and_then(|index| self.base_to_marian.get(index))
            .copied()
            .unwrap_or(self.unk)
    }

    //==============================================================================
    // Encoding
    //==============================================================================

    /// Encodes `text` into vocabulary ids framed by `prefix` and `suffix`. The
    /// framing is applied even when the text encodes to nothing.
    pub fn encode_to_ids(
        &self,
        text: &str,
        prefix: &[i64],
        suffix: &[i64],
    ) -> Result<Vec<i64>, WrapperError> {
        self.encode_utf8_to_ids(text.as_bytes(), prefix, suffix)
    }

    pub fn encode_utf8_to_ids(
        &self,
        utf8: &[u8],
        prefix: &[i64],
        suffix: &[i64],
    ) -> Result<Vec<i64>, WrapperError> {
        let base_ids = self.base.encode_utf8_to_ids(utf8, &[], &[])?;

        let mut ids = Vec::with_capacity(prefix.len() + base_ids.len() + suffix.len());
        ids.extend_from_slice(prefix);
        ids.extend(base_ids.into_iter().map(|id| self.translate(id)));
        ids.extend_from_slice(suffix);
        Ok(ids)
    }

    pub fn encode_to_spans(
        &self,
        utf8: &[u8],
    ) -> Result<(Vec<i64>, Vec<TokenSpan>), WrapperError> {
        let (base_ids, spans) = self.base.encode_to_spans(utf8)?;
        let ids = base_ids.into_iter().map(|id| self.translate(id)).collect();
        Ok((ids, spans))
    }

    /// Piece strings come straight from the engine.
    pub fn encode_to_strings(&self, text: &str) -> Result<Vec<String>, WrapperError> {
        self.base.encode_to_strings(text)
    }

    //==============================================================================
    // Decoding
    //==============================================================================

    /// The vocabulary piece for `id`, verbatim. Ids the vocabulary does not
    /// define fail with `OutOfRange`.
    pub fn decode_one(&self, id: i64) -> Result<&str, WrapperError> {
        self.id_to_piece.get(&id).map(String::as_str).ok_or_else(|| {
            WrapperError::engine(
                StatusCode::OutOfRange,
                format!("Invalid id: {id}. vocabulary has {} entries.", self.vocab_size),
            )
        })
    }

    /// Joins vocabulary pieces into text. A word-start marker becomes a space,
    /// except at the very beginning. Special pieces are kept as written.
    pub fn decode(&self, ids: &[i64]) -> Result<String, WrapperError> {
        let mut text = String::with_capacity(ids.len() * 4);
        for &id in ids {
            let piece = self.decode_one(id)?;
            match piece.strip_prefix(WORD_START) {
                Some(word) => {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(word);
                }
                None => text.push_str(piece),
            }
        }
        Ok(text)
    }

    pub fn decode_spans(&self, spans: &[TokenSpan], utf8: &[u8]) -> String {
        self.base.decode_spans(spans, utf8)
    }
}
