// In: src/tokenizer.rs

//! A safe, allocating tokenizer on top of `Processor`.
//!
//! This is the Rust-side caller of the query-then-fill protocol. Each operation
//! sizes its buffers from `WrapperConfig`, calls the processor once and, only if
//! the reported length did not fit, resizes to exactly that length and calls it
//! a second time. A second shortfall means the engine is not deterministic and
//! is reported as `NegotiationDiverged`.

use std::path::Path;

use log::trace;

use crate::config::WrapperConfig;
use crate::engine::TokenizerEngine;
use crate::error::WrapperError;
use crate::negotiation::{Negotiated, PIECE_SEPARATOR};
use crate::processor::Processor;
use crate::status::StatusCode;
use crate::types::{SpecialTokens, TokenSpan};

/// A loaded processor plus the special ids callers frame their input with.
pub struct Tokenizer<E> {
    processor: Processor<E>,
    special_tokens: SpecialTokens,
    config: WrapperConfig,
}

impl<E: TokenizerEngine + Default> Tokenizer<E> {
    /// Creates a processor and loads `model` into it.
    pub fn open(model: &Path, config: WrapperConfig) -> Result<Self, WrapperError> {
        let mut processor = Processor::new();
        processor.load(model)?;
        Self::from_processor(processor, config)
    }
}

impl<E: TokenizerEngine> Tokenizer<E> {
    /// Wraps an already loaded processor. An unloaded one is rejected with
    /// `FailedPrecondition`.
    pub fn from_processor(
        processor: Processor<E>,
        config: WrapperConfig,
    ) -> Result<Self, WrapperError> {
        let loaded = processor.special_tokens().ok_or_else(|| {
            WrapperError::engine(StatusCode::FailedPrecondition, "Model is not initialized.")
        })?;
        Ok(Self {
            special_tokens: config.preset.apply(loaded),
            processor,
            config,
        })
    }

    pub fn processor(&self) -> &Processor<E> {
        &self.processor
    }

    pub fn config(&self) -> &WrapperConfig {
        &self.config
    }

    pub fn special_tokens(&self) -> SpecialTokens {
        self.special_tokens
    }

    pub fn bos(&self) -> i32 {
        self.special_tokens.bos
    }

    pub fn eos(&self) -> i32 {
        self.special_tokens.eos
    }

    pub fn pad(&self) -> i32 {
        self.special_tokens.pad
    }

    pub fn unk(&self) -> i32 {
        self.special_tokens.unk
    }

    /// `-1` unless the configured preset defines a mask token.
    pub fn mask(&self) -> i32 {
        self.special_tokens.mask
    }

    pub fn vocab_size(&self) -> i32 {
        self.special_tokens.vocab_size
    }

    //==============================================================================
    // Encoding
    //==============================================================================

    /// Encodes `text` and frames the ids with `prefix` and `suffix` (usually
    /// `[bos]` and `[eos]`). Text that encodes to nothing yields an empty vector,
    /// without the framing.
    pub fn encode_to_ids(
        &self,
        text: &str,
        prefix: &[i32],
        suffix: &[i32],
    ) -> Result<Vec<i32>, WrapperError> {
        self.encode_utf8_to_ids(text.as_bytes(), prefix, suffix)
    }

    /// As [`Self::encode_to_ids`], for text that is already UTF-8 bytes.
    pub fn encode_utf8_to_ids(
        &self,
        utf8: &[u8],
        prefix: &[i32],
        suffix: &[i32],
    ) -> Result<Vec<i32>, WrapperError> {
        let mut ids = Vec::new();
        let count = negotiate_with_retry(self.config.id_capacity(utf8.len()), |capacity| {
            ids.resize(capacity, 0);
            self.processor.encode_as_ids(utf8, &mut ids)
        })?;

        if count == 0 {
            return Ok(Vec::new());
        }
        let mut framed = Vec::with_capacity(prefix.len() + count + suffix.len());
        framed.extend_from_slice(prefix);
        framed.extend_from_slice(&ids[..count]);
        framed.extend_from_slice(suffix);
        Ok(framed)
    }

    /// Encodes `text` into ids plus the byte span of each id in `utf8`.
    pub fn encode_to_spans(
        &self,
        utf8: &[u8],
    ) -> Result<(Vec<i32>, Vec<TokenSpan>), WrapperError> {
        let mut ids = Vec::new();
        let mut spans = Vec::new();
        let count = negotiate_with_retry(self.config.id_capacity(utf8.len()), |capacity| {
            ids.resize(capacity, 0);
            spans.resize(capacity, TokenSpan::default());
            self.processor.encode_as_spans(utf8, &mut ids, &mut spans)
        })?;

        ids.truncate(count);
        spans.truncate(count);
        Ok((ids, spans))
    }

    /// Encodes `text` into piece strings, word-start marker included. Mostly
    /// useful for debugging a vocabulary.
    pub fn encode_to_strings(&self, text: &str) -> Result<Vec<String>, WrapperError> {
        self.encode_utf8_to_strings(text.as_bytes())
    }

    pub fn encode_utf8_to_strings(&self, utf8: &[u8]) -> Result<Vec<String>, WrapperError> {
        let mut out = vec![0u8; self.config.piece_capacity(utf8.len())];
        let mut joined = self.processor.encode_as_pieces(utf8, &mut out)?;

        if !joined.complete {
            trace!(
                "pieces buffer of {} bytes too small, retrying with {}",
                out.len(),
                joined.length
            );
            let requested = joined.length;
            out.resize(requested, 0);
            joined = self.processor.encode_as_pieces(utf8, &mut out)?;
            if !joined.complete {
                return Err(WrapperError::NegotiationDiverged {
                    requested,
                    required: joined.length,
                });
            }
        }

        out[..joined.length]
            .split(|&byte| byte == PIECE_SEPARATOR)
            .take(joined.number_of_tokens)
            .map(|piece| String::from_utf8(piece.to_vec()).map_err(WrapperError::from))
            .collect()
    }

    //==============================================================================
    // Decoding
    //==============================================================================

    pub fn decode(&self, ids: &[i32]) -> Result<String, WrapperError> {
        let mut out = Vec::new();
        let length = negotiate_with_retry(self.config.decode_capacity(ids.len()), |capacity| {
            out.resize(capacity, 0);
            self.processor.decode_ids(ids, &mut out)
        })?;

        out.truncate(length);
        Ok(String::from_utf8(out)?)
    }

    pub fn decode_one(&self, id: i32) -> Result<String, WrapperError> {
        self.decode(&[id])
    }

    /// Concatenates the source text each span covers, without going through the
    /// engine. Unlike [`Self::decode`] the bytes come back exactly as they were
    /// in `utf8`, but text between spans is not included. Spans that do not lie
    /// inside `utf8` are skipped.
    pub fn decode_spans(&self, spans: &[TokenSpan], utf8: &[u8]) -> String {
        let mut text = String::with_capacity(spans.len() * 3);
        for bytes in spans.iter().filter_map(|span| span.slice(utf8)) {
            text.push_str(&String::from_utf8_lossy(bytes));
        }
        text
    }
}

/// Calls `attempt` with `first_capacity`, then once more with the reported
/// length if that did not fit. Returns the number of elements filled.
fn negotiate_with_retry<F>(first_capacity: usize, mut attempt: F) -> Result<usize, WrapperError>
where
    F: FnMut(usize) -> Result<Negotiated, WrapperError>,
{
    let first = attempt(first_capacity)?;
    if first.filled {
        return Ok(first.required);
    }

    trace!(
        "buffer of {} too small, retrying with {}",
        first_capacity,
        first.required
    );
    let second = attempt(first.required)?;
    if !second.filled {
        return Err(WrapperError::NegotiationDiverged {
            requested: first.required,
            required: second.required,
        });
    }
    Ok(second.required)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixture::{FixtureEngine, BOS, EOS, FIXTURE_MODEL};
    use crate::types::ModelPreset;

    fn open(config: WrapperConfig) -> Tokenizer<FixtureEngine> {
        Tokenizer::open(Path::new(FIXTURE_MODEL), config).unwrap()
    }

    /// Every first attempt is too small, so every call takes the retry path.
    fn tiny() -> WrapperConfig {
        WrapperConfig {
            min_capacity: 0,
            bytes_per_token: 1000,
            piece_bytes_factor: 0,
            decode_bytes_per_id: 0,
            ..WrapperConfig::default()
        }
    }

    #[test]
    fn test_open_reports_engine_ids() {
        let tokenizer = open(WrapperConfig::default());
        assert_eq!(
            (tokenizer.bos(), tokenizer.eos(), tokenizer.pad(), tokenizer.unk()),
            (1, 2, 0, 3)
        );
        assert_eq!(tokenizer.mask(), -1);
        assert_eq!(tokenizer.vocab_size(), 8000);
    }

    #[test]
    fn test_open_missing_model() {
        let result =
            Tokenizer::<FixtureEngine>::open(Path::new("missing.model"), WrapperConfig::default());
        assert_eq!(result.err().map(|e| e.status()), Some(StatusCode::NotFound));

        let unloaded = Processor::<FixtureEngine>::new();
        let result = Tokenizer::from_processor(unloaded, WrapperConfig::default());
        assert_eq!(
            result.err().map(|e| e.status()),
            Some(StatusCode::FailedPrecondition)
        );
    }

    #[test]
    fn test_xlm_roberta_preset() {
        let config = WrapperConfig {
            preset: ModelPreset::XlmRoberta,
            ..WrapperConfig::default()
        };
        let tokenizer = open(config);
        assert_eq!(
            (tokenizer.bos(), tokenizer.pad(), tokenizer.eos(), tokenizer.unk()),
            (0, 1, 2, 3)
        );
        assert_eq!(tokenizer.mask(), 250_001);
        assert_eq!(tokenizer.vocab_size(), 8000);
    }

    #[test]
    fn test_encode_to_ids_with_framing() {
        let tokenizer = open(WrapperConfig::default());

        let ids = tokenizer.encode_to_ids("hello", &[BOS], &[EOS]).unwrap();
        assert_eq!(ids, vec![BOS, 13, 45, EOS]);

        assert!(tokenizer.encode_to_ids("   ", &[BOS], &[EOS]).unwrap().is_empty());
        assert_eq!(tokenizer.processor().engine().calls(), 2);
    }

    #[test]
    fn test_small_first_guess_retries_once() {
        let tokenizer = open(tiny());

        let ids = tokenizer.encode_to_ids("hello world", &[], &[]).unwrap();
        assert_eq!(ids, vec![13, 45, 20, 21, 22]);
        assert_eq!(tokenizer.processor().engine().calls(), 2);

        assert_eq!(tokenizer.decode(&ids).unwrap(), "hello world");
        assert_eq!(tokenizer.processor().engine().calls(), 4);
    }

    #[test]
    fn test_encode_to_strings() {
        for config in [WrapperConfig::default(), tiny()] {
            let tokenizer = open(config);
            let pieces = tokenizer.encode_to_strings("hello world").unwrap();
            assert_eq!(pieces, vec!["\u{2581}he", "llo", "\u{2581}w", "or", "ld"]);
            assert!(tokenizer.encode_to_strings("").unwrap().is_empty());
        }
    }

    #[test]
    fn test_encode_to_spans_and_rebuild_text() {
        let tokenizer = open(tiny());
        let text = "hello   world";

        let (ids, spans) = tokenizer.encode_to_spans(text.as_bytes()).unwrap();

        assert_eq!(ids, vec![13, 45, 20, 21, 22]);
        assert_eq!(spans[0], TokenSpan::new(0, 2));
        assert_eq!(spans[4], TokenSpan::new(11, 13));
        // Spans skip the whitespace between words.
        assert_eq!(tokenizer.decode_spans(&spans, text.as_bytes()), "helloworld");
        assert_eq!(tokenizer.decode(&ids).unwrap(), "hello world");
    }

    #[test]
    fn test_decode_spans_skips_foreign_spans() {
        let tokenizer = open(WrapperConfig::default());
        let spans = [TokenSpan::new(0, 2), TokenSpan::new(4, 40), TokenSpan::new(2, 5)];
        assert_eq!(tokenizer.decode_spans(&spans, b"hello"), "hello");
    }

    #[test]
    fn test_decode_one_and_errors() {
        let tokenizer = open(WrapperConfig::default());
        assert_eq!(tokenizer.decode_one(13).unwrap(), "he");
        assert_eq!(tokenizer.decode_one(EOS).unwrap(), "");

        let err = tokenizer.decode(&[13, -1]).unwrap_err();
        assert_eq!(err.status(), StatusCode::OutOfRange);
    }

    #[test]
    fn test_retry_that_still_does_not_fit_diverges() {
        let mut calls = 0;
        let result = negotiate_with_retry(1, |capacity| {
            calls += 1;
            Ok(Negotiated {
                required: capacity + 1,
                filled: false,
            })
        });

        assert!(matches!(
            result,
            Err(WrapperError::NegotiationDiverged { requested: 2, required: 3 })
        ));
        assert_eq!(calls, 2);
    }
}
