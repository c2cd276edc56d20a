//! A deterministic engine with a pinned vocabulary, used by the tests.
//!
//! It splits on ASCII whitespace, prefixes every word with the word-start
//! marker and then takes the longest vocabulary match, falling back to `<unk>`
//! one character at a time. That is enough to exercise every boundary path
//! without a real model file.

use std::cell::Cell;
use std::path::Path;

use hashbrown::HashMap;

use super::{Piece, TokenizerEngine};
use crate::error::WrapperError;
use crate::status::StatusCode;
use crate::types::special_tokens::NO_TOKEN;
use crate::types::{SpecialTokens, TokenSpan};

/// The only model file name the fixture accepts.
pub const FIXTURE_MODEL: &str = "fixture.model";
/// A model file name the fixture reports as corrupt.
pub const BROKEN_MODEL: &str = "broken.model";

pub const VOCAB_SIZE: i32 = 8000;
pub const PAD: i32 = 0;
pub const BOS: i32 = 1;
pub const EOS: i32 = 2;
pub const UNK: i32 = 3;

const WORD_START: char = '\u{2581}';
const UNK_SURFACE: &str = " \u{2047} ";

const PIECES: &[(&str, i32)] = &[
    ("<pad>", PAD),
    ("<s>", BOS),
    ("</s>", EOS),
    ("<unk>", UNK),
    ("\u{2581}", 4),
    ("\u{2581}he", 13),
    ("\u{2581}w", 20),
    ("or", 21),
    ("ld", 22),
    ("\u{2581}the", 30),
    ("\u{2581}a", 31),
    ("b", 32),
    ("c", 33),
    ("\u{e9}", 34),
    ("\u{2581}caf", 35),
    ("llo", 45),
];

struct Vocab {
    by_piece: HashMap<&'static str, i32>,
    by_id: HashMap<i32, &'static str>,
    longest: usize,
}

impl Vocab {
    fn pinned() -> Self {
        Self {
            by_piece: PIECES.iter().copied().collect(),
            by_id: PIECES.iter().map(|&(piece, id)| (id, piece)).collect(),
            longest: PIECES
                .iter()
                .map(|(piece, _)| piece.chars().count())
                .max()
                .unwrap_or(1),
        }
    }
}

#[derive(Default)]
pub struct FixtureEngine {
    vocab: Option<Vocab>,
    calls: Cell<usize>,
}

impl FixtureEngine {
    /// An engine that already has the pinned vocabulary loaded.
    pub fn loaded() -> Self {
        Self {
            vocab: Some(Vocab::pinned()),
            calls: Cell::new(0),
        }
    }

    /// How many encode/decode calls reached the engine.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn vocab(&self) -> Result<&Vocab, WrapperError> {
        self.calls.set(self.calls.get() + 1);
        self.model()
    }

    /// Vocabulary lookups are not counted as calls.
    fn model(&self) -> Result<&Vocab, WrapperError> {
        self.vocab.as_ref().ok_or_else(|| {
            WrapperError::engine(StatusCode::FailedPrecondition, "Model is not initialized.")
        })
    }
}

impl TokenizerEngine for FixtureEngine {
    fn load(&mut self, path: &Path) -> Result<(), WrapperError> {
        match path.file_name().and_then(|name| name.to_str()) {
            Some(FIXTURE_MODEL) => {
                self.vocab = Some(Vocab::pinned());
                Ok(())
            }
            Some(BROKEN_MODEL) => Err(WrapperError::engine(
                StatusCode::Internal,
                "Model file is broken.",
            )),
            _ => Err(WrapperError::engine(
                StatusCode::NotFound,
                format!("{}: No such file or directory", path.display()),
            )),
        }
    }

    fn encode(&self, text: &[u8]) -> Result<Vec<Piece>, WrapperError> {
        let vocab = self.vocab()?;
        let text = std::str::from_utf8(text)
            .map_err(|e| WrapperError::engine(StatusCode::InvalidArgument, e.to_string()))?;

        let mut pieces = Vec::new();
        for word in text.split_ascii_whitespace() {
            let start = (word.as_ptr() as usize - text.as_ptr() as usize) as u32;

            // (char, begin, end) with the marker occupying no source bytes.
            let mut units = vec![(WORD_START, start, start)];
            units.extend(word.char_indices().map(|(i, c)| {
                let begin = start + i as u32;
                (c, begin, begin + c.len_utf8() as u32)
            }));

            let mut i = 0;
            while i < units.len() {
                let longest = (i + vocab.longest).min(units.len());
                let matched = (i + 1..=longest).rev().find_map(|j| {
                    let candidate: String = units[i..j].iter().map(|u| u.0).collect();
                    vocab.by_piece.get(candidate.as_str()).map(|&id| (j, id, candidate))
                });

                let (j, id, piece) =
                    matched.unwrap_or_else(|| (i + 1, UNK, units[i].0.to_string()));
                pieces.push(Piece {
                    id,
                    piece,
                    span: TokenSpan::new(units[i].1, units[j - 1].2),
                });
                i = j;
            }
        }
        Ok(pieces)
    }

    fn piece_to_id(&self, piece: &str) -> Result<Option<i32>, WrapperError> {
        Ok(self.model()?.by_piece.get(piece).copied())
    }

    fn decode(&self, ids: &[i32]) -> Result<String, WrapperError> {
        let vocab = self.vocab()?;

        let mut text = String::new();
        for &id in ids {
            let out_of_range = || {
                WrapperError::engine(
                    StatusCode::OutOfRange,
                    format!("Invalid id: {id}. must be in the range [0, {VOCAB_SIZE})."),
                )
            };
            match id {
                PAD | BOS | EOS => {}
                UNK => text.push_str(UNK_SURFACE),
                _ if !(0..VOCAB_SIZE).contains(&id) => return Err(out_of_range()),
                _ => text.push_str(vocab.by_id.get(&id).ok_or_else(out_of_range)?),
            }
        }

        let text = text.replace(WORD_START, " ");
        Ok(text.strip_prefix(' ').map(str::to_owned).unwrap_or(text))
    }

    fn special_tokens(&self) -> SpecialTokens {
        if self.vocab.is_none() {
            return SpecialTokens::default();
        }
        SpecialTokens {
            bos: BOS,
            eos: EOS,
            pad: PAD,
            unk: UNK,
            mask: NO_TOKEN,
            vocab_size: VOCAB_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_segments_hello() {
        let engine = FixtureEngine::loaded();
        let pieces = engine.encode(b"hello").unwrap();
        let ids: Vec<i32> = pieces.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![13, 45]);
        assert_eq!(pieces[0].span, TokenSpan::new(0, 2));
        assert_eq!(pieces[1].span, TokenSpan::new(2, 5));
        assert_eq!(engine.decode(&ids).unwrap(), "hello");
    }

    #[test]
    fn test_fixture_unknown_characters() {
        let engine = FixtureEngine::loaded();
        let pieces = engine.encode("x".as_bytes()).unwrap();
        assert_eq!(pieces[0].id, 4);
        assert!(pieces[0].span.is_empty());
        assert_eq!(pieces[1].id, UNK);
        assert_eq!(pieces[1].piece, "x");
    }

    #[test]
    fn test_fixture_piece_lookup() {
        let engine = FixtureEngine::loaded();
        assert_eq!(engine.piece_to_id("llo").unwrap(), Some(45));
        assert_eq!(engine.piece_to_id("</s>").unwrap(), Some(EOS));
        assert_eq!(engine.piece_to_id("nope").unwrap(), None);
        assert_eq!(engine.calls(), 0);

        let err = FixtureEngine::default().piece_to_id("llo").unwrap_err();
        assert_eq!(err.status(), StatusCode::FailedPrecondition);
    }
}
