//! Special-token ids reported by a successful model load.

use serde::{Deserialize, Serialize};

/// The id the engine reports for a special token the model does not define.
pub const NO_TOKEN: i32 = -1;

/// The fixed reserved ids of a loaded model plus its vocabulary size.
///
/// Set once per successful load; a later load replaces the whole value.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub bos: i32,
    pub eos: i32,
    pub pad: i32,
    pub unk: i32,
    /// Never reported by the engine; only a `ModelPreset` sets it.
    #[serde(default = "no_token")]
    pub mask: i32,
    pub vocab_size: i32,
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self {
            bos: NO_TOKEN,
            eos: NO_TOKEN,
            pad: NO_TOKEN,
            unk: NO_TOKEN,
            mask: NO_TOKEN,
            vocab_size: 0,
        }
    }
}

fn no_token() -> i32 {
    NO_TOKEN
}

/// Known model families whose published tokenizers use different special ids
/// than the ones stored in their SentencePiece model file.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelPreset {
    /// **Default:** use the ids exactly as the engine reports them.
    #[default]
    Engine,

    /// XLM-RoBERTa: `<s>`=0, `<pad>`=1, `</s>`=2, `<unk>`=3 and `<mask>`=250001.
    XlmRoberta,
}

impl ModelPreset {
    pub fn apply(self, tokens: SpecialTokens) -> SpecialTokens {
        match self {
            ModelPreset::Engine => tokens,
            ModelPreset::XlmRoberta => SpecialTokens {
                bos: 0,
                pad: 1,
                eos: 2,
                unk: 3,
                mask: 250_001,
                ..tokens
            },
        }
    }
}
