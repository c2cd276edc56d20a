// In: src/config.rs

//! Configuration for the safe `Tokenizer` facade.
//!
//! The foreign boundary itself takes no configuration: every call carries its
//! own buffers. What the facade needs is a first guess at how large those
//! buffers should be, so that most calls succeed without a retry, plus the
//! special-id preset of the model family being loaded.
//!
//! `WrapperConfig` is created once (from defaults, a JSON string or a JSON file)
//! and handed to `Tokenizer::open`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::WrapperError;
use crate::types::ModelPreset;

/// Capacity heuristics and model preset used by the `Tokenizer` facade.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct WrapperConfig {
    /// The floor for every first-attempt buffer, in bytes. Id buffers use a
    /// quarter of it, since one id is four bytes.
    #[serde(default = "default_min_capacity")]
    pub min_capacity: usize,

    /// Expected UTF-8 bytes per token when sizing an id buffer.
    #[serde(default = "default_bytes_per_token")]
    pub bytes_per_token: usize,

    /// Joined-pieces buffer size as a multiple of the input size. Pieces can be
    /// longer than their source text because of the word-start marker.
    #[serde(default = "default_piece_bytes_factor")]
    pub piece_bytes_factor: usize,

    /// Expected decoded bytes per id.
    #[serde(default = "default_decode_bytes_per_id")]
    pub decode_bytes_per_id: usize,

    #[serde(default)]
    pub preset: ModelPreset,
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            min_capacity: default_min_capacity(),
            bytes_per_token: default_bytes_per_token(),
            piece_bytes_factor: default_piece_bytes_factor(),
            decode_bytes_per_id: default_decode_bytes_per_id(),
            preset: ModelPreset::default(),
        }
    }
}

impl WrapperConfig {
    pub fn from_json_str(json: &str) -> Result<Self, WrapperError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, WrapperError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// First-attempt id capacity for `text_len` bytes of input.
    pub fn id_capacity(&self, text_len: usize) -> usize {
        (self.min_capacity / 4).max(text_len / self.bytes_per_token.max(1))
    }

    /// First-attempt joined-pieces capacity, in bytes.
    pub fn piece_capacity(&self, text_len: usize) -> usize {
        self.min_capacity
            .max(text_len.saturating_mul(self.piece_bytes_factor))
    }

    /// First-attempt decode capacity, in bytes.
    pub fn decode_capacity(&self, id_count: usize) -> usize {
        self.min_capacity
            .max(id_count.saturating_mul(self.decode_bytes_per_id))
    }
}

fn default_min_capacity() -> usize {
    512
}

fn default_bytes_per_token() -> usize {
    3
}

fn default_piece_bytes_factor() -> usize {
    2
}

fn default_decode_bytes_per_id() -> usize {
    4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusCode;

    #[test]
    fn test_defaults() {
        let config = WrapperConfig::default();
        assert_eq!(config.min_capacity, 512);
        assert_eq!(config.preset, ModelPreset::Engine);

        assert_eq!(config.id_capacity(10), 128);
        assert_eq!(config.id_capacity(3000), 1000);
        assert_eq!(config.piece_capacity(10), 512);
        assert_eq!(config.piece_capacity(1000), 2000);
        assert_eq!(config.decode_capacity(2), 512);
        assert_eq!(config.decode_capacity(200), 800);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config =
            WrapperConfig::from_json_str(r#"{ "min_capacity": 8, "preset": "xlm_roberta" }"#)
                .unwrap();

        assert_eq!(config.min_capacity, 8);
        assert_eq!(config.bytes_per_token, 3);
        assert_eq!(config.preset, ModelPreset::XlmRoberta);
        assert_eq!(WrapperConfig::from_json_str("{}").unwrap(), WrapperConfig::default());
    }

    #[test]
    fn test_zero_bytes_per_token_does_not_divide_by_zero() {
        let config = WrapperConfig {
            bytes_per_token: 0,
            ..WrapperConfig::default()
        };
        assert_eq!(config.id_capacity(1000), 1000);
    }

    #[test]
    fn test_bad_config_sources() {
        let err = WrapperConfig::from_json_str(r#"{ "preset": "marian" }"#).unwrap_err();
        assert!(matches!(err, WrapperError::Config(_)));
        assert_eq!(err.status(), StatusCode::DataLoss);

        let err = WrapperConfig::from_file(Path::new("/nonexistent/spm-wrapper.json")).unwrap_err();
        assert_eq!(err.status(), StatusCode::NotFound);
    }
}
