//! This file is the root of the `spm_wrapper` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of the library so the Rust compiler
//!     knows they exist.
//! 2.  Re-exporting the types a Rust caller needs. The C symbols a foreign host
//!     links against live in `ffi`.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod config;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod kernels;
pub mod marian;
pub mod negotiation;
pub mod processor;
pub mod status;
pub mod tokenizer;
pub mod types;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use config::WrapperConfig;
pub use engine::{Piece, TokenizerEngine};
pub use error::WrapperError;
pub use marian::{MarianTokenizer, MarianVocab};
pub use processor::Processor;
pub use status::StatusCode;
pub use tokenizer::Tokenizer;
pub use types::{ModelPreset, SpanWord, SpecialTokens, TokenSpan};

#[cfg(feature = "sentencepiece")]
pub use engine::SentencePieceEngine;
