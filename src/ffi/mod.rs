//! This module is the Foreign Function Interface (FFI) layer.
//!
//! It handles the "impedance mismatch" between a C-style host and the safe
//! `Processor` API: raw handles, raw pointers with separate lengths, and plain
//! integer status codes.
//!
//! * `boundary` holds the adapters, generic over the engine, so they can be
//!   exercised against any `TokenizerEngine`.
//! * `exports` instantiates them with the SentencePiece engine under the symbol
//!   names existing hosts link against.
//! * `logging` lets a host switch on the crate's log output.

//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod boundary;
pub mod logging;

#[cfg(feature = "sentencepiece")]
pub mod exports;


//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use self::boundary::ProcessorHandle;
pub use self::logging::enable_verbose_logging;
