// In: src/ffi/exports.rs

//! The C symbols of the shared library, backed by the SentencePiece engine.
//!
//! Each export forwards to the matching adapter in [`super::boundary`]; see that
//! module for the buffer and status contract.

use std::ffi::{c_char, c_int, c_void};

use super::boundary;
use crate::engine::SentencePieceEngine;

type Engine = SentencePieceEngine;

#[export_name = "CreateProcessor"]
pub extern "C" fn create_processor() -> *mut c_void {
    boundary::create::<Engine>()
}

/// # Safety
/// See [`boundary::dispose`].
#[export_name = "DisposeProcessor"]
pub unsafe extern "C" fn dispose_processor(handle: *mut c_void) {
    boundary::dispose::<Engine>(handle)
}

/// # Safety
/// See [`boundary::load_model`].
#[export_name = "LoadModel"]
pub unsafe extern "C" fn load_model(
    handle: *mut c_void,
    path: *const c_char,
    bos: *mut c_int,
    eos: *mut c_int,
    pad: *mut c_int,
    unk: *mut c_int,
    size: *mut c_int,
) -> c_int {
    boundary::load_model::<Engine>(handle, path, bos, eos, pad, unk, size)
}

/// # Safety
/// See [`boundary::encode_as_spans`].
#[export_name = "EncodeAsSpans"]
pub unsafe extern "C" fn encode_as_spans(
    handle: *mut c_void,
    input: *const c_char,
    input_len: c_int,
    ids: *mut c_int,
    spans: *mut u64,
    capacity: c_int,
    length: *mut c_int,
) -> c_int {
    boundary::encode_as_spans::<Engine>(handle, input, input_len, ids, spans, capacity, length)
}

/// # Safety
/// See [`boundary::encode_as_ids`].
#[export_name = "EncodeAsIds"]
pub unsafe extern "C" fn encode_as_ids(
    handle: *mut c_void,
    input: *const c_char,
    input_len: c_int,
    output: *mut c_int,
    capacity: c_int,
    length: *mut c_int,
) -> c_int {
    boundary::encode_as_ids::<Engine>(handle, input, input_len, output, capacity, length)
}

/// # Safety
/// See [`boundary::encode_as_pieces`].
#[export_name = "EncodeAsPieces"]
pub unsafe extern "C" fn encode_as_pieces(
    handle: *mut c_void,
    input: *const c_char,
    input_len: c_int,
    output: *mut c_char,
    capacity: c_int,
    length: *mut c_int,
    number_of_tokens: *mut c_int,
) -> c_int {
    boundary::encode_as_pieces::<Engine>(
        handle,
        input,
        input_len,
        output,
        capacity,
        length,
        number_of_tokens,
    )
}

/// # Safety
/// See [`boundary::decode_ids`].
#[export_name = "DecodeIds"]
pub unsafe extern "C" fn decode_ids(
    handle: *mut c_void,
    ids: *const c_int,
    count: c_int,
    output: *mut c_char,
    capacity: c_int,
    length: *mut c_int,
) -> c_int {
    boundary::decode_ids::<Engine>(handle, ids, count, output, capacity, length)
}
