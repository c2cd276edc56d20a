// In: src/ffi/boundary.rs

//! Raw-pointer adapters between a C-style host and `Processor<E>`.
//!
//! Contract shared by every adapter:
//!
//! * Outputs are written through out-pointers; a null out-pointer is skipped.
//! * A negative capacity, or a null output buffer, counts as capacity 0.
//! * On an engine failure the length outputs are set to 0, the output buffers
//!   are left untouched and the engine's status is returned.
//! * Lengths that do not fit an `i32` saturate at `i32::MAX`.
//! * A panic never unwinds into the host; it is reported as `Internal`.
//!
//! Using a handle after `dispose`, or disposing twice, is undefined behaviour.

use std::ffi::{c_char, c_void, CStr};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use log::{error, trace};

use crate::engine::TokenizerEngine;
use crate::error::WrapperError;
use crate::processor::Processor;
use crate::status::StatusCode;
use crate::types::SpanWord;

/// An opaque processor reference handed to the host.
pub type ProcessorHandle = *mut c_void;

//==================================================================================
// 1. Lifecycle
//==================================================================================

/// Allocates an unloaded processor and leaks it into a handle.
pub fn create<E: TokenizerEngine + Default>() -> ProcessorHandle {
    let handle = Box::into_raw(Box::new(Processor::<E>::new())).cast::<c_void>();
    trace!("created processor {handle:p}");
    handle
}

/// Releases a processor created by [`create`] with the same engine type.
/// A null handle is ignored.
///
/// # Safety
/// `handle` must be null or a live handle from `create::<E>()` that is not used
/// again afterwards.
pub unsafe fn dispose<E: TokenizerEngine>(handle: ProcessorHandle) {
    if handle.is_null() {
        return;
    }
    trace!("disposing processor {handle:p}");
    drop(Box::from_raw(handle.cast::<Processor<E>>()));
}

//==================================================================================
// 2. Model Loading
//==================================================================================

/// Loads a model from a NUL-terminated UTF-8 path. The five id outputs are
/// written only on success.
///
/// # Safety
/// `handle` must be a live handle from `create::<E>()`, not used concurrently.
/// `path` must be null or a valid NUL-terminated string. Each out-pointer must
/// be null or valid for a write.
#[allow(clippy::too_many_arguments)]
pub unsafe fn load_model<E: TokenizerEngine>(
    handle: ProcessorHandle,
    path: *const c_char,
    bos: *mut i32,
    eos: *mut i32,
    pad: *mut i32,
    unk: *mut i32,
    vocab_size: *mut i32,
) -> i32 {
    guarded(|| {
        let loaded = processor_mut::<E>(handle).and_then(|processor| {
            let path = model_path(path)?;
            processor.load(path)
        });

        match loaded {
            Ok(tokens) => {
                write_out(bos, tokens.bos);
                write_out(eos, tokens.eos);
                write_out(pad, tokens.pad);
                write_out(unk, tokens.unk);
                write_out(vocab_size, tokens.vocab_size);
                StatusCode::Ok.code()
            }
            Err(err) => err.status().code(),
        }
    })
}

//==================================================================================
// 3. Encode / Decode
//==================================================================================

/// Encodes text into `ids[capacity]` and packed `spans[capacity]`.
///
/// # Safety
/// `handle` must be a live handle from `create::<E>()`. `input` must be valid
/// for `input_len` bytes (or null with length 0). `ids` and `spans` must each be
/// null or valid for `capacity` writes. `length` must be null or valid for a
/// write.
pub unsafe fn encode_as_spans<E: TokenizerEngine>(
    handle: ProcessorHandle,
    input: *const c_char,
    input_len: i32,
    ids: *mut i32,
    spans: *mut u64,
    capacity: i32,
    length: *mut i32,
) -> i32 {
    guarded(|| {
        let outcome = processor_ref::<E>(handle).and_then(|processor| {
            let text = input_slice(input.cast::<u8>(), input_len)?;
            let ids = output_slice(ids, capacity);
            let words: &mut [SpanWord] = bytemuck::cast_slice_mut(output_slice(spans, capacity));
            processor.encode_as_spans(text, ids, words)
        });
        finish(outcome.map(|negotiated| negotiated.required), length)
    })
}

/// Encodes text into `output[capacity]` ids.
///
/// # Safety
/// As for [`encode_as_spans`], with `output` in place of `ids`/`spans`.
pub unsafe fn encode_as_ids<E: TokenizerEngine>(
    handle: ProcessorHandle,
    input: *const c_char,
    input_len: i32,
    output: *mut i32,
    capacity: i32,
    length: *mut i32,
) -> i32 {
    guarded(|| {
        let outcome = processor_ref::<E>(handle).and_then(|processor| {
            let text = input_slice(input.cast::<u8>(), input_len)?;
            processor.encode_as_ids(text, output_slice(output, capacity))
        });
        finish(outcome.map(|negotiated| negotiated.required), length)
    })
}

/// Encodes text into space-joined pieces in `output[capacity]`.
///
/// Unlike the other operations this one may leave a partial prefix in
/// `output` when it runs out of room; `number_of_tokens` is then 0.
///
/// # Safety
/// As for [`encode_as_ids`]; `number_of_tokens` must be null or valid for a
/// write.
pub unsafe fn encode_as_pieces<E: TokenizerEngine>(
    handle: ProcessorHandle,
    input: *const c_char,
    input_len: i32,
    output: *mut c_char,
    capacity: i32,
    length: *mut i32,
    number_of_tokens: *mut i32,
) -> i32 {
    guarded(|| {
        let outcome = processor_ref::<E>(handle).and_then(|processor| {
            let text = input_slice(input.cast::<u8>(), input_len)?;
            processor.encode_as_pieces(text, output_slice(output.cast::<u8>(), capacity))
        });

        match outcome {
            Ok(joined) => {
                write_out(number_of_tokens, to_c_len(joined.number_of_tokens));
                finish(Ok(joined.length), length)
            }
            Err(err) => {
                write_out(number_of_tokens, 0);
                finish(Err(err), length)
            }
        }
    })
}

/// Decodes `ids[count]` into UTF-8 bytes in `output[capacity]`.
///
/// # Safety
/// `handle` must be a live handle from `create::<E>()`. `ids` must be valid for
/// `count` reads (or null with count 0). `output` must be null or valid for
/// `capacity` writes. `length` must be null or valid for a write.
pub unsafe fn decode_ids<E: TokenizerEngine>(
    handle: ProcessorHandle,
    ids: *const i32,
    count: i32,
    output: *mut c_char,
    capacity: i32,
    length: *mut i32,
) -> i32 {
    guarded(|| {
        let outcome = processor_ref::<E>(handle).and_then(|processor| {
            let ids = input_slice(ids, count)?;
            processor.decode_ids(ids, output_slice(output.cast::<u8>(), capacity))
        });
        finish(outcome.map(|negotiated| negotiated.required), length)
    })
}

//==================================================================================
// 4. Private Helpers
//==================================================================================

/// Runs an adapter body, turning a panic into `Internal`.
fn guarded(body: impl FnOnce() -> i32) -> i32 {
    panic::catch_unwind(AssertUnwindSafe(body)).unwrap_or_else(|_| {
        error!("panic caught at the foreign boundary");
        StatusCode::Internal.code()
    })
}

/// Writes the length output and produces the status for a call.
unsafe fn finish(outcome: Result<usize, WrapperError>, length: *mut i32) -> i32 {
    match outcome {
        Ok(required) => {
            write_out(length, to_c_len(required));
            StatusCode::Ok.code()
        }
        Err(err) => {
            write_out(length, 0);
            err.status().code()
        }
    }
}

unsafe fn processor_ref<'a, E>(handle: ProcessorHandle) -> Result<&'a Processor<E>, WrapperError> {
    handle
        .cast::<Processor<E>>()
        .as_ref()
        .ok_or_else(|| WrapperError::InvalidArgument("null processor handle".to_string()))
}

unsafe fn processor_mut<'a, E>(
    handle: ProcessorHandle,
) -> Result<&'a mut Processor<E>, WrapperError> {
    handle
        .cast::<Processor<E>>()
        .as_mut()
        .ok_or_else(|| WrapperError::InvalidArgument("null processor handle".to_string()))
}

unsafe fn model_path<'a>(path: *const c_char) -> Result<&'a Path, WrapperError> {
    if path.is_null() {
        return Err(WrapperError::InvalidArgument("null model path".to_string()));
    }
    let path = CStr::from_ptr(path).to_str()?;
    Ok(Path::new(path))
}

/// Borrows a caller input array. Null is accepted only with length 0.
unsafe fn input_slice<'a, T>(ptr: *const T, len: i32) -> Result<&'a [T], WrapperError> {
    let len = usize::try_from(len)
        .map_err(|_| WrapperError::InvalidArgument(format!("negative input length {len}")))?;
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(WrapperError::InvalidArgument(format!(
            "null input with length {len}"
        )));
    }
    Ok(std::slice::from_raw_parts(ptr, len))
}

/// Borrows a caller output buffer of `capacity` elements.
unsafe fn output_slice<'a, T>(ptr: *mut T, capacity: i32) -> &'a mut [T] {
    match usize::try_from(capacity) {
        Ok(capacity) if capacity > 0 && !ptr.is_null() => {
            std::slice::from_raw_parts_mut(ptr, capacity)
        }
        _ => &mut [],
    }
}

unsafe fn write_out<T>(ptr: *mut T, value: T) {
    if let Some(slot) = ptr.as_mut() {
        *slot = value;
    }
}

fn to_c_len(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}
