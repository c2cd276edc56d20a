// In: src/negotiation/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: Query-then-Fill
// ====================================================================================
//
// Every variable-length result crosses the boundary as a (buffer, capacity,
// length-out) triple. The callee never allocates for the caller. Instead:
//
//   1. The engine result is computed once per call.
//   2. The required length is always reported.
//   3. If the caller's capacity is large enough, the whole result is written.
//   4. Otherwise the caller's buffer is not touched at all, and the caller can
//      retry with a buffer of at least the reported length.
//
// `negotiate` is the single implementation of that contract. A `Payload`
// describes what a result needs and how it is written into a given target shape
// (a flat slice of ids or bytes, or the parallel id + span buffers).
//
// The joined-pieces result is the one exception: it is written piece by piece
// and may leave a partial prefix behind. It lives in `joined` and is not
// expressed through `Payload`.
// ====================================================================================

pub mod joined;

use crate::engine::Piece;
use crate::types::TokenSpan;

pub use joined::{write_joined, Joined, PIECE_SEPARATOR};

/// Outcome of one query-then-fill exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiated {
    /// Units the full result needs. Reported whether or not it fit.
    pub required: usize,
    /// Whether the target now holds the result.
    pub filled: bool,
}

/// A computed result that can be written into a target of shape `Target`.
pub trait Payload<Target: ?Sized> {
    /// Number of units (elements or bytes) the result needs.
    fn required_len(&self) -> usize;

    /// Number of units the target can hold.
    fn capacity_of(&self, target: &Target) -> usize;

    /// Writes the whole result into the front of the target.
    /// Only called when `required_len() <= capacity_of(target)`.
    fn fill(&self, target: &mut Target);
}

/// Writes `payload` into `target` if and only if it fits entirely.
pub fn negotiate<T, P>(payload: &P, target: &mut T) -> Negotiated
where
    T: ?Sized,
    P: Payload<T>,
{
    let required = payload.required_len();
    let filled = required <= payload.capacity_of(target);
    if filled {
        payload.fill(target);
    }
    Negotiated { required, filled }
}

//==================================================================================
// Payload shapes
//==================================================================================

/// A flat result: ids, or the bytes of decoded text.
pub struct Slice<'a, T>(pub &'a [T]);

impl<T: Copy> Payload<[T]> for Slice<'_, T> {
    fn required_len(&self) -> usize {
        self.0.len()
    }

    fn capacity_of(&self, target: &[T]) -> usize {
        target.len()
    }

    fn fill(&self, target: &mut [T]) {
        target[..self.0.len()].copy_from_slice(self.0);
    }
}

/// The two parallel caller buffers of an encode-as-spans call.
///
/// `S` is the span representation of the caller's buffer; the boundary uses
/// the packed `SpanWord`, Rust callers can use `TokenSpan` directly.
pub struct SpanBuffers<'a, S> {
    pub ids: &'a mut [i32],
    pub spans: &'a mut [S],
}

impl<'a, S> SpanBuffers<'a, S> {
    pub fn new(ids: &'a mut [i32], spans: &'a mut [S]) -> Self {
        Self { ids, spans }
    }
}

/// Encoded pieces, written as an id plus a span per piece.
pub struct PieceSpans<'a>(pub &'a [Piece]);

impl<S: From<TokenSpan>> Payload<SpanBuffers<'_, S>> for PieceSpans<'_> {
    fn required_len(&self) -> usize {
        self.0.len()
    }

    fn capacity_of(&self, target: &SpanBuffers<'_, S>) -> usize {
        target.ids.len().min(target.spans.len())
    }

    fn fill(&self, target: &mut SpanBuffers<'_, S>) {
        let slots = target.ids.iter_mut().zip(target.spans.iter_mut());
        for (piece, (id, span)) in self.0.iter().zip(slots) {
            *id = piece.id;
            *span = S::from(piece.span);
        }
    }
}
