//! The joined-pieces writer used by encode-as-pieces.
//!
//! Pieces are appended one at a time, each followed by a single separator, and
//! capacity is checked per piece. Unlike `negotiate`, a buffer that runs out
//! partway keeps the pieces that were already copied. Existing hosts depend on
//! this exact behaviour, so it stays a separate, explicitly non-atomic routine.

/// Byte placed after every piece in the joined buffer.
pub const PIECE_SEPARATOR: u8 = b' ';

/// Outcome of writing joined pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Joined {
    /// When `complete`: bytes of joined text, not counting the trailing
    /// separator. Otherwise: the bytes every piece and its separator need, so
    /// a retry with `capacity >= length` succeeds.
    pub length: usize,
    /// Piece count when `complete`, `0` otherwise.
    pub number_of_tokens: usize,
    pub complete: bool,
}

/// Appends `pieces` to `out`, separated by `PIECE_SEPARATOR`.
///
/// A piece is only written if it and its separator fit behind everything
/// written so far. Once one piece does not fit, no later piece can.
pub fn write_joined<S: AsRef<[u8]>>(pieces: &[S], out: &mut [u8]) -> Joined {
    let mut total = 0usize;
    let mut complete = true;

    for piece in pieces {
        let bytes = piece.as_ref();
        let needed = total + bytes.len() + 1;
        if needed <= out.len() {
            out[total..total + bytes.len()].copy_from_slice(bytes);
            out[total + bytes.len()] = PIECE_SEPARATOR;
        } else {
            complete = false;
        }
        total = needed;
    }

    if complete {
        Joined {
            length: total.saturating_sub(1),
            number_of_tokens: pieces.len(),
            complete,
        }
    } else {
        Joined {
            length: total,
            number_of_tokens: 0,
            complete,
        }
    }
}
