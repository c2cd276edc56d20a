//! Shifts token ids by a constant offset.
//!
//! HuggingFace exports of SentencePiece models number their vocabulary one
//! higher than the raw engine does (they reserve id 0 themselves), so engine ids
//! have to be shifted by `HF_ID_OFFSET` before they can be fed to such a model.
//! All kernels are panic-free: overflow is reported, never wrapped.

use num_traits::PrimInt;

use crate::error::WrapperError;

/// The offset between raw engine ids and HuggingFace ids.
pub const HF_ID_OFFSET: i32 = 1;

//==================================================================================
// 1. Public API
//==================================================================================

/// Writes `input[i] + offset` into `target[i]` for every input element.
///
/// `target` may be longer than `input`; the extra elements are left untouched.
pub fn add_offset<T>(input: &[T], offset: T, target: &mut [T]) -> Result<(), WrapperError>
where
    T: PrimInt,
{
    if target.len() < input.len() {
        return Err(WrapperError::BufferMismatch(input.len(), target.len()));
    }
    // Check everything first so a failure leaves `target` untouched.
    let shifted = input
        .iter()
        .map(|&id| shift(id, offset))
        .collect::<Result<Vec<T>, _>>()?;
    target[..shifted.len()].copy_from_slice(&shifted);
    Ok(())
}

/// Shifts every element of `ids` by `offset` **in-place**.
pub fn add_offset_in_place<T>(ids: &mut [T], offset: T) -> Result<(), WrapperError>
where
    T: PrimInt,
{
    if let Some(&id) = ids.iter().find(|&&id| id.checked_add(&offset).is_none()) {
        return Err(overflow(id, offset));
    }
    for id in ids.iter_mut() {
        *id = *id + offset;
    }
    Ok(())
}

/// Widens engine ids to `i64` and shifts them to HuggingFace numbering. This
/// cannot overflow.
pub fn widen_with_offset(ids: &[i32]) -> Vec<i64> {
    ids.iter()
        .map(|&id| i64::from(id) + i64::from(HF_ID_OFFSET))
        .collect()
}

//==================================================================================
// 2. Private Helpers
//==================================================================================

fn shift<T: PrimInt>(id: T, offset: T) -> Result<T, WrapperError> {
    id.checked_add(&offset).ok_or_else(|| overflow(id, offset))
}

fn overflow<T: PrimInt>(id: T, offset: T) -> WrapperError {
    WrapperError::InvalidArgument(format!(
        "id {} shifted by {} overflows",
        id.to_i128().unwrap_or_default(),
        offset.to_i128().unwrap_or_default()
    ))
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_offset_into_longer_target() {
        let ids = [13, 45, 0];
        let mut target = [-7i32; 4];

        add_offset(&ids, HF_ID_OFFSET, &mut target).unwrap();

        assert_eq!(target, [14, 46, 1, -7]);
    }

    #[test]
    fn test_add_offset_short_target_error() {
        let ids = [1u32, 2, 3];
        let mut target = [0u32; 2];
        let result = add_offset(&ids, 1, &mut target);
        assert!(matches!(result, Err(WrapperError::BufferMismatch(3, 2))));
        assert_eq!(target, [0, 0]);
    }

    #[test]
    fn test_overflow_is_reported_and_nothing_is_written() {
        let mut ids = [1i32, i32::MAX];
        assert!(add_offset_in_place(&mut ids, 1).is_err());
        assert_eq!(ids, [1, i32::MAX]);

        let mut target = [0i32; 2];
        assert!(add_offset(&ids, 1, &mut target).is_err());
        assert_eq!(target, [0, 0]);
    }

    #[test]
    fn test_in_place_and_negative_offset() {
        let mut ids = vec![14i64, 46, 1];
        add_offset_in_place(&mut ids, -1).unwrap();
        assert_eq!(ids, vec![13, 45, 0]);
    }

    #[test]
    fn test_widen_with_offset() {
        assert_eq!(widen_with_offset(&[13, 45, i32::MAX]), vec![14, 46, 2_147_483_648]);
        assert!(widen_with_offset(&[]).is_empty());
    }
}
