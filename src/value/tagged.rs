use crate::{
    constants::{SMI_MASK, TAG_MASK, TAG_POINTER, TAG_SHIFT, TAG_SMI},
    error::HeapError,
    value::view::{Extent, RawView},
};
use gc_arena::{unsafe_empty_collect, Collect};

/// A value as it exists on the host side of a tagged word.
#[derive(Copy, Clone, Debug)]
pub enum TaggedValue {
    Pointer(RawView),
    Integer(i64),
}
unsafe_empty_collect!(TaggedValue);

impl TaggedValue {
    /// Encodes into a word, enforcing the small-integer range.
    pub fn encode(self) -> Result<usize, HeapError> {
        match self {
            Self::Pointer(view) => tag_pointer(view.addr()),
            Self::Integer(n) => {
                if n.unsigned_abs() > SMI_MASK as u64 {
                    return Err(HeapError::SmiOverflow(n));
                }
                Ok(((n as isize) << TAG_SHIFT) as usize)
            }
        }
    }

    /// Encodes into a word for a native call. Integers are shifted without a range check and
    /// wrap if they do not fit.
    pub fn encode_unchecked(self) -> Result<usize, HeapError> {
        match self {
            Self::Pointer(view) => tag_pointer(view.addr()),
            Self::Integer(n) => Ok((n as isize).wrapping_shl(TAG_SHIFT) as usize),
        }
    }

    /// Decodes a word read from the heap. Pointers come back with an unknown extent.
    pub fn decode(word: usize) -> Result<Self, HeapError> {
        if word & TAG_MASK == TAG_SMI {
            let n = (word as isize) >> TAG_SHIFT;
            if n.unsigned_abs() > SMI_MASK {
                return Err(HeapError::InvalidUntaggedNumber(word));
            }
            return Ok(Self::Integer(n as i64));
        }
        Ok(Self::Pointer(RawView::from_addr(
            word ^ TAG_POINTER,
            Extent::Unknown,
        )))
    }

    /// Decodes a native call's return word. The integer range is not checked.
    pub fn decode_unchecked(word: usize) -> Self {
        if word & TAG_MASK == TAG_POINTER {
            Self::Pointer(RawView::from_addr(word ^ TAG_POINTER, Extent::Unknown))
        } else {
            Self::Integer(((word as isize) >> TAG_SHIFT) as i64)
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Pointer(_) => None,
        }
    }

    pub fn as_pointer(&self) -> Option<RawView> {
        match self {
            Self::Pointer(v) => Some(*v),
            Self::Integer(_) => None,
        }
    }
}

impl From<RawView> for TaggedValue {
    fn from(view: RawView) -> Self {
        Self::Pointer(view)
    }
}

impl From<i64> for TaggedValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

/// Sets the pointer tag on `addr`, which must not already carry it.
#[inline]
pub fn tag_pointer(addr: usize) -> Result<usize, HeapError> {
    if addr & TAG_MASK == TAG_POINTER {
        return Err(HeapError::UnalignedPointer(addr));
    }
    Ok(addr | TAG_POINTER)
}

/// Writes `value` as a tagged word at `offset` bytes into `dst`.
///
/// # Safety
///
/// `dst.addr() + offset` must be valid for a word-sized write.
pub unsafe fn write_tagged(
    dst: RawView,
    value: TaggedValue,
    offset: usize,
) -> Result<(), HeapError> {
    let word = value.encode()?;
    unsafe { dst.write_word(offset, word) };
    Ok(())
}

/// Reads the tagged word at `offset` bytes into `src`.
///
/// # Safety
///
/// `src.addr() + offset` must be valid for a word-sized read.
pub unsafe fn read_tagged(src: RawView, offset: usize) -> Result<TaggedValue, HeapError> {
    let word = unsafe { src.read_word(offset) };
    TaggedValue::decode(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::PTR_SIZE, value::view::is_same};

    #[test]
    fn test_smi_round_trip() {
        let mut words = [0usize; 2];
        let view = RawView::from_words(&mut words);
        for n in [0, 1, 42, 0x1234_5678, SMI_MASK as i64, -1, -(SMI_MASK as i64)] {
            unsafe {
                write_tagged(view, TaggedValue::Integer(n), PTR_SIZE).unwrap();
                let back = read_tagged(view, PTR_SIZE).unwrap();
                assert_eq!(back.as_integer(), Some(n));
            }
        }
        assert_eq!(words[1], ((-(SMI_MASK as isize)) << 1) as usize);
    }

    #[test]
    fn test_smi_overflow_leaves_memory_untouched() {
        let mut words = [0x55usize];
        let view = RawView::from_words(&mut words);
        let err = unsafe { write_tagged(view, TaggedValue::Integer(SMI_MASK as i64 + 1), 0) };
        assert_eq!(err, Err(HeapError::SmiOverflow(SMI_MASK as i64 + 1)));
        assert_eq!(words[0], 0x55);
    }

    #[test]
    fn test_pointer_round_trip() {
        let mut target = [0usize; 4];
        let target_view = RawView::from_words(&mut target);
        let mut slot = [0usize];
        let slot_view = RawView::from_words(&mut slot);
        unsafe {
            write_tagged(slot_view, target_view.into(), 0).unwrap();
            assert_eq!(slot[0], target_view.addr() | TAG_POINTER);
            let back = read_tagged(slot_view, 0).unwrap().as_pointer().unwrap();
            assert!(is_same(back, target_view));
            assert_eq!(back.extent(), Extent::Unknown);
        }
    }

    #[test]
    fn test_unaligned_pointer_rejected() {
        let mut words = [0usize; 2];
        let view = RawView::from_words(&mut words);
        let odd = RawView::new(view.as_ptr().wrapping_add(1), 1);
        let err = unsafe { write_tagged(view, odd.into(), 0) };
        assert_eq!(err, Err(HeapError::UnalignedPointer(odd.addr())));
        assert_eq!(words, [0, 0]);
    }

    #[test]
    fn test_invalid_untagged_number() {
        let word = (SMI_MASK + 1) << TAG_SHIFT;
        assert_eq!(
            TaggedValue::decode(word).unwrap_err(),
            HeapError::InvalidUntaggedNumber(word)
        );
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_unchecked_encoding_skips_range_check() {
        let big = TaggedValue::Integer(SMI_MASK as i64 * 4);
        assert!(big.encode().is_err());
        let word = big.encode_unchecked().unwrap();
        assert_eq!(TaggedValue::decode_unchecked(word).as_integer(), Some(SMI_MASK as i64 * 4));
    }
}
