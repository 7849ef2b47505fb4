use crate::{
    constants::{checked_align_up, TAG_MASK, TAG_POINTER},
    error::HeapError,
    value::view::{Extent, RawView},
};
use tracing::trace;

/// Tries to carve `size` bytes off a bump region.
///
/// `pos` and `limit` each point at a word: the tagged allocation cursor and the end of the
/// region. When `*pos + size` would pass `*limit`, returns `Ok(None)` and touches nothing.
/// Otherwise the cursor is advanced by `size` rounded up to [`ALIGN`](crate::constants::ALIGN)
/// and a view of `size` bytes at the untagged pre-advance address is returned.
///
/// # Safety
///
/// `pos` and `limit` must each be valid for a word-sized read, and `pos` for a write.
pub unsafe fn try_bump(
    pos: RawView,
    limit: RawView,
    size: usize,
) -> Result<Option<RawView>, HeapError> {
    let (current, end) = unsafe { (pos.read_word(0), limit.read_word(0)) };
    match current.checked_add(size) {
        Some(next) if next <= end => {}
        _ => return Ok(None),
    }
    let Some(advanced) = checked_align_up(size).and_then(|step| current.checked_add(step)) else {
        return Ok(None);
    };

    if current & TAG_MASK != TAG_POINTER {
        #[cfg(feature = "memory-validation")]
        tracing::warn!("bump cursor at {:?} holds untagged {:#x}", pos, current);
        return Err(HeapError::UntaggedBumpPointer(current));
    }

    trace!("bump {:#x} -> {:#x} for {} bytes", current, advanced, size);
    unsafe { pos.write_word(0, advanced) };
    Ok(Some(RawView::from_addr(
        current ^ TAG_POINTER,
        Extent::Known(size),
    )))
}
