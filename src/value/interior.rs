//! Untagged `base + offset` pointers to fields inside an object.

use crate::value::view::{Extent, RawView};

/// Stores `src + interior_offset` at `offset` bytes into `dst`. No tag is applied.
///
/// # Safety
///
/// `dst.addr() + offset` must be valid for a word-sized write.
pub unsafe fn write_interior(dst: RawView, src: RawView, offset: usize, interior_offset: isize) {
    let word = src.addr().wrapping_add_signed(interior_offset);
    unsafe { dst.write_word(offset, word) };
}

/// Reads an interior pointer at `offset` bytes into `src` and returns a view of its base.
///
/// # Safety
///
/// `src.addr() + offset` must be valid for a word-sized read.
pub unsafe fn read_interior(src: RawView, offset: usize, interior_offset: isize) -> RawView {
    let word = unsafe { src.read_word(offset) };
    RawView::from_addr(
        word.wrapping_add_signed(interior_offset.wrapping_neg()),
        Extent::Unknown,
    )
}
