//! Word-size and tagging constants shared with the host.
//!
//! Everything here is derived from the target's pointer width at compile time so the host can
//! mirror this layer's encoding exactly.

use std::mem::size_of;

/// Size of a machine word in bytes.
pub const PTR_SIZE: usize = size_of::<usize>();

/// `log2(PTR_SIZE)`.
pub const PTR_SHIFT: usize = if PTR_SIZE == 8 { 3 } else { 2 };

/// Allocation and bitmap padding granularity.
pub const ALIGN: usize = 2 * PTR_SIZE;

pub const TAG_SHIFT: u32 = 1;
pub const TAG_MASK: usize = (1 << TAG_SHIFT) - 1;
pub const TAG_POINTER: usize = 0x1;
pub const TAG_SMI: usize = 0x0;

/// Largest magnitude a small integer may have.
pub const SMI_MASK: usize = 0x7fff_ffff;

/// Length reported for views whose true extent cannot be recovered from a word.
pub const UNKNOWN_EXTENT_LEN: usize = 0x3fff_ffff;

/// Native calls take at most this many word-sized arguments.
pub const MAX_CALL_ARGS: usize = 7;

/// Widest mark that can never straddle two bitmap words: the shift inside a word is at most
/// `PTR_SIZE - 1`.
pub const MAX_MARK_BITS: u32 = usize::BITS - (PTR_SIZE as u32 - 1);

/// Constants under the names the host binding exports them as.
pub const HOST_CONSTANTS: [(&str, usize); 8] = [
    ("ptrSize", PTR_SIZE),
    ("ptrShift", PTR_SHIFT),
    ("align", ALIGN),
    ("tagShift", TAG_SHIFT as usize),
    ("tagMask", TAG_MASK),
    ("tagPointer", TAG_POINTER),
    ("tagSmi", TAG_SMI),
    ("smiMask", SMI_MASK),
];

/// Rounds `value` up to the next multiple of [`ALIGN`].
#[inline]
pub const fn align_up(value: usize) -> usize {
    match value % ALIGN {
        0 => value,
        rem => value + (ALIGN - rem),
    }
}

/// [`align_up`], or `None` when the rounded value does not fit in a `usize`.
#[inline]
pub const fn checked_align_up(value: usize) -> Option<usize> {
    match value % ALIGN {
        0 => Some(value),
        rem => value.checked_add(ALIGN - rem),
    }
}
