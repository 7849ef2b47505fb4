use crate::constants::UNKNOWN_EXTENT_LEN;
use gc_arena::{unsafe_empty_collect, Collect};
use std::{
    ffi::c_void,
    fmt::{self, Debug, Formatter},
    ptr,
};
use tracing::trace;

/// How much memory a [`RawView`] is known to cover.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Extent {
    Known(usize),
    /// The view was decoded from a word; its real length is not recoverable.
    Unknown,
}

/// A non-owning `(address, extent)` view over memory owned by someone else.
///
/// This is the only place raw addresses are turned into loads, stores and code pointers.
/// Constructing a view is always safe; reading or writing through it is not, and nothing is
/// bounds-checked, not even against a [`Extent::Known`] length. Views never free what they
/// point at and may freely alias each other.
#[derive(Copy, Clone)]
pub struct RawView {
    ptr: *mut u8,
    extent: Extent,
}
unsafe_empty_collect!(RawView);

impl RawView {
    pub fn new(ptr: *mut u8, len: usize) -> Self {
        Self {
            ptr,
            extent: Extent::Known(len),
        }
    }

    pub fn unknown(ptr: *mut u8) -> Self {
        Self {
            ptr,
            extent: Extent::Unknown,
        }
    }

    pub fn from_addr(addr: usize, extent: Extent) -> Self {
        Self {
            ptr: addr as *mut u8,
            extent,
        }
    }

    pub fn from_slice(slice: &mut [u8]) -> Self {
        Self::new(slice.as_mut_ptr(), slice.len())
    }

    /// View over a word-typed buffer, for callers that need word alignment guarantees.
    pub fn from_words(words: &mut [usize]) -> Self {
        Self::new(
            words.as_mut_ptr() as *mut u8,
            std::mem::size_of_val(words),
        )
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr
    }

    #[inline]
    pub fn addr(&self) -> usize {
        self.ptr as usize
    }

    #[inline]
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// The verified length, if there is one.
    pub fn known_len(&self) -> Option<usize> {
        match self.extent {
            Extent::Known(len) => Some(len),
            Extent::Unknown => None,
        }
    }

    /// Length to report to a host that cannot represent [`Extent::Unknown`].
    pub fn len_hint(&self) -> usize {
        self.known_len().unwrap_or(UNKNOWN_EXTENT_LEN)
    }

    pub fn with_extent(self, extent: Extent) -> Self {
        Self { extent, ..self }
    }

    pub fn as_code_ptr(&self) -> *const c_void {
        self.ptr as *const c_void
    }

    /// # Safety
    ///
    /// `self.addr() + offset` must be valid for a word-sized read.
    #[inline]
    pub unsafe fn read_word(&self, offset: usize) -> usize {
        unsafe { ptr::read_unaligned(self.ptr.wrapping_add(offset) as *const usize) }
    }

    /// # Safety
    ///
    /// `self.addr() + offset` must be valid for a word-sized write, and no live Rust reference
    /// may cover those bytes.
    #[inline]
    pub unsafe fn write_word(&self, offset: usize, word: usize) {
        let target = self.ptr.wrapping_add(offset);
        trace!("write {:p} <- {:#x}", target, word);
        unsafe { ptr::write_unaligned(target as *mut usize, word) }
    }

    /// # Safety
    ///
    /// The extent must be accurate and the memory must stay valid and unmodified for `'a`.
    pub unsafe fn as_slice<'a>(&self) -> Option<&'a [u8]> {
        let len = self.known_len()?;
        if self.ptr.is_null() {
            return None;
        }
        Some(unsafe { std::slice::from_raw_parts(self.ptr, len) })
    }
}

impl Debug for RawView {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.extent {
            Extent::Known(len) => write!(f, "RawView({:p}, {len})", self.ptr),
            Extent::Unknown => write!(f, "RawView({:p}, ?)", self.ptr),
        }
    }
}

/// Whether two views start at the same address. Lengths are ignored.
#[inline]
pub fn is_same(a: RawView, b: RawView) -> bool {
    a.addr() == b.addr()
}
