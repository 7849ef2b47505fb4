//! Mark bits packed into the bitmap at the start of each heap page.
//!
//! A page of size `P` begins with a bitmap of `P * B / PTR_SIZE²` bytes (`B` bits per object),
//! padded up to [`ALIGN`](crate::constants::ALIGN). Objects fill the rest of the page. An
//! object's mark is the `B` bits at bit offset `(addr - object_start) * B / PTR_SIZE`, stored as
//! word `bit_offset / PTR_SIZE` of the bitmap at shift `bit_offset % PTR_SIZE`.

use crate::{
    constants::{ALIGN, MAX_MARK_BITS, PTR_SIZE},
    error::HeapError,
    value::view::{Extent, RawView},
};
use tracing::trace;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PageGeometry {
    page_size: usize,
    bit_count: u32,
}

/// Where a mark lives: the address of its bitmap word and the shift inside that word.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MarkSlot {
    pub word: usize,
    pub shift: u32,
}

impl PageGeometry {
    pub fn new(page_size: usize, bit_count: u32) -> Result<Self, HeapError> {
        if !page_size.is_power_of_two() {
            return Err(HeapError::PageSize(page_size));
        }
        if bit_count > MAX_MARK_BITS {
            return Err(HeapError::BitCount(bit_count));
        }
        if page_size.checked_mul(bit_count as usize).is_none() {
            return Err(HeapError::PageSize(page_size));
        }
        Ok(Self {
            page_size,
            bit_count,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn bit_count(&self) -> u32 {
        self.bit_count
    }

    /// Bitmap size in bytes, before padding.
    pub fn bitmap_size(&self) -> usize {
        self.page_size * self.bit_count as usize / (PTR_SIZE * PTR_SIZE)
    }

    /// Start of the page (and of its bitmap) containing `addr`.
    pub fn page_base(&self, addr: usize) -> usize {
        addr & !(self.page_size - 1)
    }

    /// First object address of the page containing `addr`.
    pub fn object_start(&self, addr: usize) -> usize {
        let end = self.page_base(addr) + self.bitmap_size();
        end.wrapping_add(end.wrapping_neg() % ALIGN)
    }

    pub fn mask(&self) -> usize {
        if self.bit_count >= usize::BITS {
            usize::MAX
        } else {
            (1 << self.bit_count) - 1
        }
    }

    pub fn locate(&self, addr: usize) -> MarkSlot {
        let base = self.page_base(addr);
        let start = self.object_start(addr);

        #[cfg(feature = "memory-validation")]
        if addr < start {
            panic!(
                "address {:#x} lies inside the mark bitmap of page {:#x} (objects start at {:#x})",
                addr, base, start
            );
        }

        let bit_offset = addr
            .wrapping_sub(start)
            .wrapping_mul(self.bit_count as usize)
            / PTR_SIZE;
        MarkSlot {
            word: base.wrapping_add((bit_offset / PTR_SIZE) * PTR_SIZE),
            shift: (bit_offset % PTR_SIZE) as u32,
        }
    }

    /// # Safety
    ///
    /// `object` must lie in a page of this geometry whose bitmap word for it is readable.
    pub unsafe fn read(&self, object: RawView) -> usize {
        if self.bit_count == 0 {
            return 0;
        }
        let slot = self.locate(object.addr());
        let word = unsafe { RawView::from_addr(slot.word, Extent::Unknown).read_word(0) };
        (word >> slot.shift) & self.mask()
    }

    /// # Safety
    ///
    /// `object` must lie in a page of this geometry whose bitmap word for it is writable.
    pub unsafe fn write(&self, object: RawView, mark: usize) {
        if self.bit_count == 0 {
            return;
        }
        let slot = self.locate(object.addr());
        trace!(
            "mark {:?} = {:#x} (word {:#x}, shift {})",
            object,
            mark,
            slot.word,
            slot.shift
        );
        let bitmap = RawView::from_addr(slot.word, Extent::Unknown);
        let mask = self.mask();
        unsafe {
            let word = bitmap.read_word(0) & !(mask << slot.shift);
            bitmap.write_word(0, word | ((mark & mask) << slot.shift));
        }
    }
}

/// Reads the mark of `object`.
///
/// # Safety
///
/// See [`PageGeometry::read`].
pub unsafe fn read_mark(
    object: RawView,
    page_size: usize,
    bit_count: u32,
) -> Result<usize, HeapError> {
    let geometry = PageGeometry::new(page_size, bit_count)?;
    Ok(unsafe { geometry.read(object) })
}

/// Overwrites the mark of `object`. Bits of `mark` above `bit_count` are dropped.
///
/// # Safety
///
/// See [`PageGeometry::write`].
pub unsafe fn write_mark(
    object: RawView,
    mark: usize,
    page_size: usize,
    bit_count: u32,
) -> Result<(), HeapError> {
    let geometry = PageGeometry::new(page_size, bit_count)?;
    unsafe { geometry.write(object, mark) };
    Ok(())
}
