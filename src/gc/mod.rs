//! Primitive heap operations a host collector builds on: mark bitmaps and bump allocation.
//!
//! Nothing here decides when to collect or how pages are organised; callers hand in views of
//! memory they own and these functions read or update it in place.

pub mod bump;
pub mod mark;

pub use bump::try_bump;
pub use mark::{read_mark, write_mark, MarkSlot, PageGeometry};
