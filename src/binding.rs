//! The surface a dynamically-typed host calls into.
//!
//! Hosts pass loosely-typed arguments; every operation checks the count and kind of its
//! arguments before touching memory and reports a usage string when they are wrong. Once
//! validated, calls go straight to the typed functions in [`crate::value`], [`crate::gc`] and
//! [`crate::native`].

use std::{fmt, str::FromStr};

use crate::{
    constants::HOST_CONSTANTS,
    error::HeapError,
    gc::{self, PageGeometry},
    native,
    value::{self, RawView, TaggedValue},
};

/// An argument or result as the host sees it.
#[derive(Clone, Debug)]
pub enum HostValue {
    Undefined,
    Bool(bool),
    Number(i64),
    View(RawView),
    Array(Vec<HostValue>),
}

impl HostValue {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_view(&self) -> Option<RawView> {
        match self {
            Self::View(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_false(&self) -> bool {
        matches!(self, Self::Bool(false))
    }
}

impl From<TaggedValue> for HostValue {
    fn from(value: TaggedValue) -> Self {
        match value {
            TaggedValue::Pointer(v) => Self::View(v),
            TaggedValue::Integer(n) => Self::Number(n),
        }
    }
}

impl From<RawView> for HostValue {
    fn from(view: RawView) -> Self {
        Self::View(view)
    }
}

impl From<i64> for HostValue {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    WriteTagged,
    ReadTagged,
    WriteInterior,
    ReadInterior,
    IsSame,
    ReadMark,
    WriteMark,
    Call,
    PointerAdd,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Self::WriteTagged,
        Self::ReadTagged,
        Self::WriteInterior,
        Self::ReadInterior,
        Self::IsSame,
        Self::ReadMark,
        Self::WriteMark,
        Self::Call,
        Self::PointerAdd,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::WriteTagged => "writeTagged",
            Self::ReadTagged => "readTagged",
            Self::WriteInterior => "writeInterior",
            Self::ReadInterior => "readInterior",
            Self::IsSame => "isSame",
            Self::ReadMark => "readMark",
            Self::WriteMark => "writeMark",
            Self::Call => "call",
            Self::PointerAdd => "pointerAdd",
        }
    }

    pub fn usage(self) -> &'static str {
        match self {
            Self::WriteTagged => "writeTagged(dst, src, off)",
            Self::ReadTagged => "readTagged(src, off)",
            Self::WriteInterior => "writeInterior(dst, src, off, ioff)",
            Self::ReadInterior => "readInterior(src, off, ioff)",
            Self::IsSame => "isSame(a, b)",
            Self::ReadMark => "readMark(obj, pageSize, bitCount)",
            Self::WriteMark => "writeMark(obj, mark, pageSize, bitCount)",
            Self::Call => "call(code, args)",
            Self::PointerAdd => "pointerAdd(pos, limit, size)",
        }
    }

    pub fn argument_error(self) -> HeapError {
        HeapError::Arguments {
            usage: self.usage(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| format!("unknown heap operation {s:?}"))
    }
}

/// The exported constants, under their host names.
pub fn constants() -> Vec<(&'static str, HostValue)> {
    HOST_CONSTANTS
        .iter()
        .map(|&(name, v)| (name, HostValue::Number(v as i64)))
        .collect()
}

/// Validates `args` for `op` and runs it.
///
/// # Safety
///
/// Every view passed in must satisfy the safety contract of the typed function `op` maps to;
/// in particular `call` runs arbitrary machine code.
pub unsafe fn invoke(op: Operation, args: &[HostValue]) -> Result<HostValue, HeapError> {
    match op {
        Operation::WriteTagged => {
            expect_args!(args, op, [View(dst)]);
            let src = match args.get(1) {
                Some(HostValue::View(v)) => TaggedValue::Pointer(*v),
                Some(HostValue::Number(n)) => TaggedValue::Integer(*n),
                _ => return Err(op.argument_error()),
            };
            let Some(HostValue::Number(off)) = args.get(2) else {
                return Err(op.argument_error());
            };
            let off: usize = expect_unsigned!(*off, op);
            unsafe { value::write_tagged(dst, src, off)? };
            Ok(HostValue::Undefined)
        }
        Operation::ReadTagged => {
            expect_args!(args, op, [View(src), Number(off)]);
            let off: usize = expect_unsigned!(off, op);
            Ok(unsafe { value::read_tagged(src, off)? }.into())
        }
        Operation::WriteInterior => {
            expect_args!(args, op, [View(dst), View(src), Number(off), Number(ioff)]);
            let off: usize = expect_unsigned!(off, op);
            unsafe { value::write_interior(dst, src, off, ioff as isize) };
            Ok(HostValue::Undefined)
        }
        Operation::ReadInterior => {
            expect_args!(args, op, [View(src), Number(off), Number(ioff)]);
            let off: usize = expect_unsigned!(off, op);
            Ok(unsafe { value::read_interior(src, off, ioff as isize) }.into())
        }
        Operation::IsSame => {
            expect_args!(args, op, [View(a), View(b)]);
            Ok(HostValue::Bool(value::is_same(a, b)))
        }
        Operation::ReadMark => {
            expect_args!(args, op, [View(obj), Number(page_size), Number(bit_count)]);
            let geometry = geometry(op, page_size, bit_count)?;
            Ok(HostValue::Number(unsafe { geometry.read(obj) } as i64))
        }
        Operation::WriteMark => {
            expect_args!(args, op, [View(obj), Number(mark), Number(page_size), Number(bit_count)]);
            let geometry = geometry(op, page_size, bit_count)?;
            unsafe { geometry.write(obj, mark as usize) };
            Ok(HostValue::Undefined)
        }
        Operation::Call => {
            expect_args!(args, op, [View(code), Array(list)]);
            if list.len() > crate::constants::MAX_CALL_ARGS {
                return Err(HeapError::Arity(list.len()));
            }
            let call_args = list
                .iter()
                .map(|a| match a {
                    HostValue::View(v) => Ok(TaggedValue::Pointer(*v)),
                    HostValue::Number(n) => Ok(TaggedValue::Integer(*n)),
                    _ => Err(op.argument_error()),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(unsafe { native::call(code, &call_args)? }.into())
        }
        Operation::PointerAdd => {
            expect_args!(args, op, [View(pos), View(limit), Number(size)]);
            let size: usize = expect_unsigned!(size, op);
            Ok(match unsafe { gc::try_bump(pos, limit, size)? } {
                Some(view) => HostValue::View(view),
                None => HostValue::Bool(false),
            })
        }
    }
}

/// Like [`invoke`], looking the operation up by its host name.
///
/// # Safety
///
/// See [`invoke`].
pub unsafe fn invoke_by_name(name: &str, args: &[HostValue]) -> Result<HostValue, HeapError> {
    let op = name
        .parse::<Operation>()
        .map_err(|_| HeapError::UnknownOperation(name.to_string()))?;
    unsafe { invoke(op, args) }
}

fn geometry(op: Operation, page_size: i64, bit_count: i64) -> Result<PageGeometry, HeapError> {
    let page_size: usize = expect_unsigned!(page_size, op);
    let bit_count: u32 = expect_unsigned!(bit_count, op);
    PageGeometry::new(page_size, bit_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{PTR_SIZE, SMI_MASK};

    #[test]
    fn test_operation_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>(), Ok(op));
        }
        assert!("freeObject".parse::<Operation>().is_err());
    }

    #[test]
    fn test_missing_args_touch_nothing() {
        let mut words = [7usize; 2];
        let view = RawView::from_words(&mut words);
        let err = unsafe { invoke(Operation::WriteTagged, &[view.into(), HostValue::Number(5)]) }
            .unwrap_err();
        assert_eq!(
            err,
            HeapError::Arguments {
                usage: "writeTagged(dst, src, off)"
            }
        );
        assert_eq!(err.to_string(), "Missing args: writeTagged(dst, src, off)");
        assert_eq!(words, [7, 7]);
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let mut words = [0usize; 2];
        let view = RawView::from_words(&mut words);
        let err = unsafe {
            invoke(
                Operation::WriteTagged,
                &[view.into(), HostValue::Bool(true), HostValue::Number(0)],
            )
        }
        .unwrap_err();
        assert_eq!(err, Operation::WriteTagged.argument_error());

        let err = unsafe { invoke(Operation::IsSame, &[view.into(), HostValue::Number(1)]) }
            .unwrap_err();
        assert_eq!(err, Operation::IsSame.argument_error());

        let err = unsafe { invoke(Operation::ReadTagged, &[view.into(), HostValue::Number(-8)]) }
            .unwrap_err();
        assert_eq!(err, Operation::ReadTagged.argument_error());
    }

    #[test]
    fn test_tagged_through_binding() {
        let mut words = [0usize; 2];
        let view = RawView::from_words(&mut words);
        let off = PTR_SIZE as i64;
        unsafe {
            invoke(
                Operation::WriteTagged,
                &[view.into(), HostValue::Number(99), off.into()],
            )
            .unwrap();
            let back = invoke(Operation::ReadTagged, &[view.into(), off.into()]).unwrap();
            assert_eq!(back.as_number(), Some(99));

            let err = invoke(
                Operation::WriteTagged,
                &[view.into(), HostValue::Number(SMI_MASK as i64 + 1), HostValue::Number(0)],
            )
            .unwrap_err();
            assert_eq!(err, HeapError::SmiOverflow(SMI_MASK as i64 + 1));
        }
        assert_eq!(words[1], 99 << 1);
        assert_eq!(words[0], 0);
    }

    #[test]
    fn test_call_arity_checked_before_kinds() {
        let code = RawView::unknown(std::ptr::null_mut());
        let list = vec![HostValue::Undefined; 8];
        let err = unsafe { invoke(Operation::Call, &[code.into(), HostValue::Array(list)]) }
            .unwrap_err();
        assert_eq!(err, HeapError::Arity(8));

        let err = unsafe {
            invoke(
                Operation::Call,
                &[code.into(), HostValue::Array(vec![HostValue::Bool(false)])],
            )
        }
        .unwrap_err();
        assert_eq!(err, Operation::Call.argument_error());
    }

    #[test]
    fn test_mark_shape_error() {
        let bogus = RawView::unknown(PTR_SIZE as *mut u8);
        let shape = |page_size: i64, bits: i64| unsafe {
            invoke(
                Operation::ReadMark,
                &[bogus.into(), HostValue::Number(page_size), HostValue::Number(bits)],
            )
        };
        let err = shape(100, 1).unwrap_err();
        assert_eq!(err, HeapError::PageSize(100));
        assert_eq!(err.kind(), crate::error::ErrorKind::Shape);

        let huge = 1i64 << (usize::BITS - 2);
        let err = shape(huge, 8).unwrap_err();
        assert_eq!(err, HeapError::PageSize(huge as usize));
    }

    #[test]
    fn test_constants_exported() {
        let constants = constants();
        let align = constants
            .iter()
            .find(|(name, _)| *name == "align")
            .and_then(|(_, v)| v.as_number());
        assert_eq!(align, Some(crate::constants::ALIGN as i64));
        assert_eq!(constants.len(), 8);
    }
}
