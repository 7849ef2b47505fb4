use thiserror::Error;

/// Broad classes of failure, so the host can map errors onto its own exception types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Argument,
    Alignment,
    Range,
    Shape,
    Arity,
    Invariant,
    Native,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HeapError {
    #[error("Missing args: {usage}")]
    Arguments { usage: &'static str },

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Unaligned pointer: {0:#x}")]
    UnalignedPointer(usize),

    #[error("Too big number to be tagged: {0}")]
    SmiOverflow(i64),

    #[error("Invalid untagged number: {0:#x}")]
    InvalidUntaggedNumber(usize),

    #[error("Page size is not a power of two: {0}")]
    PageSize(usize),

    #[error("Invalid mark bit count: {0}")]
    BitCount(u32),

    #[error("Only args.length <= 7 is supported, got {0}")]
    Arity(usize),

    #[error("Bump pointer is not tagged: {0:#x}")]
    UntaggedBumpPointer(usize),

    #[error("Failed to load library {name}: {message}")]
    Library { name: String, message: String },

    #[error("Failed to resolve symbol {name}: {message}")]
    Symbol { name: String, message: String },
}

impl HeapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Arguments { .. } | Self::UnknownOperation(_) => ErrorKind::Argument,
            Self::UnalignedPointer(_) => ErrorKind::Alignment,
            Self::SmiOverflow(_) | Self::InvalidUntaggedNumber(_) => ErrorKind::Range,
            Self::PageSize(_) | Self::BitCount(_) => ErrorKind::Shape,
            Self::Arity(_) => ErrorKind::Arity,
            Self::UntaggedBumpPointer(_) => ErrorKind::Invariant,
            Self::Library { .. } | Self::Symbol { .. } => ErrorKind::Native,
        }
    }
}
