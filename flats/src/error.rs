use core::fmt;

/// Error that can occur while working with flat buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    /// Byte position relative to the object the failing operation ran on.
    pub pos: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    BadInt,
    BadArrayInit,
    /// A tail allocation would run past the allocator limit.
    TailTooBig,
    BadSpanIndex,
    ArrayInitializer,
    /// The caller-supplied buffer cannot hold the message.
    SmallBuffer,
    OptionalNotPresent,
    CstringOverflow,
    Truncation,
    Narrowing,
    /// An alternative was read that is not the one selected.
    VariantTag,
    FixedArrayOverflow,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, pos: 0 }
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.pos += offset;
        self
    }
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadInt => "bad int",
            ErrorKind::BadArrayInit => "bad array init",
            ErrorKind::TailTooBig => "tail too big",
            ErrorKind::BadSpanIndex => "bad span index",
            ErrorKind::ArrayInitializer => "array initializer",
            ErrorKind::SmallBuffer => "buffer too small",
            ErrorKind::OptionalNotPresent => "optional not present",
            ErrorKind::CstringOverflow => "string too long",
            ErrorKind::Truncation => "string truncation",
            ErrorKind::Narrowing => "narrowing",
            ErrorKind::VariantTag => "bad variant tag",
            ErrorKind::FixedArrayOverflow => "fixed array overflow",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.pos)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
