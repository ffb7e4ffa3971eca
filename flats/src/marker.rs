use crate::{error::Error, mem::narrow_size, Size};

/// The number of elements of a given type in an array or vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extent(pub Size);

impl Extent {
    pub fn new(count: usize) -> Result<Self, Error> {
        Ok(Self(narrow_size(count)?))
    }
}

/// Selects the appending placement-setter overload.
#[derive(Clone, Copy, Debug)]
pub struct Push;

/// An absent optional.
#[derive(Clone, Copy, Debug)]
pub struct Empty;

/// A present, zero-initialized optional.
#[derive(Clone, Copy, Debug)]
pub struct Default;

/// Message version stamp: the declared field count at generation time.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Version {
    pub v: i32,
}
