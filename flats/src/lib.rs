#![no_std]
#![allow(clippy::missing_safety_doc)]

#[cfg(feature = "std")]
extern crate std;

/// Tail allocator and tail references.
pub mod alloc;
/// Fixed-size inline array.
pub mod array;
/// Aligned byte buffers for tests and examples.
#[cfg(feature = "std")]
pub mod bytes;
/// Central runtime check point.
pub mod check;
/// Error type.
pub mod error;
/// Fixed-capacity inline vector.
pub mod fixed;
/// Sentinel argument types and the message version stamp.
pub mod marker;
/// Raw buffer access used by generated code.
///
/// *Please, don't use it by yourself because it isn't stable.*
pub mod mem;
/// Nullable in-buffer wrapper.
pub mod optional;
/// Non-owning views over in-buffer storage.
pub mod span;
mod traits;
/// Tagged-union header and alternative access.
pub mod variant;
/// Tail-allocated vector and the flat string.
pub mod vec;

pub use crate::{
    alloc::{Allocator, TailRef},
    array::Array,
    check::{expect, expect_always, ErrorHandling},
    error::{Error, ErrorKind},
    fixed::FixedVec,
    marker::{Default, Empty, Extent, Push, Version},
    optional::Optional,
    span::{Direct, Span, SpanMut, SpanRef},
    traits::Flat,
    vec::{FlatString, Vector},
};

/// Relative position measured in bytes inside a flat or message.
pub type Offset = i16;
/// Byte count of something inside a flat or message.
pub type Size = i16;

/// Application preset types carried by the predefined-type catalog.
pub mod preset {
    use crate::traits::Flat;

    /// Nanoseconds since the epoch.
    #[repr(transparent)]
    #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
    pub struct TimePoint(pub i64);

    #[repr(transparent)]
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct UKey(pub u32);

    #[repr(transparent)]
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct ExchangeId(pub u16);

    /// Scaled decimal price with a fixed exponent.
    #[repr(transparent)]
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct OptionPrice(pub u32);

    #[repr(transparent)]
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct InstrumentStatus(pub u8);

    unsafe impl Flat for TimePoint {}
    unsafe impl Flat for UKey {}
    unsafe impl Flat for ExchangeId {}
    unsafe impl Flat for OptionPrice {}
    unsafe impl Flat for InstrumentStatus {}
}
