/// Marker for types whose in-memory representation is the wire representation.
///
/// # Safety
///
/// By implementing this trait you guarantee:
///
/// + `Self` has a stable `repr(C)` (or primitive) binary representation.
/// + `Self` does not own any resources outside of itself.
/// + `Self` has no drop glue; it can be trivially copied as bytes.
pub unsafe trait Flat: Sized + 'static {}

unsafe impl Flat for u8 {}
unsafe impl Flat for i8 {}
unsafe impl Flat for u16 {}
unsafe impl Flat for i16 {}
unsafe impl Flat for u32 {}
unsafe impl Flat for i32 {}
unsafe impl Flat for u64 {}
unsafe impl Flat for i64 {}
unsafe impl Flat for f32 {}
unsafe impl Flat for f64 {}
