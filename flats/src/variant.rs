use crate::{
    alloc::Allocator,
    check::expect_always,
    error::{Error, ErrorKind},
    mem::narrow_offset,
    span::Span,
    traits::Flat,
    vec::{FlatString, Vector},
    Offset,
};

/// Discriminated header every generated variant struct embeds.
///
/// `utag == 0` means no alternative is set; alternative `i` stores `i` (their
/// ordinals are 1-based). `pos` is the offset from the header to the
/// alternative, which is allocated in the tail.
#[repr(C)]
#[derive(Debug)]
pub struct Header {
    pub utag: u8,
    pub pos: Offset,
}

impl Header {
    pub fn tag(&self) -> u8 {
        self.utag
    }

    pub fn is_present(&self) -> bool {
        self.utag != 0
    }

    fn alt_ptr<T>(&self) -> *const T {
        (self as *const Self as *const u8).wrapping_offset(self.pos as isize) as *const T
    }

    fn alt_ptr_mut<T>(&mut self) -> *mut T {
        (self as *mut Self as *mut u8).wrapping_offset(self.pos as isize) as *mut T
    }

    /// Allocate room for alternative `tag` in the tail and select it.
    pub fn alloc_alternative<T: Flat>(
        &mut self,
        allo: &mut Allocator,
        tag: u8,
    ) -> Result<*mut T, Error> {
        let pos = allo.allocate(core::mem::size_of::<T>())?;
        let self_off = self as *const Self as isize - allo.flat_ptr() as isize;
        self.pos = narrow_offset(pos as isize - self_off)?;
        self.utag = tag;
        Ok(self.alt_ptr_mut())
    }

    /// Pointer to the selected alternative, checked against `expected`.
    pub fn alternative<T: Flat>(&self, expected: u8) -> Result<*const T, Error> {
        expect_always(self.utag == expected, ErrorKind::VariantTag)?;
        Ok(self.alt_ptr())
    }

    pub fn alternative_mut<T: Flat>(&mut self, expected: u8) -> Result<*mut T, Error> {
        expect_always(self.utag == expected, ErrorKind::VariantTag)?;
        Ok(self.alt_ptr_mut())
    }

    /// Select alternative `tag` and store `value` in it.
    pub fn set_value<T: Flat>(
        &mut self,
        allo: &mut Allocator,
        tag: u8,
        value: T,
    ) -> Result<(), Error> {
        let p = self.alloc_alternative::<T>(allo, tag)?;
        unsafe { p.write_unaligned(value) };
        Ok(())
    }

    /// Read back alternative `tag` by value.
    pub fn value<T: Flat + Copy>(&self, expected: u8) -> Result<T, Error> {
        let p = self.alternative::<T>(expected)?;
        Ok(unsafe { p.read_unaligned() })
    }

    /// Select alternative `tag` and zero its storage, for in-place filling.
    pub fn alloc_zeroed<T: Flat>(&mut self, allo: &mut Allocator, tag: u8) -> Result<*mut T, Error> {
        let p = self.alloc_alternative::<T>(allo, tag)?;
        unsafe { crate::mem::zero(p as *mut u8, core::mem::size_of::<T>()) };
        Ok(p)
    }

    /// Select a string alternative: the vector header goes to the tail with
    /// the bytes of `s` immediately after it.
    pub fn set_string(&mut self, allo: &mut Allocator, tag: u8, s: &str) -> Result<(), Error> {
        let header_size = core::mem::size_of::<FlatString>();
        let hdr_pos = allo.allocate(header_size)?;
        let r = allo.place(s)?;
        let v = FlatString::raw(r.size, (r.pos - hdr_pos) as Offset);
        unsafe {
            (allo.flat_ptr_mut().add(hdr_pos as usize) as *mut FlatString).write_unaligned(v);
        }
        let self_off = self as *const Self as isize - allo.flat_ptr() as isize;
        self.pos = narrow_offset(hdr_pos as isize - self_off)?;
        self.utag = tag;
        Ok(())
    }

    /// Read back a string alternative.
    pub fn string(&self, expected: u8) -> Result<Span<'_, u8>, Error> {
        self.vector_span::<u8>(expected)
    }

    /// Span over a vector alternative's elements.
    pub fn vector_span<T: Flat>(&self, expected: u8) -> Result<Span<'_, T>, Error> {
        expect_always(self.utag == expected, ErrorKind::VariantTag)?;
        let p = self.alt_ptr::<Vector<T>>();
        let v: Vector<T> = unsafe { p.read_unaligned() };
        let base = (p as *const u8).wrapping_offset(v.pos as isize) as *const T;
        Ok(unsafe { Span::from_raw_parts(base, v.len()) })
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::bytes::AlignedBytes;

    // [Allocator | Header .... | tail]
    fn setup(bytes: &mut AlignedBytes, fixed: usize, tail: usize) -> (&mut Allocator, &mut Header) {
        let base = bytes.as_mut_ptr();
        let allo = unsafe { &mut *(base as *mut Allocator) };
        *allo = Allocator::new(fixed, fixed + tail).unwrap();
        let hdr = unsafe { &mut *(base.add(core::mem::size_of::<Allocator>()) as *mut Header) };
        (allo, hdr)
    }

    #[test]
    fn uninitialized_tag_is_zero() {
        let mut bytes = AlignedBytes::new(64, 8);
        let (_, hdr) = setup(&mut bytes, 8, 16);
        assert_eq!(hdr.tag(), 0);
        assert!(!hdr.is_present());
    }

    #[test]
    fn value_round_trip() {
        let mut bytes = AlignedBytes::new(64, 8);
        let (allo, hdr) = setup(&mut bytes, 8, 16);
        hdr.set_value(allo, 1, 0x1234_5678i32).unwrap();
        assert_eq!(hdr.tag(), 1);
        assert_eq!(hdr.value::<i32>(1), Ok(0x1234_5678));
    }

    #[test]
    fn wrong_tag() {
        let mut bytes = AlignedBytes::new(64, 8);
        let (allo, hdr) = setup(&mut bytes, 8, 16);
        hdr.set_value(allo, 2, 1.5f64).unwrap();
        assert_eq!(hdr.value::<i32>(1).unwrap_err().kind, ErrorKind::VariantTag);
        assert_eq!(hdr.value::<f64>(2), Ok(1.5));
    }

    #[test]
    fn string_round_trip() {
        let mut bytes = AlignedBytes::new(64, 8);
        let (allo, hdr) = setup(&mut bytes, 8, 32);
        hdr.set_string(allo, 2, "abc").unwrap();
        assert_eq!(hdr.tag(), 2);
        assert!(hdr.string(2).unwrap() == "abc");
        assert_eq!(hdr.string(1).unwrap_err().kind, ErrorKind::VariantTag);
        // header plus characters were taken from the tail
        assert_eq!(allo.next as usize, 8 + core::mem::size_of::<FlatString>() + 3);
    }
}
