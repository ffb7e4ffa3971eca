use core::mem::MaybeUninit;

use crate::{
    check::expect,
    error::{Error, ErrorKind},
    traits::Flat,
};

/// Nullable in-buffer wrapper.
///
/// The discriminator is a single byte; padding places the value at
/// `align_of::<T>()`, so the whole wrapper takes `align(T) + size(T)` bytes
/// for the usual element types.
#[repr(C)]
pub struct Optional<T> {
    filled: u8,
    val: MaybeUninit<T>,
}

impl<T: Flat> Optional<T> {
    pub fn is_present(&self) -> bool {
        self.filled != 0
    }

    pub fn is_empty(&self) -> bool {
        !self.is_present()
    }

    pub fn set(&mut self, value: T) -> &mut T {
        self.filled = 1;
        self.val.write(value)
    }

    pub fn set_empty(&mut self) {
        self.filled = 0;
    }

    /// Mark present with a zero-initialized value.
    pub fn set_zeroed(&mut self) -> &mut T {
        self.filled = 1;
        self.val = MaybeUninit::zeroed();
        unsafe { self.val.assume_init_mut() }
    }

    pub fn get(&self) -> Result<&T, Error> {
        expect(self.is_present(), ErrorKind::OptionalNotPresent)?;
        Ok(unsafe { self.val.assume_init_ref() })
    }

    pub fn get_mut(&mut self) -> Result<&mut T, Error> {
        expect(self.is_present(), ErrorKind::OptionalNotPresent)?;
        Ok(unsafe { self.val.assume_init_mut() })
    }

    /// Raw access to the value slot for in-place construction; does not
    /// consult or change the discriminator.
    pub fn value_ptr(&mut self) -> *mut T {
        self.val.as_mut_ptr()
    }

    /// Mark the value slot as holding a constructed value.
    pub fn mark_present(&mut self) {
        self.filled = 1;
    }
}

unsafe impl<T: Flat> Flat for Optional<T> {}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let mut o: Optional<i32> = unsafe { core::mem::zeroed() };
        assert!(o.is_empty());
        assert_eq!(o.get().unwrap_err().kind, ErrorKind::OptionalNotPresent);

        o.set(42);
        assert!(o.is_present());
        assert_eq!(o.get(), Ok(&42));

        o.set_empty();
        assert_eq!(o.get().unwrap_err().kind, ErrorKind::OptionalNotPresent);
    }

    #[test]
    fn zeroed_default() {
        let mut o: Optional<i64> = unsafe { core::mem::zeroed() };
        o.set(7);
        assert_eq!(*o.set_zeroed(), 0);
        assert_eq!(o.get(), Ok(&0));
    }

    #[test]
    fn layout() {
        assert_eq!(core::mem::size_of::<Optional<i32>>(), 4 + 4);
        assert_eq!(core::mem::size_of::<Optional<i64>>(), 8 + 8);
        assert_eq!(core::mem::size_of::<Optional<u8>>(), 1 + 1);
    }
}
