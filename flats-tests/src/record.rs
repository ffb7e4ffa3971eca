//! Expanded compiler output for:
//!
//! ```text
//! Pair : flat { x:int32 y:int32 }
//! Sel : variant { i:int32 ; s:string }
//! Rec : flat {
//!     n : int32
//!     s : string
//!     v : vector<int32>
//!     fv : fixed_vector<int32, 4>
//!     op : optional<int32>
//!     w : Sel
//!     pairs : Pair[2]
//! }
//! M : message of Rec
//! ```

#![allow(non_camel_case_types, non_snake_case, non_upper_case_globals)]

use core::marker::PhantomData;

use flats::{
    check, mem, variant, Allocator, Array, Direct, Error, ErrorKind, Extent, FixedVec,
    FlatString, Optional, Span, SpanMut, SpanRef, Vector, Version,
};

#[repr(C, align(8))]
pub struct Pair {
    pub x: i32,
    pub y: i32,
}

unsafe impl flats::Flat for Pair {}

pub struct PairDirect<'a> {
    mbuf: *mut Pair,
    _marker: PhantomData<&'a mut Pair>,
}

impl<'a> PairDirect<'a> {
    pub fn new(mbuf: &'a mut Pair) -> Self {
        Self {
            mbuf,
            _marker: PhantomData,
        }
    }

    pub fn x(&mut self) -> &mut i32 {
        unsafe { &mut (*self.mbuf).x }
    }
    pub fn set_x(&mut self, arg: i32) {
        unsafe { (*self.mbuf).x = arg };
    }

    pub fn y(&mut self) -> &mut i32 {
        unsafe { &mut (*self.mbuf).y }
    }
    pub fn set_y(&mut self, arg: i32) {
        unsafe { (*self.mbuf).y = arg };
    }
}

impl<'a> Direct for PairDirect<'a> {
    type Target = Pair;
    unsafe fn from_parts(target: *mut Pair, _allo: *mut Allocator) -> Self {
        Self {
            mbuf: target,
            _marker: PhantomData,
        }
    }
}

#[repr(C)]
pub struct Sel {
    hdr: variant::Header,
}

unsafe impl flats::Flat for Sel {}

impl Sel {
    pub fn tag(&self) -> u8 {
        self.hdr.tag()
    }

    pub fn is_present(&self) -> bool {
        self.hdr.is_present()
    }

    pub fn set_i(&mut self, allo: &mut Allocator, arg: i32) -> Result<(), Error> {
        self.hdr.set_value(allo, 1, arg)
    }

    pub fn i(&self) -> Result<i32, Error> {
        self.hdr.value(1)
    }

    pub fn set_s(&mut self, allo: &mut Allocator, arg: &str) -> Result<(), Error> {
        self.hdr.set_string(allo, 2, arg)
    }

    pub fn s(&self) -> Result<Span<'_, u8>, Error> {
        self.hdr.string(2)
    }
}

pub struct SelDirect<'a> {
    var: *mut Sel,
    allo: *mut Allocator,
    _marker: PhantomData<&'a mut Sel>,
}

impl<'a> SelDirect<'a> {
    pub fn tag(&self) -> u8 {
        unsafe { (*self.var).tag() }
    }

    pub fn is_present(&self) -> bool {
        unsafe { (*self.var).is_present() }
    }

    pub fn set_i(&mut self, arg: i32) -> Result<(), Error> {
        unsafe { (*self.var).set_i(&mut *self.allo, arg) }
    }

    pub fn i(&self) -> Result<i32, Error> {
        unsafe { (*self.var).i() }
    }

    pub fn set_s(&mut self, arg: &str) -> Result<(), Error> {
        unsafe { (*self.var).set_s(&mut *self.allo, arg) }
    }

    pub fn s(&self) -> Result<Span<'_, u8>, Error> {
        unsafe { (*self.var).s() }
    }
}

impl<'a> Direct for SelDirect<'a> {
    type Target = Sel;
    unsafe fn from_parts(target: *mut Sel, allo: *mut Allocator) -> Self {
        Self {
            var: target,
            allo,
            _marker: PhantomData,
        }
    }
}

#[repr(C, align(8))]
pub struct Rec {
    pub n: i32,
    pub s: FlatString,
    pub v: Vector<i32>,
    pub fv: FixedVec<i32, 4>,
    pub op: Optional<i32>,
    pub w: Sel,
    pub pairs: Array<Pair, 2>,
}

unsafe impl flats::Flat for Rec {}

pub struct RecDirect<'a> {
    mbuf: *mut Rec,
    allo: *mut Allocator,
    _marker: PhantomData<&'a mut Rec>,
}

impl<'a> RecDirect<'a> {
    pub fn new(mbuf: &'a mut Rec, allo: &'a mut Allocator) -> Self {
        Self {
            mbuf,
            allo,
            _marker: PhantomData,
        }
    }

    pub fn n(&mut self) -> &mut i32 {
        unsafe { &mut (*self.mbuf).n }
    }
    pub fn set_n(&mut self, arg: i32) {
        unsafe { (*self.mbuf).n = arg };
    }

    pub fn s(&self) -> Span<'_, u8> {
        unsafe { (*self.mbuf).s.span() }
    }
    pub fn set_s(&mut self, arg: &str) -> Result<(), Error> {
        unsafe { (*self.mbuf).s.init_str(&mut *self.allo, arg) }
    }
    pub fn s_extent(&mut self, arg: Extent) -> Result<(), Error> {
        unsafe { (*self.mbuf).s.init_extent(&mut *self.allo, arg) }
    }
    pub fn s_push(&mut self, arg: u8) -> Result<(), Error> {
        unsafe { (*self.mbuf).s.push(&mut *self.allo, arg) }
    }
    pub fn s_push_zeroed(&mut self) -> Result<(), Error> {
        unsafe { (*self.mbuf).s.push_zeroed(&mut *self.allo) }
    }

    pub fn v(&self) -> Span<'_, i32> {
        unsafe { (*self.mbuf).v.span() }
    }
    pub fn v_mut(&mut self) -> SpanMut<'_, i32> {
        unsafe { (*self.mbuf).v.span_mut() }
    }
    pub fn set_v(&mut self, arg: &[i32]) -> Result<(), Error> {
        unsafe { (*self.mbuf).v.init_from_slice(&mut *self.allo, arg) }
    }
    pub fn v_extent(&mut self, arg: Extent) -> Result<(), Error> {
        unsafe { (*self.mbuf).v.init_extent(&mut *self.allo, arg) }
    }
    pub fn v_push(&mut self, arg: i32) -> Result<(), Error> {
        unsafe { (*self.mbuf).v.push(&mut *self.allo, arg) }
    }
    pub fn v_push_zeroed(&mut self) -> Result<(), Error> {
        unsafe { (*self.mbuf).v.push_zeroed(&mut *self.allo) }
    }

    pub fn fv(&self) -> Span<'_, i32> {
        unsafe { (*self.mbuf).fv.span() }
    }
    pub fn fv_mut(&mut self) -> SpanMut<'_, i32> {
        unsafe { (*self.mbuf).fv.span_mut() }
    }
    pub fn set_fv(&mut self, arg: &[i32]) -> Result<(), Error> {
        unsafe { (*self.mbuf).fv.init_from_slice(arg) }
    }
    pub fn fv_extent(&mut self, arg: Extent) -> Result<(), Error> {
        unsafe { (*self.mbuf).fv.init_extent(arg) }
    }
    pub fn fv_push(&mut self, arg: i32) -> Result<(), Error> {
        unsafe { (*self.mbuf).fv.push(arg) }
    }
    pub fn fv_push_zeroed(&mut self) -> Result<(), Error> {
        unsafe { (*self.mbuf).fv.push_zeroed() }
    }

    pub fn op(&mut self) -> &mut Optional<i32> {
        unsafe { &mut (*self.mbuf).op }
    }
    pub fn set_op(&mut self, arg: i32) {
        unsafe { (*self.mbuf).op.set(arg) };
    }
    pub fn set_op_empty(&mut self) {
        unsafe { (*self.mbuf).op.set_empty() };
    }
    pub fn set_op_default(&mut self) {
        unsafe { (*self.mbuf).op.set_zeroed() };
    }

    pub fn w(&self) -> SelDirect<'_> {
        unsafe { SelDirect::from_parts(&mut (*self.mbuf).w, self.allo) }
    }
    pub fn set_w_i(&mut self, arg: i32) -> Result<(), Error> {
        unsafe { (*self.mbuf).w.set_i(&mut *self.allo, arg) }
    }
    pub fn set_w_s(&mut self, arg: &str) -> Result<(), Error> {
        unsafe { (*self.mbuf).w.set_s(&mut *self.allo, arg) }
    }

    pub fn pairs(&self) -> SpanRef<'_, PairDirect<'_>> {
        let a = unsafe { &mut (*self.mbuf).pairs };
        unsafe { SpanRef::from_raw_parts(a.as_mut_ptr(), a.len(), self.allo) }
    }
}

impl<'a> Direct for RecDirect<'a> {
    type Target = Rec;
    unsafe fn from_parts(target: *mut Rec, allo: *mut Allocator) -> Self {
        Self {
            mbuf: target,
            allo,
            _marker: PhantomData,
        }
    }
}

pub struct RecView<'a> {
    m: &'a [flats::Offset],
    buf: *const u8,
    _marker: PhantomData<&'a [u8]>,
}

impl<'a> RecView<'a> {
    pub fn new(m: &'a [flats::Offset], buf: &'a [u8]) -> Self {
        Self {
            m,
            buf: buf.as_ptr(),
            _marker: PhantomData,
        }
    }

    pub fn n(&self) -> &'a i32 {
        unsafe { mem::read_ref(self.buf, self.m[0] as usize) }
    }

    pub fn s(&self) -> &'a FlatString {
        unsafe { mem::read_ref(self.buf, self.m[1] as usize) }
    }

    pub fn op(&self) -> &'a Optional<i32> {
        unsafe { mem::read_ref(self.buf, self.m[4] as usize) }
    }
}

#[repr(C)]
#[derive(Debug)]
pub struct M {
    v: Version,
    alloc: Allocator,
}

impl M {
    pub const VERSION: i32 = 7;

    /// Place a writer message: zeroes the fixed part and `tail_size` tail bytes.
    pub fn place(buf: &mut [u8], tail_size: usize) -> Result<&mut M, Error> {
        let need = core::mem::size_of::<M>() + core::mem::size_of::<Rec>() + tail_size;
        check::expect_always(need <= buf.len(), ErrorKind::SmallBuffer)?;
        let m = unsafe { &mut *(buf.as_mut_ptr() as *mut M) };
        m.v = Version { v: Self::VERSION };
        m.alloc = Allocator::new(
            core::mem::size_of::<Rec>(),
            core::mem::size_of::<Rec>() + tail_size,
        )?;
        unsafe { mem::zero(m.flat_ptr() as *mut u8, core::mem::size_of::<Rec>() + tail_size) };
        Ok(m)
    }

    /// Attach to a message somebody else wrote into `buf`.
    pub fn place_reader(buf: &mut [u8]) -> Result<&mut M, Error> {
        check::expect_always(core::mem::size_of::<M>() <= buf.len(), ErrorKind::SmallBuffer)?;
        let m = unsafe { &mut *(buf.as_mut_ptr() as *mut M) };
        check::expect_always(m.size() <= buf.len(), ErrorKind::SmallBuffer)?;
        Ok(m)
    }

    pub fn flat_ptr(&self) -> *mut Rec {
        (self as *const M as *mut u8).wrapping_add(core::mem::size_of::<M>()) as *mut Rec
    }

    pub fn flat(&mut self) -> &mut Rec {
        unsafe { &mut *self.flat_ptr() }
    }

    pub fn direct(&mut self) -> RecDirect<'_> {
        unsafe { RecDirect::from_parts(self.flat_ptr(), &mut self.alloc) }
    }

    pub fn version(&self) -> i32 {
        self.v.v
    }

    pub fn current_size(&self) -> usize {
        core::mem::size_of::<M>() + self.alloc.next as usize
    }

    pub fn current_capacity(&self) -> usize {
        self.alloc.capacity()
    }

    pub fn size(&self) -> usize {
        core::mem::size_of::<M>() + self.alloc.max as usize
    }

    /// Bytewise copy of exactly `size()` bytes into `dst`.
    pub fn clone_into<'b>(&self, dst: &'b mut [u8]) -> Result<&'b mut M, Error> {
        check::expect_always(self.size() <= dst.len(), ErrorKind::SmallBuffer)?;
        unsafe {
            core::ptr::copy_nonoverlapping(
                self as *const M as *const u8,
                dst.as_mut_ptr(),
                self.size(),
            );
        }
        Ok(unsafe { &mut *(dst.as_mut_ptr() as *mut M) })
    }
}

pub fn place_M(buf: &mut [u8], tail_size: usize) -> Result<&mut M, Error> {
    M::place(buf, tail_size)
}

pub fn place_M_reader(buf: &mut [u8]) -> Result<&mut M, Error> {
    M::place_reader(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flats::bytes::AlignedBytes;

    const TAIL: usize = 64;

    fn buffer() -> AlignedBytes {
        AlignedBytes::new(core::mem::size_of::<M>() + core::mem::size_of::<Rec>() + TAIL, 8)
    }

    #[test]
    fn layout() {
        assert_eq!(core::mem::size_of::<Pair>(), 8);
        assert_eq!(core::mem::size_of::<Sel>(), 4);
        assert_eq!(core::mem::size_of::<Rec>(), 64);
        assert_eq!(core::mem::size_of::<M>(), 8);

        let rec: Rec = unsafe { core::mem::zeroed() };
        let base = &rec as *const Rec as usize;
        assert_eq!(core::ptr::addr_of!(rec.n) as usize - base, 0);
        assert_eq!(core::ptr::addr_of!(rec.s) as usize - base, 4);
        assert_eq!(core::ptr::addr_of!(rec.v) as usize - base, 8);
        assert_eq!(core::ptr::addr_of!(rec.fv) as usize - base, 12);
        assert_eq!(core::ptr::addr_of!(rec.op) as usize - base, 32);
        assert_eq!(core::ptr::addr_of!(rec.w) as usize - base, 40);
        assert_eq!(core::ptr::addr_of!(rec.pairs) as usize - base, 48);
    }

    #[test]
    fn pair_direct() {
        let mut p: Pair = unsafe { core::mem::zeroed() };
        let mut d = PairDirect::new(&mut p);
        d.set_x(1);
        d.set_y(2);
        assert_eq!(*d.x(), 1);
        *d.y() += 40;
        assert_eq!(p.y, 42);
    }

    #[test]
    fn string_round_trip() {
        let mut buf = buffer();
        let m = M::place(&mut buf, TAIL).unwrap();
        let mut d = m.direct();
        d.set_s("hi").unwrap();
        assert!(d.s() == "hi");
        // two bytes were taken from the tail
        assert_eq!(m.current_size(), 8 + core::mem::size_of::<Rec>() + 2);
    }

    #[test]
    fn tail_bounds() {
        let mut buf = buffer();
        let m = M::place(&mut buf, TAIL).unwrap();
        let mut d = m.direct();
        d.set_s("hello").unwrap();
        let before = m.current_size();

        let mut d = m.direct();
        let err = d.v_extent(Extent(1000)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TailTooBig);
        // earlier allocations are unaffected
        assert_eq!(m.current_size(), before);
        assert!(m.direct().s() == "hello");
    }

    #[test]
    fn vector_push_rules() {
        let mut buf = buffer();
        let m = M::place(&mut buf, TAIL).unwrap();
        let mut d = m.direct();
        d.set_v(&[1, 2, 3]).unwrap();
        d.v_push(4).unwrap();
        assert_eq!(d.v().len(), 4);
        assert_eq!(d.v().get(3), Ok(4));

        // another tail allocation ends the vector's run
        d.set_s("x").unwrap();
        assert_eq!(d.v_push(5).unwrap_err().kind, ErrorKind::FixedArrayOverflow);
    }

    #[test]
    fn fixed_vector_overflow() {
        let mut buf = buffer();
        let m = M::place(&mut buf, TAIL).unwrap();
        let mut d = m.direct();
        for i in 0..4 {
            d.fv_push(i).unwrap();
        }
        assert_eq!(d.fv_push(4).unwrap_err().kind, ErrorKind::FixedArrayOverflow);
        assert_eq!(d.fv().len(), 4);
        assert_eq!(d.fv().get(2), Ok(2));
    }

    #[test]
    fn optional_round_trip() {
        let mut buf = buffer();
        let m = M::place(&mut buf, TAIL).unwrap();
        let mut d = m.direct();
        d.set_op_empty();
        assert_eq!(
            d.op().get().unwrap_err().kind,
            ErrorKind::OptionalNotPresent
        );
        d.set_op(42);
        assert_eq!(d.op().get(), Ok(&42));
        d.set_op_default();
        assert_eq!(d.op().get(), Ok(&0));
    }

    #[test]
    fn variant_round_trip() {
        let mut buf = buffer();
        let m = M::place(&mut buf, TAIL).unwrap();
        let mut d = m.direct();

        // zeroed means no alternative selected
        assert_eq!(d.w().tag(), 0);
        assert!(!d.w().is_present());

        d.set_w_s("abc").unwrap();
        assert_eq!(d.w().tag(), 2);
        assert!(d.w().s().unwrap() == "abc");
        assert_eq!(d.w().i().unwrap_err().kind, ErrorKind::VariantTag);

        d.set_w_i(0x5a5a).unwrap();
        assert_eq!(d.w().tag(), 1);
        assert_eq!(d.w().i(), Ok(0x5a5a));
        assert_eq!(d.w().s().unwrap_err().kind, ErrorKind::VariantTag);
    }

    #[test]
    fn nested_pairs() {
        let mut buf = buffer();
        let m = M::place(&mut buf, TAIL).unwrap();
        let d = m.direct();
        let pairs = d.pairs();
        assert_eq!(pairs.len(), 2);
        let mut p0 = pairs.get(0).unwrap();
        p0.set_x(10);
        p0.set_y(20);
        let mut p1 = pairs.get(1).unwrap();
        p1.set_x(30);
        assert!(pairs.get(2).is_err());

        assert_eq!(m.flat().pairs.as_slice()[0].y, 20);
        assert_eq!(m.flat().pairs.as_slice()[1].x, 30);
    }

    #[test]
    fn clone_idempotence() {
        let mut buf = buffer();
        let n;
        let mut dst;
        {
            let m = M::place(&mut buf, TAIL).unwrap();
            let mut d = m.direct();
            d.set_n(9);
            d.set_s("copy me").unwrap();
            d.set_v(&[5, 6]).unwrap();
            d.set_op(17);

            n = m.size();
            dst = AlignedBytes::new(n, 8);
            let copy = m.clone_into(&mut dst).unwrap();
            assert_eq!(copy.version(), M::VERSION);
            assert_eq!(copy.current_size(), m.current_size());

            let mut cd = copy.direct();
            assert_eq!(*cd.n(), 9);
            assert!(cd.s() == "copy me");
            assert_eq!(cd.v().get(1), Ok(6));
            assert_eq!(cd.op().get(), Ok(&17));
        }
        // byte-for-byte identical up to size()
        assert_eq!(&buf[..n], &dst[..n]);
    }

    #[test]
    fn reader_attach() {
        let mut buf = buffer();
        {
            let m = M::place(&mut buf, TAIL).unwrap();
            let mut d = m.direct();
            d.set_n(5);
            d.set_s("shared").unwrap();
        }
        let m = place_M_reader(&mut buf).unwrap();
        assert_eq!(m.version(), 7);
        let d = m.direct();
        assert!(d.s() == "shared");

        // a buffer too small for the recorded tail is rejected
        let mut tiny = AlignedBytes::from_slice(&buf[..16], 8);
        assert_eq!(
            M::place_reader(&mut tiny).unwrap_err().kind,
            ErrorKind::SmallBuffer
        );
    }

    #[test]
    fn small_buffer_rejected() {
        let mut buf = AlignedBytes::new(16, 8);
        assert_eq!(
            M::place(&mut buf, TAIL).unwrap_err().kind,
            ErrorKind::SmallBuffer
        );
    }

    #[test]
    fn view_reads_through_offset_table() {
        let mut buf = buffer();
        {
            let m = M::place(&mut buf, TAIL).unwrap();
            let mut d = m.direct();
            d.set_n(123);
            d.set_s("via view").unwrap();
            d.set_op(7);
        }

        // offsets by field ordinal, as an object map would record them
        let table: [flats::Offset; 7] = [0, 4, 8, 12, 32, 40, 48];
        let flat_bytes = 8..8 + core::mem::size_of::<Rec>();
        let view = RecView::new(&table, &buf[flat_bytes]);
        assert_eq!(*view.n(), 123);
        assert_eq!(view.s().as_str(), Some("via view"));
        assert_eq!(view.op().get(), Ok(&7));
    }
}
