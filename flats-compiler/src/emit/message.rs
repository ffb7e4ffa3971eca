use core::fmt::{self, Write};

use super::{names::direct_name, needs_allocator};
use crate::ir::{Context, FlatId};

/// The message envelope: `{Version, Allocator?}` laid out immediately before
/// the flat's fixed part, which is followed by the tail.
pub fn emit(ctx: &Context, fid: FlatId, out: &mut String) -> fmt::Result {
    let mess = ctx.flat(fid);
    let name = &mess.name;
    let Some(under) = ctx.underlying_flat(fid) else {
        return Ok(());
    };
    let flat = &ctx.flat(under).name;
    let fdirect = direct_name(flat);
    let allo = needs_allocator(ctx, under);
    let version = ctx.flat(under).fields.len();

    writeln!(out, "#[repr(C)]")?;
    writeln!(out, "pub struct {name} {{")?;
    writeln!(out, "    v: Version,")?;
    if allo {
        writeln!(out, "    alloc: Allocator,")?;
    } else {
        // keep the flat's fixed part aligned in the buffer
        writeln!(out, "    _pad: [u8; 4],")?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, "impl {name} {{")?;
    writeln!(out, "    pub const VERSION: i32 = {version};")?;
    writeln!(out)?;

    if allo {
        writeln!(
            out,
            "    /// Place a writer message: zeroes the fixed part and `tail_size` tail bytes."
        )?;
        writeln!(
            out,
            "    pub fn place(buf: &mut [u8], tail_size: usize) -> Result<&mut {name}, Error> {{"
        )?;
        writeln!(
            out,
            "        let need = core::mem::size_of::<{name}>() + core::mem::size_of::<{flat}>() + tail_size;"
        )?;
        writeln!(
            out,
            "        check::expect_always(need <= buf.len(), ErrorKind::SmallBuffer)?;"
        )?;
        writeln!(
            out,
            "        let m = unsafe {{ &mut *(buf.as_mut_ptr() as *mut {name}) }};"
        )?;
        writeln!(out, "        m.v = Version {{ v: Self::VERSION }};")?;
        writeln!(out, "        m.alloc = Allocator::new(")?;
        writeln!(out, "            core::mem::size_of::<{flat}>(),")?;
        writeln!(
            out,
            "            core::mem::size_of::<{flat}>() + tail_size,"
        )?;
        writeln!(out, "        )?;")?;
        writeln!(
            out,
            "        unsafe {{ mem::zero(m.flat_ptr() as *mut u8, core::mem::size_of::<{flat}>() + tail_size) }};"
        )?;
        writeln!(out, "        Ok(m)")?;
        writeln!(out, "    }}")?;
        writeln!(out)?;
        writeln!(
            out,
            "    /// Attach to a message somebody else wrote into `buf`."
        )?;
        writeln!(
            out,
            "    pub fn place_reader(buf: &mut [u8]) -> Result<&mut {name}, Error> {{"
        )?;
        writeln!(
            out,
            "        check::expect_always(core::mem::size_of::<{name}>() <= buf.len(), ErrorKind::SmallBuffer)?;"
        )?;
        writeln!(
            out,
            "        let m = unsafe {{ &mut *(buf.as_mut_ptr() as *mut {name}) }};"
        )?;
        writeln!(
            out,
            "        check::expect_always(m.size() <= buf.len(), ErrorKind::SmallBuffer)?;"
        )?;
        writeln!(out, "        Ok(m)")?;
        writeln!(out, "    }}")?;
    } else {
        writeln!(
            out,
            "    pub fn place(buf: &mut [u8], _tail_size: usize) -> Result<&mut {name}, Error> {{"
        )?;
        writeln!(
            out,
            "        let need = core::mem::size_of::<{name}>() + core::mem::size_of::<{flat}>();"
        )?;
        writeln!(
            out,
            "        check::expect_always(need <= buf.len(), ErrorKind::SmallBuffer)?;"
        )?;
        writeln!(
            out,
            "        let m = unsafe {{ &mut *(buf.as_mut_ptr() as *mut {name}) }};"
        )?;
        writeln!(out, "        m.v = Version {{ v: Self::VERSION }};")?;
        writeln!(out, "        m._pad = [0; 4];")?;
        writeln!(
            out,
            "        unsafe {{ mem::zero(m.flat_ptr() as *mut u8, core::mem::size_of::<{flat}>()) }};"
        )?;
        writeln!(out, "        Ok(m)")?;
        writeln!(out, "    }}")?;
        writeln!(out)?;
        writeln!(
            out,
            "    pub fn place_reader(buf: &mut [u8]) -> Result<&mut {name}, Error> {{"
        )?;
        writeln!(
            out,
            "        let need = core::mem::size_of::<{name}>() + core::mem::size_of::<{flat}>();"
        )?;
        writeln!(
            out,
            "        check::expect_always(need <= buf.len(), ErrorKind::SmallBuffer)?;"
        )?;
        writeln!(
            out,
            "        Ok(unsafe {{ &mut *(buf.as_mut_ptr() as *mut {name}) }})"
        )?;
        writeln!(out, "    }}")?;
    }

    writeln!(out)?;
    writeln!(out, "    pub fn flat_ptr(&self) -> *mut {flat} {{")?;
    writeln!(
        out,
        "        (self as *const {name} as *mut u8).wrapping_add(core::mem::size_of::<{name}>()) as *mut {flat}"
    )?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    pub fn flat(&mut self) -> &mut {flat} {{")?;
    writeln!(out, "        unsafe {{ &mut *self.flat_ptr() }}")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    pub fn direct(&mut self) -> {fdirect}<'_> {{")?;
    if allo {
        writeln!(
            out,
            "        unsafe {{ {fdirect}::from_parts(self.flat_ptr(), &mut self.alloc) }}"
        )?;
    } else {
        writeln!(
            out,
            "        unsafe {{ {fdirect}::from_parts(self.flat_ptr(), core::ptr::null_mut()) }}"
        )?;
    }
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    pub fn version(&self) -> i32 {{")?;
    writeln!(out, "        self.v.v")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    pub fn current_size(&self) -> usize {{")?;
    if allo {
        writeln!(
            out,
            "        core::mem::size_of::<{name}>() + self.alloc.next as usize"
        )?;
    } else {
        writeln!(
            out,
            "        core::mem::size_of::<{name}>() + core::mem::size_of::<{flat}>()"
        )?;
    }
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    pub fn current_capacity(&self) -> usize {{")?;
    if allo {
        writeln!(out, "        self.alloc.capacity()")?;
    } else {
        writeln!(out, "        0")?;
    }
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    pub fn size(&self) -> usize {{")?;
    if allo {
        writeln!(
            out,
            "        core::mem::size_of::<{name}>() + self.alloc.max as usize"
        )?;
    } else {
        writeln!(
            out,
            "        core::mem::size_of::<{name}>() + core::mem::size_of::<{flat}>()"
        )?;
    }
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(
        out,
        "    /// Bytewise copy of exactly `size()` bytes into `dst`."
    )?;
    writeln!(
        out,
        "    pub fn clone_into<'b>(&self, dst: &'b mut [u8]) -> Result<&'b mut {name}, Error> {{"
    )?;
    writeln!(
        out,
        "        check::expect_always(self.size() <= dst.len(), ErrorKind::SmallBuffer)?;"
    )?;
    writeln!(out, "        unsafe {{")?;
    writeln!(out, "            core::ptr::copy_nonoverlapping(")?;
    writeln!(out, "                self as *const {name} as *const u8,")?;
    writeln!(out, "                dst.as_mut_ptr(),")?;
    writeln!(out, "                self.size(),")?;
    writeln!(out, "            );")?;
    writeln!(out, "        }}")?;
    writeln!(
        out,
        "        Ok(unsafe {{ &mut *(dst.as_mut_ptr() as *mut {name}) }})"
    )?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    writeln!(out)?;

    writeln!(
        out,
        "pub fn place_{name}(buf: &mut [u8], tail_size: usize) -> Result<&mut {name}, Error> {{"
    )?;
    writeln!(out, "    {name}::place(buf, tail_size)")?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(
        out,
        "pub fn place_{name}_reader(buf: &mut [u8]) -> Result<&mut {name}, Error> {{"
    )?;
    writeln!(out, "    {name}::place_reader(buf)")?;
    writeln!(out, "}}")?;
    writeln!(out)
}
