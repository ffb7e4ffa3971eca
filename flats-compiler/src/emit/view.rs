use core::fmt::{self, Write};

use super::names::{rust_type, view_name};
use crate::ir::{Context, FlatId, TypeKind};

/// Accessor reading a flat through an externally supplied offset table,
/// indexed by field ordinal. Readers tolerate schema evolution: fields they
/// don't know simply have no getter.
pub fn emit(ctx: &Context, fid: FlatId, out: &mut String) -> fmt::Result {
    let flt = ctx.flat(fid);
    let name = view_name(&flt.name);

    writeln!(out, "pub struct {name}<'a> {{")?;
    writeln!(out, "    m: &'a [Offset],")?;
    writeln!(out, "    buf: *const u8,")?;
    writeln!(out, "    _marker: PhantomData<&'a [u8]>,")?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, "impl<'a> {name}<'a> {{")?;
    writeln!(out, "    pub fn new(m: &'a [Offset], buf: &'a [u8]) -> Self {{")?;
    writeln!(
        out,
        "        Self {{ m, buf: buf.as_ptr(), _marker: PhantomData }}"
    )?;
    writeln!(out, "    }}")?;

    for f in ctx.effective_fields(fid) {
        if f.status.is_tombstone() {
            continue;
        }
        let Some(tid) = f.typ else { continue };
        // variants are only reachable through direct accessors
        if matches!(ctx.typ(tid).kind, TypeKind::Variant(_)) {
            continue;
        }
        let rt = rust_type(ctx, tid);
        writeln!(out)?;
        writeln!(out, "    pub fn {}(&self) -> &'a {rt} {{", f.name)?;
        writeln!(
            out,
            "        unsafe {{ mem::read_ref(self.buf, self.m[{}] as usize) }}",
            f.index
        )?;
        writeln!(out, "    }}")?;
    }
    writeln!(out, "}}")?;
    writeln!(out)
}
