use core::fmt::{self, Write};

use super::names::{direct_name, rust_type, scalarish};
use crate::ir::{Context, FlatId, TypeId, TypeKind};

/// The variant layout struct: a `{utag, pos}` header. Alternatives live in
/// the tail and overlap; setting one selects it.
pub fn emit_variant(ctx: &Context, fid: FlatId, out: &mut String) -> fmt::Result {
    let flt = ctx.flat(fid);
    let name = &flt.name;

    writeln!(out, "#[repr(C)]")?;
    writeln!(out, "pub struct {name} {{")?;
    writeln!(out, "    hdr: variant::Header,")?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, "unsafe impl flats::Flat for {name} {{}}")?;
    writeln!(out)?;
    writeln!(out, "impl {name} {{")?;
    writeln!(out, "    pub fn tag(&self) -> u8 {{")?;
    writeln!(out, "        self.hdr.tag()")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    pub fn is_present(&self) -> bool {{")?;
    writeln!(out, "        self.hdr.is_present()")?;
    writeln!(out, "    }}")?;

    for alt in flt.live_fields() {
        let Some(tid) = alt.typ else { continue };
        writeln!(out)?;
        // alternatives are numbered from one; zero is "nothing set"
        emit_alternative(ctx, &alt.name, tid, alt.index + 1, out)?;
    }
    writeln!(out, "}}")?;
    writeln!(out)
}

fn emit_alternative(
    ctx: &Context,
    an: &str,
    tid: TypeId,
    ord: u32,
    out: &mut String,
) -> fmt::Result {
    match ctx.typ(tid).kind {
        TypeKind::String => {
            writeln!(
                out,
                "    pub fn set_{an}(&mut self, allo: &mut Allocator, arg: &str) -> Result<(), Error> {{"
            )?;
            writeln!(out, "        self.hdr.set_string(allo, {ord}, arg)")?;
            writeln!(out, "    }}")?;
            writeln!(out)?;
            writeln!(out, "    pub fn {an}(&self) -> Result<Span<'_, u8>, Error> {{")?;
            writeln!(out, "        self.hdr.string({ord})")?;
            writeln!(out, "    }}")
        }
        TypeKind::Vector(inner) => {
            let rt = rust_type(ctx, tid);
            let it = rust_type(ctx, inner);
            if scalarish(ctx, inner) {
                writeln!(
                    out,
                    "    pub fn set_{an}(&mut self, allo: &mut Allocator, arg: &[{it}]) -> Result<(), Error> {{"
                )?;
                writeln!(
                    out,
                    "        let p = self.hdr.alloc_zeroed::<{rt}>(allo, {ord})?;"
                )?;
                writeln!(out, "        unsafe {{ (*p).init_from_slice(allo, arg) }}")?;
                writeln!(out, "    }}")?;
                writeln!(out)?;
            }
            writeln!(out, "    pub fn {an}(&self) -> Result<Span<'_, {it}>, Error> {{")?;
            writeln!(out, "        self.hdr.vector_span({ord})")?;
            writeln!(out, "    }}")
        }
        TypeKind::Array(inner) | TypeKind::Varray(inner) => {
            let rt = rust_type(ctx, tid);
            let it = rust_type(ctx, inner);
            if scalarish(ctx, inner) {
                writeln!(
                    out,
                    "    pub fn set_{an}(&mut self, allo: &mut Allocator, arg: &[{it}]) -> Result<(), Error> {{"
                )?;
                writeln!(
                    out,
                    "        let p = self.hdr.alloc_zeroed::<{rt}>(allo, {ord})?;"
                )?;
                writeln!(out, "        unsafe {{ (*p).init_from_slice(arg) }}")?;
                writeln!(out, "    }}")?;
                writeln!(out)?;
            }
            writeln!(out, "    pub fn {an}(&self) -> Result<Span<'_, {it}>, Error> {{")?;
            writeln!(out, "        let p = self.hdr.alternative::<{rt}>({ord})?;")?;
            writeln!(out, "        Ok(unsafe {{ (*p).span() }})")?;
            writeln!(out, "    }}")
        }
        TypeKind::Flat(inner) | TypeKind::Variant(inner) => {
            let iname = &ctx.flat(inner).name;
            let idirect = direct_name(iname);
            writeln!(
                out,
                "    pub fn set_{an}<'s>(&'s mut self, allo: &'s mut Allocator) -> Result<{idirect}<'s>, Error> {{"
            )?;
            writeln!(
                out,
                "        let p = self.hdr.alloc_zeroed::<{iname}>(allo, {ord})?;"
            )?;
            writeln!(out, "        Ok(unsafe {{ {idirect}::from_parts(p, allo) }})")?;
            writeln!(out, "    }}")?;
            writeln!(out)?;
            writeln!(
                out,
                "    pub fn {an}<'s>(&'s mut self, allo: &'s mut Allocator) -> Result<{idirect}<'s>, Error> {{"
            )?;
            writeln!(
                out,
                "        let p = self.hdr.alternative_mut::<{iname}>({ord})?;"
            )?;
            writeln!(out, "        Ok(unsafe {{ {idirect}::from_parts(p, allo) }})")?;
            writeln!(out, "    }}")
        }
        _ => {
            let rt = rust_type(ctx, tid);
            writeln!(
                out,
                "    pub fn set_{an}(&mut self, allo: &mut Allocator, arg: {rt}) -> Result<(), Error> {{"
            )?;
            writeln!(out, "        self.hdr.set_value(allo, {ord}, arg)")?;
            writeln!(out, "    }}")?;
            writeln!(out)?;
            writeln!(out, "    pub fn {an}(&self) -> Result<{rt}, Error> {{")?;
            writeln!(out, "        self.hdr.value({ord})")?;
            writeln!(out, "    }}")
        }
    }
}

/// Wrapper that carries the allocator alongside the variant, so alternatives
/// can be set without passing it at every call.
pub fn emit_direct(ctx: &Context, fid: FlatId, out: &mut String) -> fmt::Result {
    let flt = ctx.flat(fid);
    let name = &flt.name;
    let dname = direct_name(name);

    writeln!(out, "pub struct {dname}<'a> {{")?;
    writeln!(out, "    var: *mut {name},")?;
    writeln!(out, "    allo: *mut Allocator,")?;
    writeln!(out, "    _marker: PhantomData<&'a mut {name}>,")?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, "impl<'a> {dname}<'a> {{")?;
    writeln!(out, "    pub fn tag(&self) -> u8 {{")?;
    writeln!(out, "        unsafe {{ (*self.var).tag() }}")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    pub fn is_present(&self) -> bool {{")?;
    writeln!(out, "        unsafe {{ (*self.var).is_present() }}")?;
    writeln!(out, "    }}")?;

    for alt in flt.live_fields() {
        let Some(tid) = alt.typ else { continue };
        let an = &alt.name;
        writeln!(out)?;
        match ctx.typ(tid).kind {
            TypeKind::String => {
                writeln!(
                    out,
                    "    pub fn set_{an}(&mut self, arg: &str) -> Result<(), Error> {{"
                )?;
                writeln!(
                    out,
                    "        unsafe {{ (*self.var).set_{an}(&mut *self.allo, arg) }}"
                )?;
                writeln!(out, "    }}")?;
                writeln!(out)?;
                writeln!(out, "    pub fn {an}(&self) -> Result<Span<'_, u8>, Error> {{")?;
                writeln!(out, "        unsafe {{ (*self.var).{an}() }}")?;
                writeln!(out, "    }}")?;
            }
            TypeKind::Vector(inner) | TypeKind::Array(inner) | TypeKind::Varray(inner) => {
                let it = rust_type(ctx, inner);
                if scalarish(ctx, inner) {
                    writeln!(
                        out,
                        "    pub fn set_{an}(&mut self, arg: &[{it}]) -> Result<(), Error> {{"
                    )?;
                    writeln!(
                        out,
                        "        unsafe {{ (*self.var).set_{an}(&mut *self.allo, arg) }}"
                    )?;
                    writeln!(out, "    }}")?;
                }
                writeln!(out)?;
                writeln!(
                    out,
                    "    pub fn {an}(&self) -> Result<Span<'_, {it}>, Error> {{"
                )?;
                writeln!(out, "        unsafe {{ (*self.var).{an}() }}")?;
                writeln!(out, "    }}")?;
            }
            TypeKind::Flat(inner) | TypeKind::Variant(inner) => {
                let idirect = direct_name(&ctx.flat(inner).name);
                writeln!(
                    out,
                    "    pub fn set_{an}(&mut self) -> Result<{idirect}<'_>, Error> {{"
                )?;
                writeln!(
                    out,
                    "        unsafe {{ (*self.var).set_{an}(&mut *self.allo) }}"
                )?;
                writeln!(out, "    }}")?;
                writeln!(out)?;
                writeln!(
                    out,
                    "    pub fn {an}(&mut self) -> Result<{idirect}<'_>, Error> {{"
                )?;
                writeln!(out, "        unsafe {{ (*self.var).{an}(&mut *self.allo) }}")?;
                writeln!(out, "    }}")?;
            }
            _ => {
                let rt = rust_type(ctx, tid);
                writeln!(
                    out,
                    "    pub fn set_{an}(&mut self, arg: {rt}) -> Result<(), Error> {{"
                )?;
                writeln!(
                    out,
                    "        unsafe {{ (*self.var).set_{an}(&mut *self.allo, arg) }}"
                )?;
                writeln!(out, "    }}")?;
                writeln!(out)?;
                writeln!(out, "    pub fn {an}(&self) -> Result<{rt}, Error> {{")?;
                writeln!(out, "        unsafe {{ (*self.var).{an}() }}")?;
                writeln!(out, "    }}")?;
            }
        }
    }
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, "impl<'a> Direct for {dname}<'a> {{")?;
    writeln!(out, "    type Target = {name};")?;
    writeln!(
        out,
        "    unsafe fn from_parts(target: *mut {name}, allo: *mut Allocator) -> Self {{"
    )?;
    writeln!(out, "        Self {{ var: target, allo, _marker: PhantomData }}")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    writeln!(out)
}
