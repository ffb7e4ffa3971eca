use core::fmt::{self, Write};

use super::{
    names::{direct_name, optional_ref_name, rust_type, scalarish},
    needs_allocator, Options,
};
use crate::ir::{Context, Field, FlatId, TypeId, TypeKind};

/// How a field surfaces through the direct accessor.
enum Shape {
    Scalar,
    Str,
    ContainerScalar,
    /// Container of flats: element flat id.
    ContainerFlat(FlatId),
    NestedFlat(FlatId),
    VariantField(FlatId),
    OptionalFlat(FlatId),
    /// Any other optional: the inner type.
    OptionalOther(TypeId),
}

fn shape(ctx: &Context, tid: TypeId) -> Shape {
    match ctx.typ(tid).kind {
        TypeKind::String => Shape::Str,
        TypeKind::Flat(fid) => Shape::NestedFlat(fid),
        TypeKind::Variant(fid) => Shape::VariantField(fid),
        TypeKind::Vector(inner) | TypeKind::Array(inner) | TypeKind::Varray(inner) => {
            match ctx.typ(inner).kind {
                TypeKind::Flat(fid) => Shape::ContainerFlat(fid),
                _ => Shape::ContainerScalar,
            }
        }
        TypeKind::Optional(inner) => match ctx.typ(inner).kind {
            TypeKind::Flat(fid) => Shape::OptionalFlat(fid),
            _ => Shape::OptionalOther(inner),
        },
        _ => Shape::Scalar,
    }
}

/// The `#[repr(C)]` struct describing a flat's fixed layout.
pub fn emit_struct(
    ctx: &Context,
    fid: FlatId,
    opts: &Options,
    out: &mut String,
) -> fmt::Result {
    let flt = ctx.flat(fid);
    // every flat shares the same alignment; packed layouts drop all padding
    let repr = if opts.packed {
        "#[repr(C, packed)]"
    } else {
        "#[repr(C, align(8))]"
    };
    writeln!(out, "{repr}")?;
    writeln!(out, "pub struct {} {{", flt.name)?;
    for f in flt.live_fields() {
        let Some(tid) = f.typ else { continue };
        writeln!(out, "    pub {}: {},", f.name, rust_type(ctx, tid))?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, "unsafe impl flats::Flat for {} {{}}", flt.name)?;
    writeln!(out)
}

/// Enumerations carry only their name/value pairs.
pub fn emit_enumeration(ctx: &Context, fid: FlatId, out: &mut String) -> fmt::Result {
    let flt = ctx.flat(fid);
    writeln!(out, "pub struct {};", flt.name)?;
    writeln!(out)?;
    writeln!(out, "impl {} {{", flt.name)?;
    for f in &flt.fields {
        writeln!(out, "    pub const {}: i32 = {};", f.name, f.value)?;
    }
    writeln!(out, "}}")?;
    writeln!(out)
}

/// Non-owning wrapper exposing typed getters and placement setters over a
/// flat inside a buffer.
pub fn emit_direct(
    ctx: &Context,
    fid: FlatId,
    opts: &Options,
    out: &mut String,
) -> fmt::Result {
    let flt = ctx.flat(fid);
    let name = &flt.name;
    let dname = direct_name(name);
    let allo = needs_allocator(ctx, fid);

    writeln!(out, "pub struct {dname}<'a> {{")?;
    writeln!(out, "    mbuf: *mut {name},")?;
    if allo {
        writeln!(out, "    allo: *mut Allocator,")?;
    }
    if opts.init_check {
        writeln!(out, "    icheck: [u8; {}],", flt.fields.len())?;
    }
    writeln!(out, "    _marker: PhantomData<&'a mut {name}>,")?;
    writeln!(out, "}}")?;
    writeln!(out)?;

    writeln!(out, "impl<'a> {dname}<'a> {{")?;
    let icheck_init = if opts.init_check {
        format!("icheck: [0; {}], ", flt.fields.len())
    } else {
        String::new()
    };
    if allo {
        writeln!(
            out,
            "    pub fn new(mbuf: &'a mut {name}, allo: &'a mut Allocator) -> Self {{"
        )?;
        writeln!(
            out,
            "        Self {{ mbuf, allo, {icheck_init}_marker: PhantomData }}"
        )?;
    } else {
        writeln!(out, "    pub fn new(mbuf: &'a mut {name}) -> Self {{")?;
        writeln!(out, "        Self {{ mbuf, {icheck_init}_marker: PhantomData }}")?;
    }
    writeln!(out, "    }}")?;

    for f in flt.live_fields() {
        let Some(tid) = f.typ else { continue };
        writeln!(out)?;
        emit_getter(ctx, f, tid, allo, opts, out)?;
        emit_setters(ctx, f, tid, opts, out)?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;

    writeln!(out, "impl<'a> Direct for {dname}<'a> {{")?;
    writeln!(out, "    type Target = {name};")?;
    let allo_param = if allo { "allo" } else { "_allo" };
    writeln!(
        out,
        "    unsafe fn from_parts(target: *mut {name}, {allo_param}: *mut Allocator) -> Self {{"
    )?;
    let allo_field = if allo { "allo, " } else { "" };
    writeln!(
        out,
        "        Self {{ mbuf: target, {allo_field}{icheck_init}_marker: PhantomData }}"
    )?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    writeln!(out)
}

fn allo_expr(has_allo: bool) -> &'static str {
    if has_allo {
        "self.allo"
    } else {
        "core::ptr::null_mut()"
    }
}

fn emit_getter(
    ctx: &Context,
    f: &Field,
    tid: TypeId,
    has_allo: bool,
    opts: &Options,
    out: &mut String,
) -> fmt::Result {
    let n = &f.name;
    let check = if opts.init_check {
        format!(
            "        assert!(self.icheck[{}] != 0, \"field `{}` read before initialization\");\n",
            f.index, n
        )
    } else {
        String::new()
    };
    match shape(ctx, tid) {
        Shape::Scalar => {
            let rt = rust_type(ctx, tid);
            if opts.packed {
                writeln!(out, "    pub fn {n}(&self) -> {rt} {{")?;
                out.push_str(&check);
                writeln!(
                    out,
                    "        unsafe {{ core::ptr::addr_of!((*self.mbuf).{n}).read_unaligned() }}"
                )?;
            } else {
                writeln!(out, "    pub fn {n}(&mut self) -> &mut {rt} {{")?;
                out.push_str(&check);
                writeln!(out, "        unsafe {{ &mut (*self.mbuf).{n} }}")?;
            }
            writeln!(out, "    }}")
        }
        Shape::Str => {
            writeln!(out, "    pub fn {n}(&self) -> Span<'_, u8> {{")?;
            out.push_str(&check);
            writeln!(out, "        unsafe {{ (*self.mbuf).{n}.span() }}")?;
            writeln!(out, "    }}")
        }
        Shape::ContainerScalar => {
            let elem = container_elem(ctx, tid);
            let et = rust_type(ctx, elem);
            writeln!(out, "    pub fn {n}(&self) -> Span<'_, {et}> {{")?;
            out.push_str(&check);
            writeln!(out, "        unsafe {{ (*self.mbuf).{n}.span() }}")?;
            writeln!(out, "    }}")?;
            writeln!(out, "    pub fn {n}_mut(&mut self) -> SpanMut<'_, {et}> {{")?;
            writeln!(out, "        unsafe {{ (*self.mbuf).{n}.span_mut() }}")?;
            writeln!(out, "    }}")
        }
        Shape::ContainerFlat(elem_fid) => {
            let elem = &ctx.flat(elem_fid).name;
            let ed = direct_name(elem);
            writeln!(out, "    pub fn {n}(&self) -> SpanRef<'_, {ed}<'_>> {{")?;
            out.push_str(&check);
            writeln!(out, "        let a = unsafe {{ &mut (*self.mbuf).{n} }};")?;
            writeln!(
                out,
                "        unsafe {{ SpanRef::from_raw_parts(a.as_mut_ptr(), a.len(), {}) }}",
                allo_expr(has_allo)
            )?;
            writeln!(out, "    }}")
        }
        Shape::NestedFlat(nfid) => {
            let inner = &ctx.flat(nfid).name;
            let id = direct_name(inner);
            writeln!(out, "    pub fn {n}(&self) -> {id}<'_> {{")?;
            out.push_str(&check);
            writeln!(
                out,
                "        unsafe {{ {id}::from_parts(&mut (*self.mbuf).{n}, {}) }}",
                allo_expr(has_allo)
            )?;
            writeln!(out, "    }}")
        }
        Shape::VariantField(vfid) => {
            let vname = &ctx.flat(vfid).name;
            if ctx.flat(vfid).fields.is_empty() {
                writeln!(out, "    pub fn {n}(&mut self) -> &mut {vname} {{")?;
                out.push_str(&check);
                writeln!(out, "        unsafe {{ &mut (*self.mbuf).{n} }}")?;
            } else {
                let vd = direct_name(vname);
                writeln!(out, "    pub fn {n}(&self) -> {vd}<'_> {{")?;
                out.push_str(&check);
                writeln!(
                    out,
                    "        unsafe {{ {vd}::from_parts(&mut (*self.mbuf).{n}, {}) }}",
                    allo_expr(has_allo)
                )?;
            }
            writeln!(out, "    }}")
        }
        Shape::OptionalFlat(ofid) => {
            let inner = &ctx.flat(ofid).name;
            let rname = optional_ref_name(inner);
            writeln!(out, "    pub fn {n}(&self) -> {rname}<'_> {{")?;
            out.push_str(&check);
            writeln!(
                out,
                "        unsafe {{ {rname}::from_parts(&mut (*self.mbuf).{n}, {}) }}",
                allo_expr(has_allo)
            )?;
            writeln!(out, "    }}")
        }
        Shape::OptionalOther(inner) => {
            let it = rust_type(ctx, inner);
            writeln!(out, "    pub fn {n}(&mut self) -> &mut Optional<{it}> {{")?;
            out.push_str(&check);
            writeln!(out, "        unsafe {{ &mut (*self.mbuf).{n} }}")?;
            writeln!(out, "    }}")
        }
    }
}

fn container_elem(ctx: &Context, tid: TypeId) -> TypeId {
    match ctx.typ(tid).kind {
        TypeKind::Vector(inner) | TypeKind::Array(inner) | TypeKind::Varray(inner) => inner,
        _ => tid,
    }
}

fn mark(opts: &Options, f: &Field) -> String {
    if opts.init_check {
        format!("        self.icheck[{}] = 1;\n", f.index)
    } else {
        String::new()
    }
}

fn emit_setters(
    ctx: &Context,
    f: &Field,
    tid: TypeId,
    opts: &Options,
    out: &mut String,
) -> fmt::Result {
    let n = &f.name;
    let mark = mark(opts, f);
    match shape(ctx, tid) {
        Shape::Scalar => {
            let rt = rust_type(ctx, tid);
            writeln!(out, "    pub fn set_{n}(&mut self, arg: {rt}) {{")?;
            out.push_str(&mark);
            if opts.packed {
                writeln!(
                    out,
                    "        unsafe {{ core::ptr::addr_of_mut!((*self.mbuf).{n}).write_unaligned(arg) }};"
                )?;
            } else {
                writeln!(out, "        unsafe {{ (*self.mbuf).{n} = arg }};")?;
            }
            writeln!(out, "    }}")
        }
        Shape::Str => {
            writeln!(out, "    pub fn set_{n}(&mut self, arg: &str) -> Result<(), Error> {{")?;
            out.push_str(&mark);
            writeln!(
                out,
                "        unsafe {{ (*self.mbuf).{n}.init_str(&mut *self.allo, arg) }}"
            )?;
            writeln!(out, "    }}")?;
            emit_extent_and_push(ctx, f, tid, opts, out)
        }
        Shape::ContainerScalar | Shape::ContainerFlat(_) => {
            let elem = container_elem(ctx, tid);
            let flat_elem = matches!(ctx.typ(elem).kind, TypeKind::Flat(_));
            match ctx.typ(tid).kind {
                TypeKind::Vector(_) => {
                    if scalarish(ctx, elem) {
                        let et = rust_type(ctx, elem);
                        writeln!(
                            out,
                            "    pub fn set_{n}(&mut self, arg: &[{et}]) -> Result<(), Error> {{"
                        )?;
                        out.push_str(&mark);
                        writeln!(
                            out,
                            "        unsafe {{ (*self.mbuf).{n}.init_from_slice(&mut *self.allo, arg) }}"
                        )?;
                        writeln!(out, "    }}")?;
                    }
                    emit_extent_and_push(ctx, f, tid, opts, out)
                }
                TypeKind::Varray(_) => {
                    if scalarish(ctx, elem) {
                        let et = rust_type(ctx, elem);
                        writeln!(
                            out,
                            "    pub fn set_{n}(&mut self, arg: &[{et}]) -> Result<(), Error> {{"
                        )?;
                        out.push_str(&mark);
                        writeln!(
                            out,
                            "        unsafe {{ (*self.mbuf).{n}.init_from_slice(arg) }}"
                        )?;
                        writeln!(out, "    }}")?;
                        if is_byte(ctx, elem) {
                            writeln!(
                                out,
                                "    pub fn set_{n}_str(&mut self, arg: &str) -> Result<(), Error> {{"
                            )?;
                            out.push_str(&mark);
                            writeln!(
                                out,
                                "        unsafe {{ (*self.mbuf).{n}.init_str(arg) }}"
                            )?;
                            writeln!(out, "    }}")?;
                        }
                    }
                    emit_extent_and_push(ctx, f, tid, opts, out)
                }
                TypeKind::Array(_) => {
                    if !flat_elem {
                        if let TypeKind::Optional(oi) = ctx.typ(elem).kind {
                            // element-wise optional array
                            if scalarish(ctx, oi) {
                                let it = rust_type(ctx, oi);
                                writeln!(
                                    out,
                                    "    pub fn set_{n}(&mut self, arg: &[Option<{it}>]) -> Result<(), Error> {{"
                                )?;
                                out.push_str(&mark);
                                writeln!(out, "        let a = unsafe {{ &mut (*self.mbuf).{n} }};")?;
                                writeln!(
                                    out,
                                    "        check::expect(arg.len() == a.len(), ErrorKind::ArrayInitializer)?;"
                                )?;
                                writeln!(
                                    out,
                                    "        for (slot, item) in a.as_mut_slice().iter_mut().zip(arg) {{"
                                )?;
                                writeln!(out, "            match item {{")?;
                                writeln!(out, "                Some(value) => {{ slot.set(*value); }}")?;
                                writeln!(out, "                None => slot.set_empty(),")?;
                                writeln!(out, "            }}")?;
                                writeln!(out, "        }}")?;
                                writeln!(out, "        Ok(())")?;
                                writeln!(out, "    }}")?;
                            }
                        } else if scalarish(ctx, elem) {
                            let et = rust_type(ctx, elem);
                            writeln!(
                                out,
                                "    pub fn set_{n}(&mut self, arg: &[{et}]) -> Result<(), Error> {{"
                            )?;
                            out.push_str(&mark);
                            writeln!(
                                out,
                                "        unsafe {{ (*self.mbuf).{n}.init_from_slice(arg) }}"
                            )?;
                            writeln!(out, "    }}")?;
                        }
                        if is_byte(ctx, elem) {
                            writeln!(
                                out,
                                "    pub fn set_{n}_str(&mut self, arg: &str) -> Result<(), Error> {{"
                            )?;
                            out.push_str(&mark);
                            writeln!(out, "        unsafe {{ (*self.mbuf).{n}.init_str(arg) }}")?;
                            writeln!(out, "    }}")?;
                        }
                    }
                    Ok(())
                }
                _ => Ok(()),
            }
        }
        Shape::NestedFlat(_) => Ok(()),
        Shape::VariantField(vfid) => {
            // one setter per alternative that can be set by value
            let vflt = ctx.flat(vfid);
            if vflt.fields.is_empty() {
                return Ok(());
            }
            for alt in vflt.live_fields() {
                let Some(atid) = alt.typ else { continue };
                let an = &alt.name;
                match ctx.typ(atid).kind {
                    TypeKind::Flat(_) | TypeKind::Variant(_) | TypeKind::Optional(_) => {}
                    TypeKind::String => {
                        writeln!(
                            out,
                            "    pub fn set_{n}_{an}(&mut self, arg: &str) -> Result<(), Error> {{"
                        )?;
                        out.push_str(&mark);
                        writeln!(
                            out,
                            "        unsafe {{ (*self.mbuf).{n}.set_{an}(&mut *self.allo, arg) }}"
                        )?;
                        writeln!(out, "    }}")?;
                    }
                    TypeKind::Vector(inner)
                    | TypeKind::Array(inner)
                    | TypeKind::Varray(inner) => {
                        if scalarish(ctx, inner) {
                            let it = rust_type(ctx, inner);
                            writeln!(
                                out,
                                "    pub fn set_{n}_{an}(&mut self, arg: &[{it}]) -> Result<(), Error> {{"
                            )?;
                            out.push_str(&mark);
                            writeln!(
                                out,
                                "        unsafe {{ (*self.mbuf).{n}.set_{an}(&mut *self.allo, arg) }}"
                            )?;
                            writeln!(out, "    }}")?;
                        }
                    }
                    _ => {
                        let at = rust_type(ctx, atid);
                        writeln!(
                            out,
                            "    pub fn set_{n}_{an}(&mut self, arg: {at}) -> Result<(), Error> {{"
                        )?;
                        out.push_str(&mark);
                        writeln!(
                            out,
                            "        unsafe {{ (*self.mbuf).{n}.set_{an}(&mut *self.allo, arg) }}"
                        )?;
                        writeln!(out, "    }}")?;
                    }
                }
            }
            Ok(())
        }
        Shape::OptionalFlat(_) => {
            writeln!(out, "    pub fn set_{n}_empty(&mut self) {{")?;
            out.push_str(&mark);
            writeln!(out, "        unsafe {{ (*self.mbuf).{n}.set_empty() }};")?;
            writeln!(out, "    }}")?;
            writeln!(out, "    pub fn set_{n}_default(&mut self) {{")?;
            out.push_str(&mark);
            writeln!(out, "        unsafe {{ (*self.mbuf).{n}.set_zeroed() }};")?;
            writeln!(out, "    }}")
        }
        Shape::OptionalOther(inner) => {
            if scalarish(ctx, inner) {
                let it = rust_type(ctx, inner);
                writeln!(out, "    pub fn set_{n}(&mut self, arg: {it}) {{")?;
                out.push_str(&mark);
                writeln!(out, "        unsafe {{ (*self.mbuf).{n}.set(arg) }};")?;
                writeln!(out, "    }}")?;
            }
            if byte_array(ctx, inner) {
                writeln!(
                    out,
                    "    pub fn set_{n}_str(&mut self, arg: &str) -> Result<(), Error> {{"
                )?;
                out.push_str(&mark);
                writeln!(out, "        let o = unsafe {{ &mut (*self.mbuf).{n} }};")?;
                writeln!(out, "        o.set_zeroed().init_str(arg)")?;
                writeln!(out, "    }}")?;
            }
            writeln!(out, "    pub fn set_{n}_empty(&mut self) {{")?;
            out.push_str(&mark);
            writeln!(out, "        unsafe {{ (*self.mbuf).{n}.set_empty() }};")?;
            writeln!(out, "    }}")?;
            writeln!(out, "    pub fn set_{n}_default(&mut self) {{")?;
            out.push_str(&mark);
            writeln!(out, "        unsafe {{ (*self.mbuf).{n}.set_zeroed() }};")?;
            writeln!(out, "    }}")
        }
    }
}

/// Size constructor and appends for vectors, strings and fixed vectors.
fn emit_extent_and_push(
    ctx: &Context,
    f: &Field,
    tid: TypeId,
    opts: &Options,
    out: &mut String,
) -> fmt::Result {
    let n = &f.name;
    let mark = mark(opts, f);
    let elem = container_elem(ctx, tid);
    // a typed push only makes sense for elements expressible as plain values
    let push_type = match ctx.typ(tid).kind {
        TypeKind::String => Some("u8".to_string()),
        TypeKind::Vector(_) | TypeKind::Varray(_) if scalarish(ctx, elem) => {
            Some(rust_type(ctx, elem))
        }
        _ => None,
    };
    match ctx.typ(tid).kind {
        TypeKind::String | TypeKind::Vector(_) => {
            writeln!(
                out,
                "    pub fn {n}_extent(&mut self, arg: Extent) -> Result<(), Error> {{"
            )?;
            out.push_str(&mark);
            writeln!(
                out,
                "        unsafe {{ (*self.mbuf).{n}.init_extent(&mut *self.allo, arg) }}"
            )?;
            writeln!(out, "    }}")?;
            if let Some(et) = push_type {
                writeln!(
                    out,
                    "    pub fn {n}_push(&mut self, arg: {et}) -> Result<(), Error> {{"
                )?;
                writeln!(
                    out,
                    "        unsafe {{ (*self.mbuf).{n}.push(&mut *self.allo, arg) }}"
                )?;
                writeln!(out, "    }}")?;
            }
            writeln!(
                out,
                "    pub fn {n}_push_zeroed(&mut self) -> Result<(), Error> {{"
            )?;
            writeln!(
                out,
                "        unsafe {{ (*self.mbuf).{n}.push_zeroed(&mut *self.allo) }}"
            )?;
            writeln!(out, "    }}")
        }
        TypeKind::Varray(_) => {
            writeln!(
                out,
                "    pub fn {n}_extent(&mut self, arg: Extent) -> Result<(), Error> {{"
            )?;
            out.push_str(&mark);
            writeln!(out, "        unsafe {{ (*self.mbuf).{n}.init_extent(arg) }}")?;
            writeln!(out, "    }}")?;
            if let Some(et) = push_type {
                writeln!(
                    out,
                    "    pub fn {n}_push(&mut self, arg: {et}) -> Result<(), Error> {{"
                )?;
                writeln!(out, "        unsafe {{ (*self.mbuf).{n}.push(arg) }}")?;
                writeln!(out, "    }}")?;
            }
            writeln!(
                out,
                "    pub fn {n}_push_zeroed(&mut self) -> Result<(), Error> {{"
            )?;
            writeln!(out, "        unsafe {{ (*self.mbuf).{n}.push_zeroed() }}")?;
            writeln!(out, "    }}")
        }
        _ => Ok(()),
    }
}

fn is_byte(ctx: &Context, tid: TypeId) -> bool {
    matches!(ctx.typ(tid).kind, TypeKind::Scalar { rust: "u8", .. })
}

fn byte_array(ctx: &Context, tid: TypeId) -> bool {
    match ctx.typ(tid).kind {
        TypeKind::Array(inner) => is_byte(ctx, inner),
        _ => false,
    }
}

/// Accessor for a flat used behind `optional<...>`: getters delegate to the
/// flat's direct accessor after the presence check.
pub fn emit_optional_ref(ctx: &Context, fid: FlatId, out: &mut String) -> fmt::Result {
    let name = &ctx.flat(fid).name;
    let rname = optional_ref_name(name);
    let dname = direct_name(name);
    let allo_arg = if needs_allocator(ctx, fid) {
        "self.allo"
    } else {
        "core::ptr::null_mut()"
    };

    writeln!(out, "pub struct {rname}<'a> {{")?;
    writeln!(out, "    val: *mut Optional<{name}>,")?;
    writeln!(out, "    allo: *mut Allocator,")?;
    writeln!(out, "    _marker: PhantomData<&'a mut Optional<{name}>>,")?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, "impl<'a> {rname}<'a> {{")?;
    writeln!(out, "    pub fn is_present(&self) -> bool {{")?;
    writeln!(out, "        unsafe {{ (*self.val).is_present() }}")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    pub fn is_empty(&self) -> bool {{")?;
    writeln!(out, "        !self.is_present()")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    pub fn get(&self) -> Result<{dname}<'_>, Error> {{")?;
    writeln!(
        out,
        "        check::expect(self.is_present(), ErrorKind::OptionalNotPresent)?;"
    )?;
    writeln!(out, "        let p = unsafe {{ (*self.val).value_ptr() }};")?;
    writeln!(out, "        Ok(unsafe {{ {dname}::from_parts(p, {allo_arg}) }})")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    pub fn set_default(&mut self) -> {dname}<'_> {{")?;
    writeln!(out, "        let o = unsafe {{ &mut *self.val }};")?;
    writeln!(out, "        o.set_zeroed();")?;
    writeln!(
        out,
        "        unsafe {{ {dname}::from_parts(o.value_ptr(), {allo_arg}) }}"
    )?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    pub fn set_empty(&mut self) {{")?;
    writeln!(out, "        unsafe {{ (*self.val).set_empty() }};")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, "impl<'a> Direct for {rname}<'a> {{")?;
    writeln!(out, "    type Target = Optional<{name}>;")?;
    writeln!(
        out,
        "    unsafe fn from_parts(target: *mut Optional<{name}>, allo: *mut Allocator) -> Self {{"
    )?;
    writeln!(out, "        Self {{ val: target, allo, _marker: PhantomData }}")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    writeln!(out)
}
