use crate::{
    error::{CompileError, CompileErrorKind},
    ir::{
        Context, FlatId, FlatKind, TypeId, TypeKind, VariablePart, ENUM_ALIGN, ENUM_SIZE,
        FLAT_ALIGN, TAIL_MAX, VARIANT_ALIGN, VARIANT_SIZE, VARRAY_COUNTER_SIZE, VEC_HEADER_ALIGN,
        VEC_HEADER_SIZE,
    },
};

pub fn round_up(x: u32, align: u32) -> u32 {
    if align == 0 {
        return x;
    }
    (x + align - 1) / align * align
}

/// Compute offsets, sizes and tail bounds for every declaration.
///
/// Flats referenced before their definition are laid out on demand, so the
/// result is the same as for the reordered schema; a flat that (transitively)
/// contains itself is an error.
pub fn layout(ctx: &mut Context) -> Result<(), CompileError> {
    let order = ctx.order.clone();
    let mut busy = Vec::new();
    for fid in order {
        layout_flat(ctx, fid, &mut busy)?;
    }
    Ok(())
}

fn layout_flat(ctx: &mut Context, fid: FlatId, busy: &mut Vec<FlatId>) -> Result<(), CompileError> {
    if ctx.flat(fid).laid_out {
        return Ok(());
    }
    match ctx.flat(fid).kind {
        FlatKind::Enumeration => {
            ctx.flat_mut(fid).laid_out = true;
            return Ok(());
        }
        FlatKind::View | FlatKind::Message => {
            if let Some(under) = ctx.underlying_flat(fid) {
                layout_flat(ctx, under, busy)?;
                copy_view_offsets(ctx, fid, under);
            }
            ctx.flat_mut(fid).laid_out = true;
            return Ok(());
        }
        _ => {}
    }
    if busy.contains(&fid) {
        return Err(CompileError::no_line(CompileErrorKind::Recursive(
            ctx.flat(fid).name.clone(),
        )));
    }
    busy.push(fid);

    let packed = ctx.flat(fid).packed;
    let is_variant = ctx.flat(fid).kind == FlatKind::Variant;
    let mut position = 0u32;

    for i in 0..ctx.flat(fid).fields.len() {
        let (status, typ) = {
            let f = &ctx.flat(fid).fields[i];
            (f.status, f.typ)
        };
        if status.is_tombstone() {
            continue;
        }
        let Some(tid) = typ else { continue };
        let (size, align) = size_align(ctx, tid, busy)?;
        if !packed && position % align != 0 {
            position += align - position % align;
        }
        let f = &mut ctx.flat_mut(fid).fields[i];
        f.size = size;
        f.offset = position;
        // variant alternatives overlap; they live in the tail
        if !is_variant {
            position += size;
        }
    }

    let fixed = if is_variant {
        VARIANT_SIZE
    } else if packed {
        position
    } else {
        round_up(position, FLAT_ALIGN)
    };

    busy.pop();
    {
        let flt = ctx.flat_mut(fid);
        flt.var = VariablePart {
            start: fixed,
            next: fixed,
            max: TAIL_MAX,
        };
        flt.laid_out = true;
    }
    let self_type = ctx.flat(fid).self_type;
    let t = ctx.typ_mut(self_type);
    t.size = fixed;
    t.align = if is_variant { VARIANT_ALIGN } else { FLAT_ALIGN };
    log::debug!("laid out `{}`: fixed size {}", ctx.flat(fid).name, fixed);
    Ok(())
}

/// Subset views carry their own field list; give those fields the offsets
/// they have in the underlying flat.
fn copy_view_offsets(ctx: &mut Context, fid: FlatId, under: FlatId) {
    for i in 0..ctx.flat(fid).fields.len() {
        let name = ctx.flat(fid).fields[i].name.clone();
        if let Some(src) = ctx.flat(under).find(&name) {
            let (offset, size) = (src.offset, src.size);
            let f = &mut ctx.flat_mut(fid).fields[i];
            f.offset = offset;
            f.size = size;
        }
    }
}

/// Byte size and alignment of a field type, computing dependent flat
/// layouts as needed.
pub fn size_align(
    ctx: &mut Context,
    tid: TypeId,
    busy: &mut Vec<FlatId>,
) -> Result<(u32, u32), CompileError> {
    if ctx.typ(tid).align != 0 {
        return Ok((ctx.typ(tid).size, ctx.typ(tid).align));
    }
    let kind = ctx.typ(tid).kind;
    let count = ctx.typ(tid).count;
    let (size, align) = match kind {
        TypeKind::Scalar { .. } | TypeKind::String => (ctx.typ(tid).size, ctx.typ(tid).align),
        TypeKind::Vector(_) => (VEC_HEADER_SIZE, VEC_HEADER_ALIGN),
        TypeKind::Optional(inner) => {
            // one discriminator byte, padded so the value lands aligned
            let (s, a) = size_align(ctx, inner, busy)?;
            let a = a.max(1);
            (round_up(a + s, a), a)
        }
        TypeKind::Array(inner) => {
            let (s, a) = size_align(ctx, inner, busy)?;
            (s * count, a)
        }
        TypeKind::Varray(inner) => {
            // a 16-bit used counter in front of the slots
            let (s, a) = size_align(ctx, inner, busy)?;
            let a = a.max(VARRAY_COUNTER_SIZE);
            (round_up(a + count * s, a), a)
        }
        TypeKind::Flat(fid) => {
            layout_flat(ctx, fid, busy)?;
            (ctx.typ(ctx.flat(fid).self_type).size, FLAT_ALIGN)
        }
        TypeKind::Variant(_) => (VARIANT_SIZE, VARIANT_ALIGN),
        TypeKind::Enumeration(_) => (ENUM_SIZE, ENUM_ALIGN),
        TypeKind::View(_) | TypeKind::Message(_) => {
            return Err(CompileError::no_line(CompileErrorKind::Composition(
                format!("`{}` cannot be used as a field type", ctx.typ(tid).name),
            )))
        }
        TypeKind::Undefined(_) => {
            return Err(CompileError::no_line(CompileErrorKind::Lingering(
                ctx.typ(tid).name.clone(),
            )))
        }
    };
    let t = ctx.typ_mut(tid);
    t.size = size;
    t.align = align;
    Ok((size, align))
}
