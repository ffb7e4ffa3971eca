use crate::{
    error::{CompileError, CompileErrorKind},
    ir::{Context, FlatId, FlatKind, TypeId, TypeKind},
    map,
};

mod debug;
mod direct;
mod message;
mod names;
mod variant;
mod view;

/// What the compiler produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Schema text and object maps.
    Debug,
    Direct,
    Packed,
    View,
    PackedView,
}

impl Action {
    pub fn packed(self) -> bool {
        matches!(self, Action::Packed | Action::PackedView)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
    pub packed: bool,
    /// Track per-field initialization in direct accessors.
    pub init_check: bool,
}

const PRELUDE: &str = "\
// Generated by the flats schema compiler. Do not edit.
#![allow(dead_code, unused_imports, unused_variables)]
#![allow(non_camel_case_types, non_snake_case, non_upper_case_globals)]
#![allow(clippy::all)]

use core::marker::PhantomData;

use flats::preset::*;
use flats::{
    check, mem, variant, Allocator, Array, Direct, Error, ErrorKind, Extent, FixedVec,
    FlatString, Offset, Optional, Span, SpanMut, SpanRef, Vector, Version,
};

";

/// Emit the output for every declaration, in source order.
pub fn emit(ctx: &Context, action: Action, opts: &Options) -> Result<String, CompileError> {
    let mut out = String::new();
    if !matches!(action, Action::Debug) {
        out.push_str(PRELUDE);
    }
    for &fid in &ctx.order {
        emit_decl(ctx, fid, action, opts, &mut out).map_err(fmt_failure)?;
    }
    Ok(out)
}

/// Emit one output per declaration, for the one-file-per-type mode.
/// Declarations with no output for the chosen action are skipped.
pub fn emit_split(
    ctx: &Context,
    action: Action,
    opts: &Options,
) -> Result<Vec<(String, String)>, CompileError> {
    let mut files = Vec::new();
    for &fid in &ctx.order {
        let mut out = String::new();
        if !matches!(action, Action::Debug) {
            out.push_str(PRELUDE);
        }
        let before = out.len();
        emit_decl(ctx, fid, action, opts, &mut out).map_err(fmt_failure)?;
        if out.len() > before {
            files.push((ctx.flat(fid).name.clone(), out));
        }
    }
    Ok(files)
}

fn fmt_failure(_: core::fmt::Error) -> CompileError {
    CompileError::no_line(CompileErrorKind::Grammar("formatting failed".into()))
}

fn emit_decl(
    ctx: &Context,
    fid: FlatId,
    action: Action,
    opts: &Options,
    out: &mut String,
) -> core::fmt::Result {
    let kind = ctx.flat(fid).kind;
    match action {
        Action::Debug => {
            debug::print_flat(ctx, fid, out)?;
            let m = map::object_map(ctx, fid);
            map::print(&m, out)?;
            out.push('\n');
        }
        Action::Direct | Action::Packed => match kind {
            FlatKind::Flat => {
                direct::emit_struct(ctx, fid, opts, out)?;
                direct::emit_direct(ctx, fid, opts, out)?;
                if ctx.flat(fid).used_as_optional {
                    direct::emit_optional_ref(ctx, fid, out)?;
                }
            }
            FlatKind::Variant => {
                variant::emit_variant(ctx, fid, out)?;
                if !ctx.flat(fid).fields.is_empty() {
                    variant::emit_direct(ctx, fid, out)?;
                }
            }
            FlatKind::Message => message::emit(ctx, fid, out)?,
            FlatKind::Enumeration => direct::emit_enumeration(ctx, fid, out)?,
            // views only produce view accessors
            FlatKind::View | FlatKind::Undefined => {}
        },
        Action::View | Action::PackedView => match kind {
            FlatKind::Flat | FlatKind::View => view::emit(ctx, fid, out)?,
            _ => {}
        },
    }
    Ok(())
}

/// Does this type (transitively) take space from the message tail?
pub fn needs_allocator_type(ctx: &Context, tid: TypeId, seen: &mut Vec<FlatId>) -> bool {
    match ctx.typ(tid).kind {
        TypeKind::String | TypeKind::Vector(_) => true,
        // every variant alternative is allocated in the tail
        TypeKind::Variant(fid) => !ctx.flat(fid).fields.is_empty(),
        TypeKind::Flat(fid) => needs_allocator_flat(ctx, fid, seen),
        TypeKind::Optional(t) | TypeKind::Array(t) | TypeKind::Varray(t) => {
            needs_allocator_type(ctx, t, seen)
        }
        _ => false,
    }
}

pub fn needs_allocator_flat(ctx: &Context, fid: FlatId, seen: &mut Vec<FlatId>) -> bool {
    if seen.contains(&fid) {
        return false;
    }
    seen.push(fid);
    ctx.flat(fid)
        .live_fields()
        .filter_map(|f| f.typ)
        .any(|t| needs_allocator_type(ctx, t, seen))
}

pub fn needs_allocator(ctx: &Context, fid: FlatId) -> bool {
    needs_allocator_flat(ctx, fid, &mut Vec::new())
}
