use core::fmt::{self, Write};

use crate::ir::{tag, Context, FlatId, TypeId, TypeKind};

/// One live field of a flat with everything a reader needs to address it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldEntry {
    pub index: u32,
    pub offset: u32,
    pub size: u32,
    pub type_tag: u32,
    pub count: u32,
    pub name: String,
    pub type_rep: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatHeader {
    pub name: String,
    /// Live entries.
    pub number_of_fields: u32,
    /// Total field slots, tombstones included.
    pub version: u32,
}

/// Compiler-side record of a flat's computed layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectMap {
    pub head: FlatHeader,
    pub fields: Vec<FieldEntry>,
}

pub fn object_map(ctx: &Context, fid: FlatId) -> ObjectMap {
    let flt = ctx.flat(fid);
    let fields = ctx.effective_fields(fid);
    let mut entries = Vec::new();
    for f in fields {
        if f.status.is_tombstone() {
            continue;
        }
        let Some(tid) = f.typ else { continue };
        entries.push(FieldEntry {
            index: f.index,
            offset: f.offset,
            size: f.size,
            type_tag: type_tag(ctx, tid),
            count: ctx.typ(tid).count,
            name: f.name.clone(),
            type_rep: type_rep(ctx, tid),
        });
    }
    ObjectMap {
        head: FlatHeader {
            name: flt.name.clone(),
            number_of_fields: entries.len() as u32,
            version: fields.len() as u32,
        },
        fields: entries,
    }
}

pub fn type_tag(ctx: &Context, tid: TypeId) -> u32 {
    match ctx.typ(tid).kind {
        TypeKind::Undefined(_) => tag::UNDEFINED,
        TypeKind::Scalar { tag, .. } => tag,
        TypeKind::String => tag::STRING,
        TypeKind::Vector(_) => tag::VECTOR,
        TypeKind::Optional(_) => tag::OPTIONAL,
        TypeKind::Array(_) => tag::ARRAY,
        TypeKind::Varray(_) => tag::VARRAY,
        TypeKind::Flat(_) => tag::FLAT,
        TypeKind::Variant(_) => tag::VARIANT,
        TypeKind::View(_) => tag::VIEW,
        TypeKind::Message(_) => tag::MESSAGE,
        TypeKind::Enumeration(_) => tag::ENUMERATION,
    }
}

/// Schema-syntax spelling of a type, e.g. `optional<vector<int32>>[10]`.
pub fn type_rep(ctx: &Context, tid: TypeId) -> String {
    let t = ctx.typ(tid);
    let mut s = match &t.kind {
        TypeKind::Vector(inner) => format!("vector<{}>", type_rep(ctx, *inner)),
        TypeKind::Optional(inner) => format!("optional<{}>", type_rep(ctx, *inner)),
        TypeKind::Varray(inner) => {
            format!("fixed_vector<{}, {}>", type_rep(ctx, *inner), t.count)
        }
        TypeKind::Array(inner) => return format!("{}[{}]", type_rep(ctx, *inner), t.count),
        _ => t.name.clone(),
    };
    if t.count > 1 {
        s.push_str(&format!("[{}]", t.count));
    }
    s
}

/// Debug rendering of an object map.
pub fn print(map: &ObjectMap, out: &mut impl Write) -> fmt::Result {
    writeln!(
        out,
        "map {} : fields={} version={}",
        map.head.name, map.head.number_of_fields, map.head.version
    )?;
    for f in &map.fields {
        writeln!(
            out,
            "  {:>3}  offset {:>4}  size {:>4}  tag {:>3}  {} : {}",
            f.index, f.offset, f.size, f.type_tag, f.name, f.type_rep
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{layout, lexer::lex, parser::parse};

    fn build(source: &str) -> Context {
        let mut ctx = Context::new();
        parse(&mut ctx, lex(source).unwrap()).unwrap();
        layout::layout(&mut ctx).unwrap();
        ctx
    }

    #[test]
    fn entries_and_version() {
        let ctx = build("A : flat { x:int32 y:int32 delete x }");
        let m = object_map(&ctx, ctx.order[0]);
        assert_eq!(m.head.number_of_fields, 1);
        // deleted slot and its tombstone still count toward the version
        assert_eq!(m.head.version, 3);
        assert_eq!(m.fields[0].name, "y");
        assert_eq!(m.fields[0].index, 1);
        assert_eq!(m.fields[0].type_tag, tag::INT32);
    }

    #[test]
    fn type_representations() {
        let ctx = build("A : flat { z : optional<int32>[5] f : fixed_vector<char, 3> }");
        let m = object_map(&ctx, ctx.order[0]);
        assert_eq!(m.fields[0].type_rep, "optional<int32>[5]");
        assert_eq!(m.fields[1].type_rep, "fixed_vector<char, 3>");
    }

    #[test]
    fn view_map_uses_underlying_offsets() {
        let ctx = build("F : flat { a:int32 b:int64 } v : view of F { b }");
        let m = object_map(&ctx, ctx.order[1]);
        assert_eq!(m.fields.len(), 1);
        assert_eq!(m.fields[0].index, 1);
        assert_eq!(m.fields[0].offset, 8);
    }
}
