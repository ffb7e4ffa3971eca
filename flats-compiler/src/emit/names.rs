use crate::ir::{Context, TypeId, TypeKind};

/// The Rust spelling of a field type in generated code.
pub fn rust_type(ctx: &Context, tid: TypeId) -> String {
    let t = ctx.typ(tid);
    match &t.kind {
        TypeKind::Scalar { rust, .. } => (*rust).into(),
        TypeKind::String => "FlatString".into(),
        TypeKind::Vector(inner) => format!("Vector<{}>", rust_type(ctx, *inner)),
        TypeKind::Optional(inner) => format!("Optional<{}>", rust_type(ctx, *inner)),
        TypeKind::Array(inner) => format!("Array<{}, {}>", rust_type(ctx, *inner), t.count),
        TypeKind::Varray(inner) => format!("FixedVec<{}, {}>", rust_type(ctx, *inner), t.count),
        TypeKind::Flat(_) | TypeKind::Variant(_) => t.name.clone(),
        // enumerations are carried as their value type
        TypeKind::Enumeration(_) => "i32".into(),
        TypeKind::View(_) | TypeKind::Message(_) | TypeKind::Undefined(_) => t.name.clone(),
    }
}

/// Types whose values can be passed around as plain arguments.
pub fn scalarish(ctx: &Context, tid: TypeId) -> bool {
    matches!(
        ctx.typ(tid).kind,
        TypeKind::Scalar { .. } | TypeKind::Enumeration(_)
    )
}

pub fn direct_name(name: &str) -> String {
    format!("{name}Direct")
}

pub fn view_name(name: &str) -> String {
    format!("{name}View")
}

pub fn optional_ref_name(name: &str) -> String {
    format!("Optional{name}Ref")
}
