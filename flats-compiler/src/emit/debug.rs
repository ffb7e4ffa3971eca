use core::fmt::{self, Write};

use crate::{
    ir::{Context, Field, FlatId, FlatKind, Status},
    map,
};

fn field_text(ctx: &Context, f: &Field) -> String {
    match f.status {
        Status::Deleting => format!("{{ delete {} }}", f.name),
        Status::Deprecating => format!("{{ deprecate {} }}", f.name),
        _ => {
            let prefix = match f.status {
                Status::Deleted => "deleted ",
                Status::Deprecated => "deprecated ",
                _ => "",
            };
            match f.typ {
                Some(tid) => format!("{{ {}{} : {} }}", prefix, f.name, map::type_rep(ctx, tid)),
                None => format!("{{ {}{} }}", prefix, f.name),
            }
        }
    }
}

/// Print a declaration back as schema text.
pub fn print_flat(ctx: &Context, fid: FlatId, out: &mut String) -> fmt::Result {
    let flt = ctx.flat(fid);
    match flt.kind {
        FlatKind::Flat | FlatKind::Variant => {
            let kw = if flt.kind == FlatKind::Flat {
                "flat"
            } else {
                "variant"
            };
            writeln!(out, "{} : {} {{", flt.name, kw)?;
            for f in &flt.fields {
                writeln!(out, "  {}", field_text(ctx, f))?;
            }
            writeln!(out, "}}")
        }
        FlatKind::Enumeration => {
            write!(out, "{} : enum {{ ", flt.name)?;
            for f in &flt.fields {
                write!(out, "{}:{} ", f.name, f.value)?;
            }
            writeln!(out, "}}")
        }
        FlatKind::View | FlatKind::Message => {
            let kw = if flt.kind == FlatKind::View {
                "view"
            } else {
                "message"
            };
            let target = flt
                .underlying
                .map(|t| ctx.typ(t).name.clone())
                .unwrap_or_default();
            writeln!(out, "{} : {} of {}", flt.name, kw, target)
        }
        FlatKind::Undefined => Ok(()),
    }
}
