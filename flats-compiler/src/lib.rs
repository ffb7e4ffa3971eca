//! Schema compiler for the Flats zero-copy binary message format.
//!
//! A schema describes record types (flats), tagged unions (variants),
//! enumerations, views and messages; [`compile`] turns it into Rust source
//! that reads and writes those records directly inside a caller-supplied
//! byte buffer, on top of the `flats` runtime crate.

pub mod catalog;
pub mod emit;
pub mod error;
pub mod ir;
pub mod layout;
pub mod lexer;
pub mod map;
pub mod parser;

pub use emit::{Action, Options};
pub use error::{CompileError, CompileErrorKind};

use ir::Context;

/// Parse and lay out a schema. Exposed for tools that inspect the IR
/// (offsets, sizes, object maps) without emitting code.
pub fn analyze(source: &str, packed: bool) -> Result<Context, CompileError> {
    let tokens = lexer::lex(source)?;
    let mut ctx = Context::new();
    parser::parse(&mut ctx, tokens)?;
    if packed {
        for fid in ctx.order.clone() {
            ctx.flat_mut(fid).packed = true;
        }
    }
    layout::layout(&mut ctx)?;
    Ok(ctx)
}

/// Compile a schema to output text for the given action.
pub fn compile(source: &str, action: Action, init_check: bool) -> Result<String, CompileError> {
    let packed = action.packed();
    let ctx = analyze(source, packed)?;
    log::debug!("parsed {} declarations", ctx.order.len());
    let opts = Options { packed, init_check };
    emit::emit(&ctx, action, &opts)
}

/// Compile a schema into one output per declaration (`name`, text) for the
/// one-file-per-type mode.
pub fn compile_split(
    source: &str,
    action: Action,
    init_check: bool,
) -> Result<Vec<(String, String)>, CompileError> {
    let packed = action.packed();
    let ctx = analyze(source, packed)?;
    let opts = Options { packed, init_check };
    emit::emit_split(&ctx, action, &opts)
}
