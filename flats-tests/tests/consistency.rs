//! The layout engine's computed offsets must agree with the layout the Rust
//! compiler gives the emitted structs.

use flats_compiler::analyze;
use flats_tests::record::{Pair, Rec, Sel, M};

const SCHEMA: &str = "
Pair : flat { x:int32 y:int32 }
Sel : variant { i:int32 ; s:string }
Rec : flat {
    n : int32
    s : string
    v : vector<int32>
    fv : fixed_vector<int32, 4>
    op : optional<int32>
    w : Sel
    pairs : Pair[2]
}
M : message of Rec
";

#[test]
fn computed_sizes_match_rust_layout() {
    let ctx = analyze(SCHEMA, false).unwrap();

    let pair = ctx.flat(ctx.order[0]);
    assert_eq!(
        ctx.typ(pair.self_type).size as usize,
        core::mem::size_of::<Pair>()
    );
    let sel = ctx.flat(ctx.order[1]);
    assert_eq!(
        ctx.typ(sel.self_type).size as usize,
        core::mem::size_of::<Sel>()
    );
    let rec = ctx.flat(ctx.order[2]);
    assert_eq!(
        ctx.typ(rec.self_type).size as usize,
        core::mem::size_of::<Rec>()
    );
}

#[test]
fn computed_offsets_match_rust_layout() {
    let ctx = analyze(SCHEMA, false).unwrap();
    let rec = ctx.flat(ctx.order[2]);

    let value: Rec = unsafe { core::mem::zeroed() };
    let base = &value as *const Rec as usize;
    let actual = [
        core::ptr::addr_of!(value.n) as usize - base,
        core::ptr::addr_of!(value.s) as usize - base,
        core::ptr::addr_of!(value.v) as usize - base,
        core::ptr::addr_of!(value.fv) as usize - base,
        core::ptr::addr_of!(value.op) as usize - base,
        core::ptr::addr_of!(value.w) as usize - base,
        core::ptr::addr_of!(value.pairs) as usize - base,
    ];
    let computed: Vec<usize> = rec.live_fields().map(|f| f.offset as usize).collect();
    assert_eq!(computed, actual);
}

#[test]
fn message_version_counts_all_field_slots() {
    let ctx = analyze(SCHEMA, false).unwrap();
    let m = flats_compiler::map::object_map(&ctx, ctx.order[3]);
    assert_eq!(m.head.version as i32, M::VERSION);
    assert_eq!(m.head.number_of_fields, 7);
}
