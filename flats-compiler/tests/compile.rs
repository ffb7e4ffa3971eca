use flats_compiler::{analyze, compile, Action, CompileErrorKind};

fn direct(source: &str) -> String {
    compile(source, Action::Direct, false).unwrap()
}

#[test]
fn pair_scenario() {
    let ctx = analyze("Pair : flat { x:int32 y:int32 }", false).unwrap();
    let fid = ctx.order[0];
    let flt = ctx.flat(fid);
    assert_eq!(ctx.typ(flt.self_type).size, 8);
    assert_eq!(flt.fields[1].offset, 4);

    let out = direct("Pair : flat { x:int32 y:int32 }");
    assert!(out.contains("pub struct Pair {"));
    assert!(out.contains("pub x: i32,"));
    assert!(out.contains("pub struct PairDirect<'a> {"));
    assert!(out.contains("pub fn x(&mut self) -> &mut i32 {"));
    assert!(out.contains("pub fn set_y(&mut self, arg: i32) {"));
    // nothing in Pair needs the tail
    assert!(!out.contains("allo: *mut Allocator,"));
}

#[test]
fn string_field_requires_allocator() {
    let ctx = analyze("S : flat { n:int32 s:string }", false).unwrap();
    assert_eq!(ctx.typ(ctx.flat(ctx.order[0]).self_type).size, 8);

    let out = direct("S : flat { n:int32 s:string }");
    assert!(out.contains("allo: *mut Allocator,"));
    assert!(out.contains("pub fn new(mbuf: &'a mut S, allo: &'a mut Allocator) -> Self {"));
    assert!(out.contains("pub fn set_s(&mut self, arg: &str) -> Result<(), Error> {"));
    assert!(out.contains("pub fn s_extent(&mut self, arg: Extent) -> Result<(), Error> {"));
    assert!(out.contains("pub fn s(&self) -> Span<'_, u8> {"));
}

#[test]
fn variant_emission() {
    let out = direct("V : variant { i:int32 ; s:string }\nM : flat { v:V }");
    assert!(out.contains("pub struct V {"));
    assert!(out.contains("hdr: variant::Header,"));
    // alternatives carry their 1-based ordinals
    assert!(out.contains("self.hdr.set_value(allo, 1, arg)"));
    assert!(out.contains("self.hdr.set_string(allo, 2, arg)"));
    assert!(out.contains("pub struct VDirect<'a> {"));
    // the containing flat reaches the variant through the carrying accessor
    assert!(out.contains("pub fn v(&self) -> VDirect<'_> {"));
    assert!(out.contains("pub fn set_v_i(&mut self, arg: i32) -> Result<(), Error> {"));
}

#[test]
fn enumeration_emits_values_only() {
    let out = direct("E : enum { a b:5 c }");
    assert!(out.contains("pub struct E;"));
    assert!(out.contains("pub const a: i32 = 0;"));
    assert!(out.contains("pub const b: i32 = 5;"));
    assert!(out.contains("pub const c: i32 = 6;"));
    assert!(!out.contains("EDirect"));
}

#[test]
fn enumerator_reference_resolves() {
    let ctx = analyze("E : enum { a b:5 c } Other : flat { k:int32 = E::c }", false).unwrap();
    let other = ctx.flat(ctx.order[1]);
    assert_eq!(other.fields[0].value, 6);
}

#[test]
fn message_envelope() {
    let out = direct("Rec : flat { n:int32 s:string }\nM : message of Rec");
    assert!(out.contains("pub struct M {"));
    assert!(out.contains("alloc: Allocator,"));
    assert!(out.contains("pub const VERSION: i32 = 2;"));
    assert!(out.contains("pub fn place(buf: &mut [u8], tail_size: usize) -> Result<&mut M, Error> {"));
    assert!(out.contains("pub fn place_reader(buf: &mut [u8]) -> Result<&mut M, Error> {"));
    assert!(out.contains("pub fn clone_into<'b>(&self, dst: &'b mut [u8]) -> Result<&'b mut M, Error> {"));
    assert!(out.contains("pub fn place_M(buf: &mut [u8], tail_size: usize) -> Result<&mut M, Error> {"));
    assert!(out.contains("pub fn direct(&mut self) -> RecDirect<'_> {"));
}

#[test]
fn message_without_tail_has_no_allocator() {
    let out = direct("P : flat { x:int32 }\nM : message of P");
    assert!(out.contains("_pad: [u8; 4],"));
    assert!(!out.contains("alloc: Allocator,"));
}

#[test]
fn view_emission() {
    let out = compile(
        "F : flat { a:int32 b:int64 } v : view of F { b }",
        Action::View,
        false,
    )
    .unwrap();
    assert!(out.contains("pub struct FView<'a> {"));
    assert!(out.contains("pub struct vView<'a> {"));
    // the subset getter addresses the table by the original ordinal
    assert!(out.contains("self.m[1] as usize"));
    assert!(out.contains("pub fn b(&self) -> &'a i64 {"));
}

#[test]
fn packed_wired_through() {
    let out = compile("A : flat { a:int8 b:int64 }", Action::Packed, false).unwrap();
    assert!(out.contains("#[repr(C, packed)]"));
    assert!(out.contains("read_unaligned()"));

    let ctx = analyze("A : flat { a:int8 b:int64 }", true).unwrap();
    let flt = ctx.flat(ctx.order[0]);
    assert_eq!(flt.fields[1].offset, 1);
    assert_eq!(ctx.typ(flt.self_type).size, 9);
}

#[test]
fn optional_flat_gets_ref_accessor() {
    let out = direct("Pair : flat { x:int32 y:int32 }\nA : flat { op : optional<Pair> }");
    assert!(out.contains("pub struct OptionalPairRef<'a> {"));
    assert!(out.contains("pub fn get(&self) -> Result<PairDirect<'_>, Error> {"));
    assert!(out.contains("pub fn op(&self) -> OptionalPairRef<'_> {"));
}

#[test]
fn container_of_flats_uses_span_ref() {
    let out = direct("Pair : flat { x:int32 y:int32 }\nA : flat { ps : Pair[3] }");
    assert!(out.contains("pub fn ps(&self) -> SpanRef<'_, PairDirect<'_>> {"));
}

#[test]
fn init_check_mode() {
    let out = compile("A : flat { x:int32 }", Action::Direct, true).unwrap();
    assert!(out.contains("icheck: [u8; 1],"));
    assert!(out.contains("self.icheck[0] = 1;"));
    assert!(out.contains("assert!(self.icheck[0] != 0"));
}

#[test]
fn fixed_vector_setters() {
    let out = direct("Buf : flat { v : fixed_vector<int32, 4> }");
    assert!(out.contains("pub fn v_extent(&mut self, arg: Extent) -> Result<(), Error> {"));
    assert!(out.contains("pub fn v_push(&mut self, arg: i32) -> Result<(), Error> {"));
    assert!(out.contains("pub fn set_v(&mut self, arg: &[i32]) -> Result<(), Error> {"));
}

#[test]
fn ordinal_stability_across_revisions() {
    let v1 = analyze("A : flat { x:int32 y:int32 }", false).unwrap();
    let v2 = analyze("A : flat { x:int32 y:int32 z:int32 delete x }", false).unwrap();
    let f1 = v1.flat(v1.order[0]);
    let f2 = v2.flat(v2.order[0]);
    for (a, b) in f1.fields.iter().zip(&f2.fields) {
        assert_eq!(a.index, b.index);
        assert_eq!(a.name, b.name);
    }
    assert_eq!(f2.fields[2].name, "z");
    assert_eq!(f2.fields[2].index, 2);
}

#[test]
fn alignment_invariant() {
    let ctx = analyze(
        "A : flat { a:int8 b:int64 c:int16 d:float64 e:char s:string }",
        false,
    )
    .unwrap();
    let flt = ctx.flat(ctx.order[0]);
    for f in flt.live_fields() {
        let align = ctx.typ(f.typ.unwrap()).align;
        assert_eq!(f.offset % align, 0, "field `{}` misaligned", f.name);
    }
    assert_eq!(ctx.typ(flt.self_type).size % 8, 0);
}

#[test]
fn packing_invariant() {
    let ctx = analyze("A : flat { a:int8 b:int64 c:int16 d:float64 }", true).unwrap();
    let flt = ctx.flat(ctx.order[0]);
    let fields: Vec<_> = flt.live_fields().collect();
    for pair in fields.windows(2) {
        assert_eq!(pair[1].offset, pair[0].offset + pair[0].size);
    }
}

#[test]
fn forward_reference_equivalence() {
    let fwd = compile(
        "A : flat { v : V } V : variant { i:int32 }",
        Action::Direct,
        false,
    )
    .unwrap();
    let re = compile(
        "V : variant { i:int32 } A : flat { v : V }",
        Action::Direct,
        false,
    )
    .unwrap();
    // same artifacts, modulo declaration order
    let pick = |s: &str, needle: &str| {
        s.split("\n\n")
            .find(|block| block.contains(needle))
            .unwrap()
            .to_string()
    };
    assert_eq!(pick(&fwd, "pub struct ADirect"), pick(&re, "pub struct ADirect"));
    assert_eq!(pick(&fwd, "impl V {"), pick(&re, "impl V {"));
}

#[test]
fn debug_output() {
    let out = compile(
        "E : enum { a b:5 } Pair : flat { x:int32 y:int32 }",
        Action::Debug,
        false,
    )
    .unwrap();
    assert!(out.contains("E : enum { a:0 b:5 }"));
    assert!(out.contains("Pair : flat {"));
    assert!(out.contains("map Pair : fields=2 version=2"));
}

#[test]
fn errors_carry_lines() {
    let err = compile("A : flat {\n  x:int32\n  x:int32\n}", Action::Direct, false).unwrap_err();
    assert_eq!(err.line, Some(3));
    assert!(err.to_string().starts_with("line 3:"));

    let err = compile("A : flat { v : vector<junk", Action::Direct, false).unwrap_err();
    assert!(matches!(err.kind, CompileErrorKind::Grammar(_)));
}

#[test]
fn sicko_compiles() {
    let out = direct("Sicko : flat { z : optional<vector<int32[10]>[20]>[30] }");
    // the optional collapsed away; arrays of vector headers remain
    assert!(out.contains("pub z: Array<Array<Vector<i32>, 20>, 30>,"));
}

#[test]
fn preset_types_available() {
    let out = direct("T : flat { t:time_point e:exchange_id }");
    assert!(out.contains("pub t: TimePoint,"));
    assert!(out.contains("pub e: ExchangeId,"));
}
