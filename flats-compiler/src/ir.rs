use std::collections::HashMap;

use crate::catalog;

/// Numeric type discriminants recorded in object maps. Presets extend the
/// space starting at [`tag::PRESET`].
pub mod tag {
    pub const UNDEFINED: u32 = 0;
    pub const BAD: u32 = 1;
    pub const FLAT: u32 = 2;
    pub const VIEW: u32 = 3;
    pub const MESSAGE: u32 = 4;
    pub const CHAR8: u32 = 5;
    pub const INT8: u32 = 6;
    pub const INT16: u32 = 7;
    pub const INT24: u32 = 8;
    pub const INT32: u32 = 9;
    pub const INT64: u32 = 10;
    pub const UINT8: u32 = 11;
    pub const UINT16: u32 = 12;
    pub const UINT24: u32 = 13;
    pub const UINT32: u32 = 14;
    pub const UINT64: u32 = 15;
    pub const FLOAT32: u32 = 16;
    pub const FLOAT64: u32 = 17;
    pub const STRING: u32 = 18;
    pub const VECTOR: u32 = 19;
    pub const OPTIONAL: u32 = 20;
    pub const ARRAY: u32 = 21;
    pub const VARRAY: u32 = 22;
    pub const VARIANT: u32 = 23;
    pub const ENUMERATION: u32 = 24;
    pub const PRESET: u32 = 100;
}

/// Every named aggregate shares this alignment; a flat's fixed size is
/// rounded up to it.
pub const FLAT_ALIGN: u32 = 8;
/// A variant's fixed part is its `{utag, pos}` header.
pub const VARIANT_SIZE: u32 = 4;
pub const VARIANT_ALIGN: u32 = 2;
/// Enumerator values are stored as 32-bit integers.
pub const ENUM_SIZE: u32 = 4;
pub const ENUM_ALIGN: u32 = 4;
/// Default hard limit for a message tail.
pub const TAIL_MAX: u32 = 4096;

/// Size and alignment of the in-buffer vector/string header.
pub const VEC_HEADER_SIZE: u32 = core::mem::size_of::<flats::FlatString>() as u32;
pub const VEC_HEADER_ALIGN: u32 = core::mem::align_of::<flats::FlatString>() as u32;
/// Size of the `used` counter in front of a fixed vector's slots.
pub const VARRAY_COUNTER_SIZE: u32 = core::mem::size_of::<flats::Size>() as u32;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TypeId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct FlatId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FlatKind {
    Undefined,
    Flat,
    Variant,
    View,
    Message,
    Enumeration,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    Ordinary,
    Deprecated,
    Deleted,
    Deprecating,
    Deleting,
}

impl Status {
    /// Tombstones take no space in the layout but keep their ordinal.
    pub fn is_tombstone(self) -> bool {
        matches!(self, Status::Deleted | Status::Deprecating | Status::Deleting)
    }
}

#[derive(Clone, Debug)]
pub struct Field {
    pub name: String,
    /// Absent for tombstones and enumerators.
    pub typ: Option<TypeId>,
    /// Enumerator value, or a field's declared default.
    pub value: i64,
    /// Ordinal, stable across schema revisions.
    pub index: u32,
    pub offset: u32,
    pub size: u32,
    pub status: Status,
}

impl Field {
    pub fn new(name: impl Into<String>, typ: Option<TypeId>) -> Self {
        Self {
            name: name.into(),
            typ,
            value: 0,
            index: 0,
            offset: 0,
            size: 0,
            status: Status::Ordinary,
        }
    }
}

/// Tail region bookkeeping, filled in by the layout engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct VariablePart {
    pub start: u32,
    pub next: u32,
    pub max: u32,
}

#[derive(Clone, Debug)]
pub struct Flat {
    pub kind: FlatKind,
    pub name: String,
    pub fields: Vec<Field>,
    /// The underlying flat for views and messages.
    pub underlying: Option<TypeId>,
    /// The symbol-table entry this flat defines.
    pub self_type: TypeId,
    pub var: VariablePart,
    pub used_as_optional: bool,
    pub packed: bool,
    pub laid_out: bool,
}

impl Flat {
    pub fn new(kind: FlatKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            fields: Vec::new(),
            underlying: None,
            self_type: TypeId(0),
            var: VariablePart::default(),
            used_as_optional: false,
            packed: false,
            laid_out: false,
        }
    }

    pub fn find(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    /// Fields that occupy space and get accessors.
    pub fn live_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.status.is_tombstone())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TypeKind {
    /// Forward reference; carries the flat slot reserved for the definition.
    Undefined(FlatId),
    Scalar { tag: u32, rust: &'static str },
    String,
    Vector(TypeId),
    Optional(TypeId),
    Array(TypeId),
    Varray(TypeId),
    Flat(FlatId),
    Variant(FlatId),
    View(FlatId),
    Message(FlatId),
    Enumeration(FlatId),
}

#[derive(Clone, Debug)]
pub struct Type {
    pub name: String,
    pub kind: TypeKind,
    /// Byte size; `align == 0` means not yet computed.
    pub size: u32,
    pub align: u32,
    /// Element count for arrays and fixed vectors.
    pub count: u32,
}

impl Type {
    pub fn composite(kind: TypeKind, count: u32) -> Self {
        Self {
            name: String::new(),
            kind,
            size: 0,
            align: 0,
            count,
        }
    }
}

/// Owns every type and flat of one compilation; all cross-references are
/// indices into its arenas.
pub struct Context {
    pub types: Vec<Type>,
    pub flats: Vec<Flat>,
    pub symbols: HashMap<String, TypeId>,
    /// Top-level declarations in source order.
    pub order: Vec<FlatId>,
}

impl Context {
    pub fn new() -> Self {
        let mut ctx = Self {
            types: Vec::new(),
            flats: Vec::new(),
            symbols: HashMap::new(),
            order: Vec::new(),
        };
        for p in catalog::PREDEFINED {
            debug_assert!(!p.name.is_empty() && !p.rust.is_empty());
            debug_assert!(p.size > 0 && p.align > 0);
            debug_assert!(p.tag > tag::FLAT);
            debug_assert!(ctx.find(p.name).is_none(), "repeated predefined type name");
            let tid = ctx.add_type(Type {
                name: p.name.into(),
                kind: TypeKind::Scalar {
                    tag: p.tag,
                    rust: p.rust,
                },
                size: p.size,
                align: p.align,
                count: 1,
            });
            ctx.symbols.insert(p.name.into(), tid);
        }
        let string = ctx.add_type(Type {
            name: "string".into(),
            kind: TypeKind::String,
            size: VEC_HEADER_SIZE,
            align: VEC_HEADER_ALIGN,
            count: 1,
        });
        ctx.symbols.insert("string".into(), string);
        ctx
    }

    pub fn find(&self, name: &str) -> Option<TypeId> {
        self.symbols.get(name).copied()
    }

    pub fn typ(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    pub fn typ_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.0 as usize]
    }

    pub fn flat(&self, id: FlatId) -> &Flat {
        &self.flats[id.0 as usize]
    }

    pub fn flat_mut(&mut self, id: FlatId) -> &mut Flat {
        &mut self.flats[id.0 as usize]
    }

    pub fn add_type(&mut self, t: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(t);
        id
    }

    /// First mention of an unknown name: reserve a flat slot and a symbol
    /// entry so every later use sees the same identity.
    pub fn placeholder(&mut self, name: &str) -> TypeId {
        let fid = FlatId(self.flats.len() as u32);
        self.flats.push(Flat::new(FlatKind::Undefined, name));
        let tid = self.add_type(Type {
            name: name.into(),
            kind: TypeKind::Undefined(fid),
            size: 0,
            align: 0,
            count: 1,
        });
        self.flats[fid.0 as usize].self_type = tid;
        self.symbols.insert(name.into(), tid);
        tid
    }

    /// Fill a placeholder with its parsed definition.
    pub fn define(&mut self, tid: TypeId, mut flt: Flat) -> FlatId {
        let fid = match self.typ(tid).kind {
            TypeKind::Undefined(fid) => fid,
            _ => unreachable!("parser rejects double definitions"),
        };
        flt.self_type = tid;
        let kind = flt.kind;
        let used_as_optional = self.flats[fid.0 as usize].used_as_optional;
        flt.used_as_optional |= used_as_optional;
        self.flats[fid.0 as usize] = flt;
        self.typ_mut(tid).kind = match kind {
            FlatKind::Flat => TypeKind::Flat(fid),
            FlatKind::Variant => TypeKind::Variant(fid),
            FlatKind::View => TypeKind::View(fid),
            FlatKind::Message => TypeKind::Message(fid),
            FlatKind::Enumeration => TypeKind::Enumeration(fid),
            FlatKind::Undefined => unreachable!("parser never defines an undefined kind"),
        };
        self.order.push(fid);
        fid
    }

    /// The flat a view or message reads through.
    pub fn underlying_flat(&self, fid: FlatId) -> Option<FlatId> {
        let tid = self.flat(fid).underlying?;
        match self.typ(tid).kind {
            TypeKind::Flat(f) => Some(f),
            _ => None,
        }
    }

    /// The fields a view or message exposes: its own subset if it has one,
    /// else the whole field list of the underlying flat.
    pub fn effective_fields(&self, fid: FlatId) -> &[Field] {
        let flt = self.flat(fid);
        if matches!(flt.kind, FlatKind::View | FlatKind::Message) && flt.fields.is_empty() {
            if let Some(under) = self.underlying_flat(fid) {
                return &self.flat(under).fields;
            }
        }
        &flt.fields
    }

    /// Strip array wrappers off a type.
    pub fn peel_arrays(&self, mut tid: TypeId) -> TypeId {
        while let TypeKind::Array(inner) = self.typ(tid).kind {
            tid = inner;
        }
        tid
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
