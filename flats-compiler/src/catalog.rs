use crate::ir::tag;

/// One predefined type: schema name, emitted Rust name, object-map tag,
/// byte size and alignment.
pub struct Predef {
    pub name: &'static str,
    pub rust: &'static str,
    pub tag: u32,
    pub size: u32,
    pub align: u32,
}

const fn predef(name: &'static str, rust: &'static str, tag: u32, size: u32, align: u32) -> Predef {
    Predef {
        name,
        rust,
        tag,
        size,
        align,
    }
}

/// The static catalog of built-ins. New application presets extend this
/// table without parser changes.
#[rustfmt::skip]
pub const PREDEFINED: &[Predef] = &[
    predef("int8",    "i8",  tag::INT8,    1, 1),
    predef("char",    "u8",  tag::CHAR8,   1, 1),
    predef("int16",   "i16", tag::INT16,   2, 2),
    // int24 is stored widened to four bytes
    predef("int24",   "i32", tag::INT24,   4, 4),
    predef("int32",   "i32", tag::INT32,   4, 4),
    predef("int64",   "i64", tag::INT64,   8, 8),
    predef("uint8",   "u8",  tag::UINT8,   1, 1),
    predef("uint16",  "u16", tag::UINT16,  2, 2),
    predef("uint24",  "u32", tag::UINT24,  4, 4),
    predef("uint32",  "u32", tag::UINT32,  4, 4),
    predef("uint64",  "u64", tag::UINT64,  8, 8),
    predef("float32", "f32", tag::FLOAT32, 4, 4),
    predef("float64", "f64", tag::FLOAT64, 8, 8),

    // application presets
    predef("time_point",        "TimePoint",        tag::PRESET + 1, 8, 8),
    predef("ukey_t",            "UKey",             tag::PRESET + 2, 4, 4),
    predef("exchange_id",       "ExchangeId",       tag::PRESET + 3, 2, 2),
    predef("option_price_t",    "OptionPrice",      tag::PRESET + 4, 4, 4),
    predef("instrument_status", "InstrumentStatus", tag::PRESET + 5, 1, 1),
];
