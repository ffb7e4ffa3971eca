//! End-to-end scenarios for the Flats runtime.
//!
//! `record` is the compiler's output for a small schema, checked in expanded
//! form so the runtime contracts are exercised exactly the way generated
//! code uses them.

#![allow(dead_code)]

pub mod record;
