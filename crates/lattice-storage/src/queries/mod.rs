//! SQL, one module per table group. Every function takes a `&Connection` so
//! it can run on the writer, a reader, or inside a transaction.

pub mod form_crud;
pub mod identity_crud;
pub mod legacy_ops;
pub mod maintenance;
