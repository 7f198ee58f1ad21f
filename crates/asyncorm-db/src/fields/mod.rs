//! Field definitions and types.
//!
//! [`FieldDef`] describes one model attribute and knows its column DDL,
//! its trailing constraint and how to sanitize values bound for it.

mod sanitize;
pub mod types;

pub use types::{FieldDef, FieldDefault, FieldType, Junction};
