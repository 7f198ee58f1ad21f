//! Query building, compilation, and execution.
//!
//! - [`filters`] - filter keys and their compilation to conditions
//! - [`statement`] - statement descriptions and SQL compilation
//! - [`queryset`] - read operations bound to one model
//! - [`manager`] - save and delete on top of the queryset

pub mod filters;
pub mod manager;
pub mod queryset;
pub mod statement;

pub use filters::{compile_filters, Condition, FilterValue, Filters, Operator};
pub use manager::Manager;
pub use queryset::{M2mFilter, QuerySet};
pub use statement::{CompiledStatement, OrderBy, Statement};
