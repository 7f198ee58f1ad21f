//! # asyncorm-db
//!
//! The ORM layer: the [`Model`](model::Model) trait and its schema metadata,
//! field descriptors and their sanitizers, the filter compiler, statement
//! compilation, the database gateway and the queryset/manager pair that
//! ties them together.
//!
//! A request flows model → [`Manager`] / [`QuerySet`] → [`Statement`] →
//! [`DatabaseGateway`] → [`DbExecutor`], and rows come back through
//! [`materializer`] into model instances.

// struct_excessive_bools: FieldDef carries several boolean options.
// cast_precision_loss: the float sanitizer widens integers.
// format_push_string: DDL is assembled with push_str(&format!(..)).
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::format_push_string)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]

pub mod executor;
pub mod fields;
pub mod gateway;
pub mod materializer;
pub mod model;
pub mod query;
pub mod registry;
pub mod row;
pub mod value;

pub use executor::DbExecutor;
pub use fields::{FieldDef, FieldDefault, FieldType, Junction};
pub use gateway::{DatabaseGateway, Response};
pub use materializer::{model_constructor, populate};
pub use model::{Model, ModelMeta};
pub use query::{
    compile_filters, CompiledStatement, Condition, FilterValue, Filters, M2mFilter, Manager,
    Operator, OrderBy, QuerySet, Statement,
};
pub use registry::ModelRegistry;
pub use row::{FromValue, Row};
pub use value::Value;
