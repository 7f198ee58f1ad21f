//! Row to model conversion.

use asyncorm_core::OrmResult;
use tracing::trace;

use crate::model::Model;
use crate::row::Row;

/// Builds an instance of `M` from `row`, starting from `instance` when given
/// and from `M::default()` otherwise.
///
/// # Errors
///
/// Propagates errors from [`Model::set_field`].
pub fn model_constructor<M: Model>(row: &Row, instance: Option<M>) -> OrmResult<M> {
    let mut instance = instance.unwrap_or_default();
    populate(&mut instance, row)?;
    Ok(instance)
}

/// Copies every column of `row` that maps to a field of `M` into `instance`.
///
/// Columns are matched by column name. Columns without a field, such as
/// junction columns or computed values, are skipped. Many-to-many fields are
/// never populated from a table row.
///
/// # Errors
///
/// Propagates errors from [`Model::set_field`].
pub fn populate<M: Model>(instance: &mut M, row: &Row) -> OrmResult<()> {
    let meta = M::meta();
    for (column, value) in row.iter() {
        match meta.field_by_column(column) {
            Some(field) => instance.set_field(field.name, value.clone())?,
            None => trace!(model = meta.model_name, column, "skipping unmapped column"),
        }
    }
    Ok(())
}
