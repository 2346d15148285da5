use crate::{Error, FromValue, Model, Result, RowLabeled, Value, util};
use std::sync::Arc;

/// Copies identifier-like columns of a raw row into a fresh row, dropping
/// synthetic or metadata keys so they never land on a model.
pub fn filter_columns(row: &RowLabeled) -> RowLabeled {
    let keep: Vec<usize> = row
        .names()
        .iter()
        .enumerate()
        .filter(|(_, name)| util::is_column_name(name))
        .map(|(i, _)| i)
        .collect();
    if keep.len() == row.names().len() {
        return row.clone();
    }
    let labels: Arc<[String]> = keep.iter().map(|&i| row.names()[i].clone()).collect();
    let values = keep.iter().map(|&i| row.values()[i].clone()).collect();
    RowLabeled::new(labels, values)
}

/// Hydrates a raw result row into a model instance.
pub fn hydrate<M: Model>(row: &RowLabeled) -> Result<M> {
    let mut model = M::from_row(&filter_columns(row))?;
    model.after_load();
    Ok(model)
}

/// Serializes a model into its storable column payload, excluding
/// `exclude` (the primary key, on updates).
pub fn dehydrate<M: Model>(model: &M, exclude: Option<&str>) -> Vec<(String, Value)> {
    model
        .to_row()
        .into_iter()
        .filter(|(column, _)| Some(*column) != exclude)
        .map(|(column, value)| (column.to_string(), value))
        .collect()
}

/// Typed column extraction with the column name attached to decode
/// failures.
pub fn get<T: FromValue>(row: &RowLabeled, column: &str) -> Result<T> {
    let value = row
        .get_column(column)
        .ok_or_else(|| Error::decode(column, "column missing from result row"))?;
    T::from_value(value).map_err(|error| match error {
        Error::Decode { message, .. } => Error::Decode {
            column: column.to_string(),
            message,
        },
        other => other,
    })
}

/// Hydration-time variant resolution over a closed set of model types,
/// keyed by a discriminator column stored alongside the data.
///
/// This replaces runtime class recasting: the variant set is statically
/// known, and an unknown tag is a decode error rather than a dynamic class
/// lookup.
pub trait Discriminated: Sized {
    /// Column holding the variant tag.
    fn discriminator_column() -> &'static str;

    /// Resolves `tag` to a concrete variant hydrated from `row`.
    fn from_variant(tag: &str, row: &RowLabeled) -> Result<Self>;
}

/// Hydrates a row by reading its discriminator column first.
pub fn hydrate_discriminated<D: Discriminated>(row: &RowLabeled) -> Result<D> {
    let column = D::discriminator_column();
    let tag: String = get(row, column)?;
    D::from_variant(&tag, &filter_columns(row))
}
