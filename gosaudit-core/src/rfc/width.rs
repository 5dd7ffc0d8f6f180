//! Row width rules for RFC_READ_TABLE.
//!
//! RFC_READ_TABLE returns each row in a fixed 512-byte work area, so the
//! byte widths of all requested fields must fit before a read is issued.

use crate::models::{DataType, FieldSpec};

/// Width assumed for fields that are missing from the dictionary or whose
/// type has no width rule.
pub const DEFAULT_FIELD_WIDTH: usize = 50;

/// Returns the output width in bytes of one field.
///
/// `RAWSTRING` contributes nothing: variable-length binary columns are
/// never part of the work area.
pub fn field_width(spec: &FieldSpec) -> usize {
    let length = spec.length as usize;
    match spec.data_type {
        DataType::Char | DataType::Numc => length,
        DataType::Dats => 8,
        DataType::Tims => 6,
        DataType::Int4 => 10,
        DataType::Dec => length.saturating_add(2),
        DataType::RawString => 0,
        DataType::Other(_) => DEFAULT_FIELD_WIDTH,
    }
}

/// Sums the widths of `fields` against the dictionary entries in `specs`.
///
/// Fields missing from `specs` contribute [`DEFAULT_FIELD_WIDTH`] and are
/// reported with a warning.
pub fn total_width(table: &str, fields: &[String], specs: &[FieldSpec]) -> usize {
    fields
        .iter()
        .map(|field| match specs.iter().find(|spec| &spec.name == field) {
            Some(spec) => field_width(spec),
            None => {
                tracing::warn!(
                    "Field {} not found in {}, assuming width {}",
                    field,
                    table,
                    DEFAULT_FIELD_WIDTH
                );
                DEFAULT_FIELD_WIDTH
            }
        })
        .fold(0usize, usize::saturating_add)
}
