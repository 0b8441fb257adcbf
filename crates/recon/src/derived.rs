//! Derived columns, computed on a loaded dataset before matching.

use crate::config::DerivedColumn;
use crate::error::ReconError;
use crate::model::Dataset;

/// Append each derived ratio column to `dataset`, in declaration order.
///
/// Both operands are parsed first: a non-numeric one is a `FieldParse` error
/// (rows are 1-based). A blank operand or a zero denominator then yields an
/// empty cell. A later definition may read an earlier one.
pub fn apply_derived(dataset: &mut Dataset, derived: &[DerivedColumn]) -> Result<(), ReconError> {
    for def in derived {
        let num_idx = column_index(dataset, &def.numerator)?;
        let den_idx = column_index(dataset, &def.denominator)?;

        let mut values = Vec::with_capacity(dataset.records.len());
        for (row, record) in dataset.records.iter().enumerate() {
            let num = record.fields.get(num_idx).map_or("", String::as_str);
            let den = record.fields.get(den_idx).map_or("", String::as_str);

            let row = row + 1;
            let num = parse_operand(dataset, row, &def.numerator, num)?;
            let den = parse_operand(dataset, row, &def.denominator, den)?;
            let value = match (num, den) {
                (Some(n), Some(d)) if d != 0.0 => format_number(n / d * def.scale),
                _ => String::new(),
            };
            values.push(value);
        }

        if let Some(idx) = dataset.column_index(&def.column) {
            for (record, value) in dataset.records.iter_mut().zip(values) {
                if let Some(cell) = record.fields.get_mut(idx) {
                    *cell = value;
                }
            }
        } else {
            dataset.columns.push(def.column.clone());
            for (record, value) in dataset.records.iter_mut().zip(values) {
                record.fields.push(value);
            }
        }
    }
    Ok(())
}

fn column_index(dataset: &Dataset, column: &str) -> Result<usize, ReconError> {
    dataset
        .column_index(column)
        .ok_or_else(|| ReconError::MissingColumn {
            dataset: dataset.label.clone(),
            column: column.into(),
        })
}

fn parse_operand(
    dataset: &Dataset,
    row: usize,
    column: &str,
    raw: &str,
) -> Result<Option<f64>, ReconError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| ReconError::FieldParse {
            dataset: dataset.label.clone(),
            row,
            column: column.into(),
            value: raw.into(),
        })
}

fn format_number(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        String::new()
    }
}
