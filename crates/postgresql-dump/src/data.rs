//! Data Converter: source text rows → typed target rows.

use migrate_core::{Conv, ConversionError, Row, Value};
use postgresql_types::convert_value;
use tracing::debug;

/// Where the rows of a `COPY` or `INSERT` go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowTarget {
    pub src_table: String,
    pub sp_table: String,
    /// Source column names, in payload order
    pub src_cols: Vec<String>,
    /// Target column names, aligned with `src_cols`
    pub sp_cols: Vec<String>,
}

/// Spread a sequence number over the key space by reversing its bits.
pub fn synthetic_key_value(sequence: i64) -> i64 {
    (sequence as u64).reverse_bits() as i64
}

/// Convert one row of text values to typed values for `sp_table`.
///
/// `None` values (SQL `NULL`) are dropped from both the column and value
/// lists. If the table has a synthetic key, its next value is appended and
/// the sequence advances; a failed row does not consume a sequence number.
pub fn convert_row(
    conv: &mut Conv,
    sp_table: &str,
    src_table: &str,
    src_cols: &[String],
    vals: &[Option<String>],
) -> Result<Row, ConversionError> {
    if src_cols.len() != vals.len() {
        return Err(ConversionError::ArityMismatch {
            columns: src_cols.len(),
            values: vals.len(),
        });
    }
    let table = conv
        .sp_schema
        .get(sp_table)
        .ok_or_else(|| ConversionError::TableNotFound(sp_table.to_string()))?;
    let src = conv
        .src_schema
        .get(src_table)
        .ok_or_else(|| ConversionError::TableNotFound(src_table.to_string()))?;
    let tz = conv.timezone();

    let mut columns = Vec::with_capacity(vals.len() + 1);
    let mut values = Vec::with_capacity(vals.len() + 1);
    for (src_col, val) in src_cols.iter().zip(vals) {
        let Some(val) = val else {
            continue;
        };
        let sp_col = conv.names.column(src_table, src_col, true)?;
        let column_not_found = || ConversionError::ColumnNotFound {
            table: src_table.to_string(),
            column: src_col.clone(),
        };
        let sp_def = table.column(&sp_col).ok_or_else(column_not_found)?;
        let src_def = src.column(src_col).ok_or_else(column_not_found)?;
        let value = convert_value(&sp_def.ty, &src_def.type_id, &tz, val).map_err(|e| {
            ConversionError::InvalidValue {
                column: src_col.clone(),
                message: e.to_string(),
            }
        })?;
        columns.push(sp_col);
        values.push(value);
    }

    if let Some(key) = conv.synthetic_keys.get_mut(sp_table) {
        columns.push(key.column.clone());
        values.push(Value::Int64(synthetic_key_value(key.sequence)));
        key.sequence += 1;
    }
    Ok(Row::new(sp_table, columns, values))
}

/// Convert a row and route it: accepted rows go to the sink, rejected rows
/// to the bad-row samples.
pub fn process_row(conv: &mut Conv, target: &RowTarget, vals: &[Option<String>]) {
    match convert_row(conv, &target.sp_table, &target.src_table, &target.src_cols, vals) {
        Ok(row) => {
            conv.stats_add_good_row(&target.src_table);
            conv.write_row(row);
        }
        Err(e) => {
            debug!("Bad row for table '{}': {e}", target.src_table);
            conv.stats_add_bad_row(&target.src_table);
            let raw: Vec<String> = vals
                .iter()
                .map(|v| v.clone().unwrap_or_else(|| "NULL".to_string()))
                .collect();
            conv.collect_bad_row(&target.sp_table, &target.src_cols, &raw);
        }
    }
}
