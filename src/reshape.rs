use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{Result, TsqlError};
use crate::table::{Column, Table, Value};

fn resolve_column<'a>(table: &'a Table, name: &str) -> Result<&'a Column> {
    table
        .column(name)
        .ok_or_else(|| TsqlError::InvalidTable(format!("no column named '{}'", name)))
}

/// splits every value of `column` on `sep` and gives each trimmed piece its own row.
/// the other columns are repeated for each piece and the column order is kept.
pub fn list_to_rows(table: &Table, column: &str, sep: &str) -> Result<Table> {
    if sep.is_empty() {
        return Err(TsqlError::Validation("separator must not be empty".to_string()));
    }
    let target = table
        .column_index(column)
        .ok_or_else(|| TsqlError::InvalidTable(format!("no column named '{}'", column)))?;

    let mut values: Vec<Vec<Value>> = vec![Vec::with_capacity(table.height()); table.width()];
    for row in table.rows() {
        let text = row[target].to_string();
        for piece in text.split(sep).map(str::trim) {
            for (i, cell) in row.iter().enumerate() {
                let cell = if i == target {
                    Value::Text(piece.to_string())
                } else {
                    (*cell).clone()
                };
                values[i].push(cell);
            }
        }
    }

    let columns = table
        .column_names()
        .zip(values)
        .map(|(name, vals)| Column::new(name, vals))
        .collect();
    let expanded = Table::new(columns)?;
    log::debug!(
        "expanded '{}' from {} to {} rows",
        column,
        table.height(),
        expanded.height()
    );
    Ok(expanded)
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Float(_) => 2,
        Value::Date(_) | Value::DateTime(_) => 3,
        Value::Text(_) => 4,
    }
}

// total order over non-null values. values of different kinds order by kind.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        _ => {
            if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
                return x.total_cmp(&y);
            }
            if let (Value::Date(_) | Value::DateTime(_), Value::Date(_) | Value::DateTime(_)) = (a, b) {
                let stamp = |v: &Value| match v {
                    Value::Date(d) => d.and_hms_opt(0, 0, 0),
                    Value::DateTime(dt) => Some(*dt),
                    _ => None,
                };
                return stamp(a).cmp(&stamp(b));
            }
            kind_rank(a).cmp(&kind_rank(b))
        }
    }
}

// equal numbers share a key whatever their representation, as do a date and its midnight.
fn partition_key(value: &Value) -> String {
    match value {
        Value::Int(_) | Value::Float(_) => format!("n:{}", value.as_f64().unwrap_or_default()),
        Value::Date(d) => format!("d:{}", d.and_hms_opt(0, 0, 0).unwrap_or_default()),
        Value::DateTime(dt) => format!("d:{}", dt),
        other => format!("{:?}", other),
    }
}

// nulls go last whichever way the column is sorted.
fn compare_sort_keys(a: &Value, b: &Value, ascending: bool) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) if ascending => compare_values(a, b),
        (false, false) => compare_values(a, b).reverse(),
    }
}

/// `row_number() over (partition by ... order by ...)`.
///
/// returns one number per row, aligned with the table's rows, counting 1..n within each
/// partition in the requested order. `sort_by` holds one flag per order column, `true` for
/// ascending; when absent or empty every order column sorts ascending. ties keep their
/// original relative order.
pub fn row_number(
    table: &Table,
    partition_by: &[&str],
    order_by: &[&str],
    sort_by: Option<&[bool]>,
) -> Result<Vec<i64>> {
    let ascending: Vec<bool> = match sort_by {
        None | Some([]) => vec![true; order_by.len()],
        Some(flags) if flags.len() != order_by.len() => {
            return Err(TsqlError::Validation(format!(
                "order_by and sort_by must have the same length ({} vs {})",
                order_by.len(),
                flags.len()
            )));
        }
        Some(flags) => flags.to_vec(),
    };

    let partitions = partition_by
        .iter()
        .map(|name| resolve_column(table, name))
        .collect::<Result<Vec<_>>>()?;
    let orders = order_by
        .iter()
        .map(|name| resolve_column(table, name))
        .collect::<Result<Vec<_>>>()?;

    let mut indices: Vec<usize> = (0..table.height()).collect();
    indices.sort_by(|&a, &b| {
        orders
            .iter()
            .zip(&ascending)
            .map(|(column, asc)| compare_sort_keys(&column.values()[a], &column.values()[b], *asc))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    });

    let mut counters: HashMap<Vec<String>, i64> = HashMap::new();
    let mut numbers = vec![0; table.height()];
    for index in indices {
        let key: Vec<String> = partitions
            .iter()
            .map(|column| partition_key(&column.values()[index]))
            .collect();
        let counter = counters.entry(key).or_insert(0);
        *counter += 1;
        numbers[index] = *counter;
    }
    Ok(numbers)
}
