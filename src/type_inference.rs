use std::fmt;

use rayon::prelude::*;
use serde::{Serialize, Serializer};

use crate::table::{Column, Table, Value};
use crate::utils::roundup_ten;

/// the four column types emitted in generated ddl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    BigInt,
    Float,
    Date,
    Varchar(usize),
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::BigInt => f.write_str("BIGINT"),
            SqlType::Float => f.write_str("FLOAT"),
            SqlType::Date => f.write_str("DATE"),
            SqlType::Varchar(n) => write!(f, "VARCHAR({})", n),
        }
    }
}

impl Serialize for SqlType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// the uniform semantic type carried by a column's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDtype {
    Integer,
    Float,
    DateTime,
    Text,
}

/// what a single scan over a column learns about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnProfile {
    pub dtype: ColumnDtype,
    /// longest text rendering, in characters.
    pub max_len: usize,
}

// walks the column once, keeping flags for whether every value seen so far is an
// integer, a number (integer or float), or a date/datetime, and tracking the
// longest text rendering along the way.
//
// the dtype hierarchy, strictest first:
// 1. integer: every value is an int.
// 2. float: every value is an int, a float or a null, with at least one number.
// 3. datetime: every value is a date or a datetime.
// 4. text: anything else. booleans always land here, as do empty and all-null columns.
pub fn profile_column(values: &[Value]) -> ColumnProfile {
    let mut max_len = 0;
    let mut all_integers = !values.is_empty();
    let mut all_numbers = !values.is_empty();
    let mut all_dates = !values.is_empty();
    let mut any_number = false;

    for value in values {
        max_len = max_len.max(value.to_string().chars().count());

        match value {
            Value::Int(_) => {
                any_number = true;
                all_dates = false;
            }
            Value::Float(_) => {
                any_number = true;
                all_integers = false;
                all_dates = false;
            }
            Value::Null => {
                all_integers = false;
                all_dates = false;
            }
            Value::Date(_) | Value::DateTime(_) => {
                all_integers = false;
                all_numbers = false;
            }
            Value::Bool(_) | Value::Text(_) => {
                all_integers = false;
                all_numbers = false;
                all_dates = false;
            }
        }
    }

    let dtype = if all_integers {
        ColumnDtype::Integer
    } else if all_numbers && any_number {
        ColumnDtype::Float
    } else if all_dates {
        ColumnDtype::DateTime
    } else {
        ColumnDtype::Text
    };

    ColumnProfile { dtype, max_len }
}

/// infers the sql type of a column. text columns are sized by their longest rendering,
/// rounded up to the next multiple of ten.
pub fn infer_sql_type(column: &Column) -> SqlType {
    let profile = profile_column(column.values());
    match profile.dtype {
        ColumnDtype::Integer => SqlType::BigInt,
        ColumnDtype::Float => SqlType::Float,
        ColumnDtype::DateTime => SqlType::Date,
        ColumnDtype::Text => SqlType::Varchar(roundup_ten(profile.max_len)),
    }
}

/// column name to sql type, one entry per column in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnTypeAssignment {
    entries: Vec<(String, SqlType)>,
}

impl ColumnTypeAssignment {
    pub fn get(&self, column: &str) -> Option<SqlType> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, sql_type)| *sql_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SqlType)> {
        self.entries.iter().map(|(name, t)| (name.as_str(), *t))
    }

    pub fn types(&self) -> impl Iterator<Item = SqlType> + '_ {
        self.entries.iter().map(|(_, t)| *t)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ColumnTypeAssignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// infers every column's type. columns are profiled in parallel.
pub fn infer_column_types(table: &Table) -> ColumnTypeAssignment {
    let entries = table
        .columns()
        .par_iter()
        .map(|column| (column.name().to_string(), infer_sql_type(column)))
        .collect();
    ColumnTypeAssignment { entries }
}
