use std::io::Read;

use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use rayon::prelude::*;

mod error;
mod excel;
mod formatting;
mod options;
mod reshape;
mod sql_generator;
mod table;
mod type_inference;
mod utils;

pub use error::{Result, TsqlError};
pub use excel::{ColumnPlan, ColumnStyle, plan_columns, write_excel, write_sheet};
pub use formatting::{EscapeStrategy, IdentifierQuoting, RowTemplate, ValueFormat};
pub use options::{ROWS_PER_INSERT, ScriptOptions, TUPLES_PER_LINE};
pub use reshape::{list_to_rows, row_number};
pub use sql_generator::{TsqlGenerator, create_table_statement, insert_header, insert_statement};
pub use table::{Column, DATE_FORMAT, DATETIME_FORMAT, Table, Value};
pub use type_inference::{
    ColumnDtype, ColumnProfile, ColumnTypeAssignment, SqlType, infer_column_types, infer_sql_type,
    profile_column,
};
pub use utils::{grouper, quote_list, roundup_ten};

// parses one csv column into the strictest representation every cell agrees on:
// i64, then f64, then date, then date-or-datetime (dates at midnight), then text.
// a single empty cell keeps the whole column as text.
fn parse_column(cells: &[&str]) -> Vec<Value> {
    let parse_stamp = |s: &str| {
        NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
            .ok()
            .or_else(|| NaiveDate::parse_from_str(s, DATE_FORMAT).ok()?.and_hms_opt(0, 0, 0))
    };

    if cells.is_empty() || cells.iter().any(|s| s.is_empty()) {
        return cells.iter().map(|s| Value::from(*s)).collect();
    }
    if let Some(ints) = cells.iter().map(|s| s.parse::<i64>().ok()).collect::<Option<Vec<_>>>() {
        return ints.into_iter().map(Value::Int).collect();
    }
    if let Some(floats) = cells.iter().map(|s| s.parse::<f64>().ok()).collect::<Option<Vec<_>>>() {
        return floats.into_iter().map(Value::Float).collect();
    }
    if let Some(dates) = cells
        .iter()
        .map(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
        .collect::<Option<Vec<_>>>()
    {
        return dates.into_iter().map(Value::Date).collect();
    }
    if let Some(stamps) = cells.iter().map(|s| parse_stamp(*s)).collect::<Option<Vec<_>>>() {
        return stamps.into_iter().map(Value::DateTime).collect();
    }
    cells.iter().map(|s| Value::from(*s)).collect()
}

/// reads a headered csv into a table, typing each column from its contents.
pub fn read_csv_table<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err(TsqlError::InvalidTable("csv input is empty".to_string()));
    }

    let mut records = Vec::new();
    for result in rdr.records() {
        records.push(result?);
    }

    let columns = headers
        .iter()
        .enumerate()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|(i, header)| {
            let cells: Vec<&str> = records.iter().map(|record| &record[i]).collect();
            Column::new(header.trim(), parse_column(&cells))
        })
        .collect();

    let table = Table::new(columns)?;
    log::info!(
        "{:<32}{} columns, {} rows",
        "loaded csv",
        table.width(),
        table.height()
    );
    Ok(table)
}
