//! styled spreadsheet output.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Timelike};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet};

use crate::error::{Result, TsqlError};
use crate::table::{Table, Value};
use crate::type_inference::{ColumnDtype, profile_column};

/// extra characters added to every column width.
pub const WIDTH_PADDING: usize = 8;
/// widest a column is allowed to get.
pub const MAX_COLUMN_WIDTH: usize = 90;

const TEXT_NUM_FORMAT: &str = "@";
const MONEY_NUM_FORMAT: &str = "#,##0.00";
const DATE_NUM_FORMAT: &str = "m/d/yyyy";

/// the display format chosen for a whole column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnStyle {
    /// literal text (`@`).
    Text,
    /// two decimals with thousands separators. only for a column named `refund`.
    Money,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnPlan {
    pub width: usize,
    pub style: ColumnStyle,
}

/// width and style for every column, in column order.
pub fn plan_columns(table: &Table) -> Vec<ColumnPlan> {
    table
        .columns()
        .iter()
        .map(|column| {
            // missing values count as empty here, unlike in varchar sizing
            let longest = column
                .values()
                .iter()
                .map(|v| if v.is_null() { 0 } else { v.to_string().chars().count() })
                .max()
                .unwrap_or(0);
            let wanted = longest.max(column.name().chars().count()) + WIDTH_PADDING;
            if wanted > MAX_COLUMN_WIDTH {
                log::warn!("column '{}' width {} capped at {}", column.name(), wanted, MAX_COLUMN_WIDTH);
            }

            let all_bools = !column.is_empty()
                && column.values().iter().all(|v| matches!(v, Value::Bool(_)));
            let style = if profile_column(column.values()).dtype == ColumnDtype::Text && !all_bools {
                ColumnStyle::Text
            } else if column.name().eq_ignore_ascii_case("refund") {
                ColumnStyle::Money
            } else {
                ColumnStyle::Default
            };

            ColumnPlan {
                width: wanted.min(MAX_COLUMN_WIDTH),
                style,
            }
        })
        .collect()
}

fn cast_row_num(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| TsqlError::InvalidTable(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16> {
    u16::try_from(value)
        .map_err(|_| TsqlError::InvalidTable(format!("column index overflow: {value}")))
}

fn excel_date(value: &Value) -> Result<Option<ExcelDateTime>> {
    let stamp = match value {
        Value::Date(d) => d.and_hms_opt(0, 0, 0),
        Value::DateTime(dt) => Some(*dt),
        _ => None,
    };
    let Some(stamp) = stamp else {
        return Ok(None);
    };
    let year = u16::try_from(stamp.year())
        .map_err(|_| TsqlError::InvalidTable(format!("year out of range: {}", stamp.year())))?;
    // month, day and time components always fit their narrower types
    let date = ExcelDateTime::from_ymd(year, stamp.month() as u8, stamp.day() as u8)?.and_hms(
        stamp.hour() as u16,
        stamp.minute() as u8,
        stamp.second(),
    )?;
    Ok(Some(date))
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
    format: Option<&Format>,
    date_format: &Format,
) -> Result<()> {
    match (value, format) {
        (Value::Null, _) => {}
        (Value::Bool(b), Some(f)) => {
            worksheet.write_boolean_with_format(row, col, *b, f)?;
        }
        (Value::Bool(b), None) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        (Value::Int(_) | Value::Float(_), Some(f)) => {
            worksheet.write_number_with_format(row, col, value.as_f64().unwrap_or_default(), f)?;
        }
        (Value::Int(_) | Value::Float(_), None) => {
            worksheet.write_number(row, col, value.as_f64().unwrap_or_default())?;
        }
        (Value::Date(_) | Value::DateTime(_), _) => {
            if let Some(date) = excel_date(value)? {
                worksheet.write_datetime_with_format(row, col, &date, date_format)?;
            }
        }
        (Value::Text(s), Some(f)) => {
            worksheet.write_string_with_format(row, col, s, f)?;
        }
        (Value::Text(s), None) => {
            worksheet.write_string(row, col, s)?;
        }
    }
    Ok(())
}

/// writes `table` as a new sheet of `workbook`: header row, data, per-column widths and
/// formats, an autofilter on the header and a frozen header row. the workbook is not saved.
pub fn write_sheet(table: &Table, workbook: &mut Workbook, sheet_name: &str) -> Result<()> {
    let plans = plan_columns(table);
    let text_format = Format::new().set_num_format(TEXT_NUM_FORMAT);
    let money_format = Format::new().set_num_format(MONEY_NUM_FORMAT);
    let date_format = Format::new().set_num_format(DATE_NUM_FORMAT);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (i, (column, plan)) in table.columns().iter().zip(&plans).enumerate() {
        let col = cast_col_num(i)?;
        let format = match plan.style {
            ColumnStyle::Text => Some(&text_format),
            ColumnStyle::Money => Some(&money_format),
            ColumnStyle::Default => None,
        };
        worksheet.set_column_width(col, plan.width as f64)?;
        if let Some(f) = format {
            worksheet.set_column_format(col, f)?;
        }

        worksheet.write_string(0, col, column.name())?;
        for (r, value) in column.values().iter().enumerate() {
            write_cell(worksheet, cast_row_num(r + 1)?, col, value, format, &date_format)?;
        }
    }

    if table.width() > 0 {
        worksheet.autofilter(0, 0, 0, cast_col_num(table.width() - 1)?)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    log::debug!(
        "wrote sheet '{}' ({} columns, {} rows)",
        sheet_name,
        table.width(),
        table.height()
    );
    Ok(())
}

/// writes `table` to a single-sheet workbook, adding `.xlsx` to the path when missing.
/// returns the path actually written.
pub fn write_excel(table: &Table, path: impl AsRef<Path>) -> Result<PathBuf> {
    let mut path = path.as_ref().to_path_buf();
    if !path.to_string_lossy().ends_with(".xlsx") {
        let mut name = path.into_os_string();
        name.push(".xlsx");
        path = PathBuf::from(name);
    }

    let mut workbook = Workbook::new();
    write_sheet(table, &mut workbook, "Sheet1")?;
    workbook.save(&path)?;
    log::info!("{:<32}{}", "saving workbook", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use chrono::NaiveDate;

    fn sample() -> Table {
        Table::new(vec![
            Column::new("customer", ["Ann", "Bartholomew"]),
            Column::new("Refund", [12.5, 3.0]),
            Column::new("qty", [1, 2]),
            Column::new(
                "when",
                [
                    NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(),
                    NaiveDate::from_ymd_opt(2018, 1, 2).unwrap(),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_plan_columns_widths_and_styles() {
        let plans = plan_columns(&sample());
        assert_eq!(plans[0], ColumnPlan { width: 19, style: ColumnStyle::Text });
        assert_eq!(plans[1], ColumnPlan { width: 14, style: ColumnStyle::Money });
        assert_eq!(plans[2], ColumnPlan { width: 11, style: ColumnStyle::Default });
        assert_eq!(plans[3], ColumnPlan { width: 18, style: ColumnStyle::Default });
    }

    #[test]
    fn test_plan_columns_caps_width() {
        let table = Table::from(Column::new("long", ["x".repeat(200)]));
        assert_eq!(plan_columns(&table)[0].width, MAX_COLUMN_WIDTH);
    }

    #[test]
    fn test_nulls_do_not_widen_columns() {
        let table = Table::from(Column::new("abc", [None::<&str>, None]));
        assert_eq!(plan_columns(&table)[0].width, 11);
    }

    #[test]
    fn test_bool_and_sparse_number_columns_are_not_text() {
        let table = Table::new(vec![
            Column::new("flag", [true, false]),
            Column::new("refund", [Some(1.5), None]),
        ])
        .unwrap();
        let plans = plan_columns(&table);
        assert_eq!(plans[0].style, ColumnStyle::Default);
        assert_eq!(plans[1].style, ColumnStyle::Money);
    }

    #[test]
    fn test_refund_only_when_not_text() {
        let table = Table::from(Column::new("refund", ["n/a"]));
        assert_eq!(plan_columns(&table)[0].style, ColumnStyle::Text);
    }

    #[test]
    fn test_write_excel_appends_extension() {
        let base = std::env::temp_dir().join(format!("tabular_tsql_excel_{}", std::process::id()));
        let written = write_excel(&sample(), &base).unwrap();
        assert_eq!(written.extension().and_then(|e| e.to_str()), Some("xlsx"));
        assert!(written.exists());
        std::fs::remove_file(written).unwrap();
    }

    #[test]
    fn test_write_sheet_into_shared_workbook() {
        let mut workbook = Workbook::new();
        write_sheet(&sample(), &mut workbook, "first").unwrap();
        write_sheet(&sample(), &mut workbook, "second").unwrap();
        assert!(workbook.save_to_buffer().is_ok());
    }
}
