use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::formatting::{IdentifierQuoting, RowTemplate};
use crate::options::ScriptOptions;
use crate::table::Table;
use crate::type_inference::{ColumnTypeAssignment, infer_column_types};
use crate::utils::{grouper, roundup_ten};

/// generates the `create table` block: one aligned `<column> <type>` line per column,
/// followed by a commented-out `drop table`.
pub fn create_table_statement(
    table_name: &str,
    table: &Table,
    types: &ColumnTypeAssignment,
    quoting: IdentifierQuoting,
) -> String {
    // padding is measured on the raw names, before any bracketing.
    let max_len = table
        .column_names()
        .map(|name| name.chars().count())
        .max()
        .unwrap_or(0);
    let width = roundup_ten(max_len) + 2;

    let columns: Vec<String> = types
        .iter()
        .map(|(name, sql_type)| format!("{:<width$}{}", quoting.quote(name), sql_type))
        .collect();

    format!(
        "CREATE TABLE {} (\n{}\n)\n--DROP TABLE {}\n",
        table_name,
        columns.join(",\n"),
        table_name
    )
}

/// the `insert into <name> (<columns>) values` line, restated at the top of every chunk.
pub fn insert_header(table_name: &str, table: &Table, quoting: IdentifierQuoting) -> String {
    let columns: Vec<_> = table.column_names().map(|name| quoting.quote(name)).collect();
    format!("INSERT INTO {} ({}) VALUES", table_name, columns.join(","))
}

/// generates the batched insert block. every `rows_per_insert` rows the header is repeated,
/// and within a statement tuples are laid out `tuples_per_line` to a line.
pub fn insert_statement(
    table_name: &str,
    table: &Table,
    types: &ColumnTypeAssignment,
    options: &ScriptOptions,
) -> String {
    let (rows_per_insert, tuples_per_line) = options.batch_sizes();
    let header = insert_header(table_name, table, options.quoting);
    let template = RowTemplate::new(types, table.column_names(), options.escape);

    let tuples: Vec<String> = table.rows().map(|row| template.render(&row)).collect();
    let chunks: Vec<String> = tuples
        .chunks(rows_per_insert)
        .map(|chunk| grouper(chunk, tuples_per_line))
        .collect();

    format!("{}\n{}", header, chunks.join(format!("\n{}\n", header).as_str()))
}

/// an immutable t-sql script built from a table: create block, blank line, insert block.
///
/// everything is computed on construction. the table name is written verbatim, so it must
/// come from a trusted source.
#[derive(Debug, Clone)]
pub struct TsqlGenerator {
    table: Table,
    table_name: String,
    column_types: ColumnTypeAssignment,
    sql: String,
}

impl TsqlGenerator {
    pub fn new(table: impl Into<Table>, table_name: &str) -> Self {
        Self::with_options(table, table_name, ScriptOptions::default())
    }

    pub fn with_options(table: impl Into<Table>, table_name: &str, options: ScriptOptions) -> Self {
        let table = table.into();
        let column_types = infer_column_types(&table);
        log::debug!(
            "generating script for {} ({} columns, {} rows)",
            table_name,
            table.width(),
            table.height()
        );
        for (name, sql_type) in column_types.iter() {
            log::debug!("{:<32}{}", name, sql_type);
        }

        let create = create_table_statement(table_name, &table, &column_types, options.quoting);
        let insert = insert_statement(table_name, &table, &column_types, &options);
        let sql = format!("{}\n{}", create, insert);

        Self {
            table,
            table_name: table_name.to_string(),
            column_types,
            sql,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn column_types(&self) -> &ColumnTypeAssignment {
        &self.column_types
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// writes the script to any sink.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(self.sql.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// writes the script to `path`, creating or truncating it.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        log::info!("{:<32}{}", "saving script", path.display());
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }
}

impl fmt::Display for TsqlGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatting::EscapeStrategy;
    use crate::table::{Column, Value};
    use chrono::NaiveDate;

    fn people() -> Table {
        Table::new(vec![
            Column::new("Name", ["Ann", "Bo"]),
            Column::new("Age", [30, 5]),
        ])
        .unwrap()
    }

    fn repeated(rows: usize) -> Table {
        Table::new(vec![
            Column::new("id", vec![1; rows]),
            Column::new("label", vec!["x"; rows]),
        ])
        .unwrap()
    }

    #[test]
    fn test_create_statement_pads_names() {
        let table = people();
        let types = infer_column_types(&table);
        let create = create_table_statement("people", &table, &types, IdentifierQuoting::SpaceOnly);
        let expected = "CREATE TABLE people (\nName        VARCHAR(10),\nAge         BIGINT\n)\n--DROP TABLE people\n";
        assert_eq!(create, expected);
    }

    #[test]
    fn test_create_statement_brackets_spaced_names() {
        let table = Table::new(vec![
            Column::new("first name", ["Ann"]),
            Column::new("Column A12", [1]),
        ])
        .unwrap();
        let types = infer_column_types(&table);
        let create = create_table_statement("t", &table, &types, IdentifierQuoting::SpaceOnly);
        // width is 12 from the raw names, which a bracketed ten-character name already fills.
        assert!(create.contains("[first name]VARCHAR(10),\n"));
        assert!(create.contains("[Column A12]BIGINT\n"));
    }

    #[test]
    fn test_create_statement_with_long_names() {
        let table = Table::new(vec![
            Column::new("a_much_longer_name", [1.5]),
            Column::new("id", [1]),
        ])
        .unwrap();
        let types = infer_column_types(&table);
        let create = create_table_statement("t", &table, &types, IdentifierQuoting::SpaceOnly);
        // 18 characters rounds to 20, plus 2
        assert!(create.contains(&format!("a_much_longer_name{}FLOAT,\n", " ".repeat(4))));
        assert!(create.contains(&format!("id{}BIGINT\n", " ".repeat(20))));
    }

    #[test]
    fn test_insert_header_brackets_spaced_names() {
        let table = Table::new(vec![Column::new("first name", ["Ann"]), Column::new("age", [1])]).unwrap();
        assert_eq!(
            insert_header("t", &table, IdentifierQuoting::SpaceOnly),
            "INSERT INTO t ([first name],age) VALUES"
        );
    }

    #[test]
    fn test_small_table_is_one_line() {
        let table = people();
        let types = infer_column_types(&table);
        let insert = insert_statement("people", &table, &types, &ScriptOptions::default());
        assert_eq!(insert, "INSERT INTO people (Name,Age) VALUES\n('Ann',30),('Bo',5)");
    }

    #[test]
    fn test_twenty_five_rows_make_three_lines() {
        let table = repeated(25);
        let types = infer_column_types(&table);
        let insert = insert_statement("t", &table, &types, &ScriptOptions::default());
        let lines: Vec<&str> = insert.lines().skip(1).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].matches("(1,'x')").count(), 10);
        assert_eq!(lines[1].matches("(1,'x')").count(), 10);
        assert_eq!(lines[2], "(1,'x'),(1,'x'),(1,'x'),(1,'x'),(1,'x')");
        assert!(lines[0].ends_with("),"));
    }

    #[test]
    fn test_header_restated_every_thousand_rows() {
        let generator = TsqlGenerator::new(repeated(1001), "t");
        let header = "INSERT INTO t (id,label) VALUES";
        assert_eq!(generator.sql().matches(header).count(), 2);
        // the second statement holds only the last row
        assert!(generator.sql().ends_with(&format!("(1,'x'),(1,'x')\n{}\n(1,'x')", header)));

        let generator = TsqlGenerator::new(repeated(1000), "t");
        assert_eq!(generator.sql().matches(header).count(), 1);
    }

    #[test]
    fn test_custom_batch_sizes() {
        let options = ScriptOptions {
            rows_per_insert: 3,
            tuples_per_line: 2,
            ..Default::default()
        };
        let generator = TsqlGenerator::with_options(repeated(4), "t", options);
        let expected_insert = "INSERT INTO t (id,label) VALUES\n(1,'x'),(1,'x'),\n(1,'x')\nINSERT INTO t (id,label) VALUES\n(1,'x')";
        assert!(generator.sql().ends_with(expected_insert));
    }

    #[test]
    fn test_empty_table_keeps_bare_header() {
        let table = Table::new(vec![Column::new("id", Vec::<i64>::new())]).unwrap();
        let generator = TsqlGenerator::new(table, "empty");
        assert!(generator.sql().ends_with("INSERT INTO empty (id) VALUES\n"));
        assert!(generator.sql().contains("id          VARCHAR(0)"));
    }

    #[test]
    fn test_full_script() {
        let days: Vec<NaiveDate> = (1..=5)
            .map(|d| NaiveDate::from_ymd_opt(2018, 1, d).unwrap())
            .collect();
        let table = Table::new(vec![
            Column::new(
                "Column_A",
                [
                    "Hello",
                    "World",
                    "My name is Tad",
                    "I hope you like",
                    "this module. It helps me with a lot of annoying stuff",
                ],
            ),
            Column::new("Column_B", [1, 234, 4574567, 67, 24]),
            Column::new("Column_C", [0.123424, 0.12, 0.99, 123.324523, 43563456.123]),
            Column::new("Column_D", days),
        ])
        .unwrap();
        let generator = TsqlGenerator::new(&table, "my_table");
        let expected = "CREATE TABLE my_table (\n\
Column_A    VARCHAR(60),\n\
Column_B    BIGINT,\n\
Column_C    FLOAT,\n\
Column_D    DATE\n\
)\n\
--DROP TABLE my_table\n\
\n\
INSERT INTO my_table (Column_A,Column_B,Column_C,Column_D) VALUES\n\
('Hello',1,0.123424,'2018-01-01'),('World',234,0.12,'2018-01-02'),\
('My name is Tad',4574567,0.99,'2018-01-03'),('I hope you like',67,123.324523,'2018-01-04'),\
('this module. It helps me with a lot of annoying stuff',24,43563456.123,'2018-01-05')";
        assert_eq!(generator.sql(), expected);
        assert_eq!(generator.to_string(), expected);
        // the caller's table is untouched
        assert_eq!(generator.table(), &table);
    }

    #[test]
    fn test_escape_option_flows_through() {
        let table = Table::from(Column::new("who", ["O'Brien"]));
        let plain = TsqlGenerator::new(&table, "t");
        assert!(plain.sql().ends_with("('O'Brien')"));

        let options = ScriptOptions {
            escape: EscapeStrategy::DoubleSingleQuote,
            ..Default::default()
        };
        let escaped = TsqlGenerator::with_options(&table, "t", options);
        assert!(escaped.sql().ends_with("('O''Brien')"));
    }

    #[test]
    fn test_numbers_with_missing_values_are_float() {
        let generator = TsqlGenerator::new(Column::new("n", [Some(1), None, Some(3)]), "t");
        assert!(generator.sql().contains("n           FLOAT\n"));
        assert!(generator.sql().ends_with("INSERT INTO t (n) VALUES\n(1.0),(nan),(3.0)"));
    }

    #[test]
    fn test_single_column_input() {
        let generator = TsqlGenerator::new(Column::new("n", [Value::Int(7)]), "t");
        assert_eq!(generator.column_types().len(), 1);
        assert!(generator.sql().ends_with("INSERT INTO t (n) VALUES\n(7)"));
    }

    #[test]
    fn test_write_to_sink() {
        let generator = TsqlGenerator::new(people(), "people");
        let mut buffer = Vec::new();
        generator.write_to(&mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), generator.sql());
    }
}
