use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::table::{DATE_FORMAT, Value, format_float};
use crate::type_inference::{ColumnTypeAssignment, SqlType};

/// how single quotes inside text literals are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscapeStrategy {
    /// text is emitted as is. a value containing `'` yields a broken literal.
    #[default]
    None,
    /// `'` becomes `''`.
    DoubleSingleQuote,
}

impl EscapeStrategy {
    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            EscapeStrategy::DoubleSingleQuote if text.contains('\'') => {
                Cow::Owned(text.replace('\'', "''"))
            }
            _ => Cow::Borrowed(text),
        }
    }
}

/// which column names get wrapped in `[...]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierQuoting {
    /// only names containing a space.
    #[default]
    SpaceOnly,
    /// names with a space, reserved words, a leading digit, or anything but `[A-Za-z0-9_]`.
    Extended,
}

const RESERVED_WORDS: &[&str] = &[
    "ADD", "ALL", "ALTER", "AND", "AS", "ASC", "BETWEEN", "BY", "CASE", "CHECK", "COLUMN",
    "CONSTRAINT", "CREATE", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP", "ELSE", "END",
    "EXISTS", "FOREIGN", "FROM", "FULL", "GROUP", "HAVING", "IN", "INDEX", "INNER", "INSERT",
    "INTO", "IS", "JOIN", "KEY", "LEFT", "LIKE", "NOT", "NULL", "ON", "OR", "ORDER", "OUTER",
    "PRIMARY", "REFERENCES", "RIGHT", "SELECT", "SET", "TABLE", "THEN", "TOP", "UNION",
    "UNIQUE", "UPDATE", "USER", "VALUES", "VIEW", "WHEN", "WHERE",
];

impl IdentifierQuoting {
    pub fn needs_quoting(&self, name: &str) -> bool {
        if name.contains(' ') {
            return true;
        }
        match self {
            IdentifierQuoting::SpaceOnly => false,
            IdentifierQuoting::Extended => {
                name.is_empty()
                    || name.starts_with(|c: char| c.is_ascii_digit())
                    || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                    || RESERVED_WORDS.contains(&name.to_ascii_uppercase().as_str())
            }
        }
    }

    pub fn quote<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if self.needs_quoting(name) {
            Cow::Owned(format!("[{}]", name))
        } else {
            Cow::Borrowed(name)
        }
    }
}

/// how one column's values are written inside an insert tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    Raw,
    Float,
    Date,
    Quoted,
}

impl ValueFormat {
    pub fn for_type(sql_type: SqlType) -> Self {
        match sql_type {
            SqlType::BigInt => ValueFormat::Raw,
            SqlType::Float => ValueFormat::Float,
            SqlType::Date => ValueFormat::Date,
            SqlType::Varchar(_) => ValueFormat::Quoted,
        }
    }

    pub fn render(&self, value: &Value, escape: EscapeStrategy) -> String {
        match self {
            ValueFormat::Raw => value.to_string(),
            ValueFormat::Float => match value {
                Value::Null => format_float(f64::NAN),
                _ => value.as_f64().map_or_else(|| value.to_string(), format_float),
            },
            ValueFormat::Date => match value.as_date() {
                Some(date) => format!("'{}'", date.format(DATE_FORMAT)),
                None => quote_text(value, escape),
            },
            ValueFormat::Quoted => quote_text(value, escape),
        }
    }
}

fn quote_text(value: &Value, escape: EscapeStrategy) -> String {
    let text = value.to_string();
    format!("'{}'", escape.apply(&text))
}

/// the per-row literal layout, built once from the column types and reused for every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowTemplate {
    formats: Vec<ValueFormat>,
    escape: EscapeStrategy,
}

impl RowTemplate {
    /// one format per column, in the order given. a column without a type is quoted as text.
    pub fn new<'a>(
        types: &ColumnTypeAssignment,
        columns: impl IntoIterator<Item = &'a str>,
        escape: EscapeStrategy,
    ) -> Self {
        let formats = columns
            .into_iter()
            .map(|name| types.get(name).map_or(ValueFormat::Quoted, ValueFormat::for_type))
            .collect();
        Self { formats, escape }
    }

    pub fn formats(&self) -> &[ValueFormat] {
        &self.formats
    }

    /// renders a row as `(v1,v2,...)`. cells are matched to formats by position.
    pub fn render(&self, row: &[&Value]) -> String {
        let cells: Vec<String> = self
            .formats
            .iter()
            .zip(row)
            .map(|(format, value)| format.render(value, self.escape))
            .collect();
        format!("({})", cells.join(","))
    }
}
