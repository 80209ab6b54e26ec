use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::formatting::{EscapeStrategy, IdentifierQuoting};

/// rows per insert statement before the header is restated.
pub const ROWS_PER_INSERT: usize = 1000;
/// row tuples per line inside an insert statement.
pub const TUPLES_PER_LINE: usize = 10;

/// knobs for script generation. every field has a default, so a partial json file is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptOptions {
    pub escape: EscapeStrategy,
    pub quoting: IdentifierQuoting,
    pub rows_per_insert: usize,
    pub tuples_per_line: usize,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            escape: EscapeStrategy::default(),
            quoting: IdentifierQuoting::default(),
            rows_per_insert: ROWS_PER_INSERT,
            tuples_per_line: TUPLES_PER_LINE,
        }
    }
}

impl ScriptOptions {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let options = serde_json::from_reader(BufReader::new(file))?;
        log::debug!("loaded script options from {}", path.as_ref().display());
        Ok(options)
    }

    /// batching sizes with zeros clamped to one.
    pub(crate) fn batch_sizes(&self) -> (usize, usize) {
        if self.rows_per_insert == 0 || self.tuples_per_line == 0 {
            log::warn!("zero batch size in script options, using 1");
        }
        (self.rows_per_insert.max(1), self.tuples_per_line.max(1))
    }
}
