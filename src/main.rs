use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use clap::Parser;
use tabular_tsql::{
    EscapeStrategy, IdentifierQuoting, Result, ScriptOptions, TsqlGenerator, read_csv_table,
    write_excel,
};

/// generate a t-sql create + insert script from a csv file
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// path to a headered csv file
    csv: PathBuf,

    /// target table name (defaults to the csv file stem)
    #[arg(short, long)]
    table_name: Option<String>,

    /// write the script here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// json file with script options
    #[arg(long)]
    config: Option<PathBuf>,

    /// double single quotes inside text literals
    #[arg(long)]
    escape_quotes: bool,

    /// bracket reserved words and unusual names, not just names with spaces
    #[arg(long)]
    quote_identifiers: bool,

    /// print the inferred column types as json instead of the script
    #[arg(long)]
    types: bool,

    /// also write the table to a styled spreadsheet
    #[arg(long)]
    xlsx: Option<PathBuf>,
}

fn table_name_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("default_table")
        .to_string()
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut options = match &args.config {
        Some(path) => ScriptOptions::from_json_file(path)?,
        None => ScriptOptions::default(),
    };
    if args.escape_quotes {
        options.escape = EscapeStrategy::DoubleSingleQuote;
    }
    if args.quote_identifiers {
        options.quoting = IdentifierQuoting::Extended;
    }

    let file = File::open(&args.csv)?;
    let table = read_csv_table(BufReader::new(file))?;

    if let Some(path) = &args.xlsx {
        write_excel(&table, path)?;
    }

    let table_name = args
        .table_name
        .clone()
        .unwrap_or_else(|| table_name_from_path(&args.csv));
    let generator = TsqlGenerator::with_options(table, &table_name, options);

    if args.types {
        serde_json::to_writer_pretty(io::stdout().lock(), generator.column_types())?;
        println!();
        return Ok(());
    }

    match &args.output {
        Some(path) => generator.save(path)?,
        None => generator.write_to(io::stdout().lock())?,
    }
    Ok(())
}
