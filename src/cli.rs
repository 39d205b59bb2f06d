//! Command-line surface: argument parsing and command execution.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value as Json;
use tabula_core::{sanitize, Record, Snapshot, Value};
use tabula_settings::TabulaSettings;
use tabula_store::{Database, Filter, Select, Selection};
use tracing::info;

/// Inspect, query and import into tabula table stores.
#[derive(Parser, Debug)]
#[command(name = "tabula", version, about)]
pub struct Cli {
    /// Database file, or `:memory:`.
    pub db: PathBuf,

    /// Settings file (defaults to `~/.tabula/settings.json`).
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Command to run against the database.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// List tables with their column and row counts.
    Tables,

    /// Print a table summary and its rows.
    Show {
        /// Table name.
        table: String,
    },

    /// Select rows from a table.
    Select {
        /// Table name.
        table: String,

        /// Comma-separated columns to return (default: all).
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Sort ascending by this column.
        #[arg(long)]
        order: Option<String>,

        /// Return at most N rows.
        #[arg(long)]
        limit: Option<u64>,

        /// Skip N rows (requires --limit).
        #[arg(long)]
        offset: Option<u64>,

        /// Print JSON instead of a text table.
        #[arg(long)]
        json: bool,
    },

    /// Count the rows of a table.
    Count {
        /// Table name.
        table: String,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Import a JSON payload: creates the table, or appends rows if it exists.
    Import {
        /// Table name.
        table: String,

        /// JSON file: an object of column arrays or an array of row objects.
        file: PathBuf,

        /// Create columns for unknown keys when appending.
        #[arg(long)]
        add_columns: bool,
    },
}

/// Row restriction shared by `select` and `count`.
#[derive(Args, Debug, Default, PartialEq, Eq)]
pub struct FilterArgs {
    /// Free-form predicate, e.g. `"flux > 10"`. Repeatable.
    #[arg(long = "where", value_name = "EXPR")]
    pub predicates: Vec<String>,

    /// Null-safe equality, e.g. `band=V` or `flag=null`. Repeatable.
    #[arg(long = "eq", value_name = "COL=VALUE", value_parser = parse_equality)]
    pub equals: Vec<(String, String)>,
}

impl FilterArgs {
    fn to_filter(&self) -> Result<Filter> {
        match (self.predicates.is_empty(), self.equals.is_empty()) {
            (true, true) => Ok(Filter::None),
            (false, true) => Ok(Filter::All(self.predicates.clone())),
            (true, false) => Ok(Filter::Equals(
                self.equals
                    .iter()
                    .map(|(column, raw)| (column.clone(), Value::from_literal(raw)))
                    .collect::<Record>(),
            )),
            (false, false) => bail!("--where and --eq cannot be combined"),
        }
    }
}

fn parse_equality(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((column, value)) if !column.is_empty() => Ok((column.to_string(), value.to_string())),
        _ => Err(format!("expected COL=VALUE, got '{raw}'")),
    }
}

/// Execute a parsed command against its database, writing results to `out`.
pub fn run(cli: Cli, settings: &TabulaSettings, out: &mut impl Write) -> Result<()> {
    let db = Database::open_with(&cli.db, &settings.store)
        .with_context(|| format!("failed to open database {}", cli.db.display()))?;

    match cli.command {
        Command::Tables => writeln!(out, "{db}")?,
        Command::Show { table } => {
            let table = db.get_table(&table)?;
            writeln!(out, "{table}")?;
        }
        Command::Select {
            table,
            columns,
            filter,
            order,
            limit,
            offset,
            json,
        } => {
            let mut select = Select::new().filter(filter.to_filter()?);
            select = match columns.as_slice() {
                [] => select,
                [one] => select.column(one.as_str()),
                many => select.columns(many.iter().map(String::as_str)),
            };
            if let Some(order) = order {
                select = select.order(order);
            }
            if let Some(limit) = limit {
                select = select.limit(limit);
            }
            if let Some(offset) = offset {
                select = select.offset(offset);
            }
            let selection = db.select(&table, &select)?;

            if json {
                let rendered = match &selection {
                    Selection::Rows(rows) => serde_json::to_string_pretty(rows)?,
                    Selection::Column(values) => serde_json::to_string_pretty(values)?,
                };
                writeln!(out, "{rendered}")?;
            } else {
                let column_names = if columns.is_empty() {
                    db.column_names(&table)?
                } else {
                    columns.iter().map(|c| sanitize(c)).collect()
                };
                let snapshot = Snapshot {
                    column_names,
                    rows: selection.into_rows(),
                };
                writeln!(out, "{snapshot}")?;
            }
        }
        Command::Count { table, filter } => {
            let n = db.count(&table, filter.to_filter()?)?;
            writeln!(out, "{n}")?;
        }
        Command::Import {
            table,
            file,
            add_columns,
        } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let payload: Json = serde_json::from_str(&content)
                .with_context(|| format!("invalid JSON in {}", file.display()))?;

            let before = if db.contains_table(&table)? {
                let before = db.row_count(&table)?;
                match payload {
                    Json::Array(rows) => db.add_rows(&table, rows, add_columns)?,
                    row => db.add_row(&table, row, add_columns)?,
                }
                before
            } else {
                db.add_table_with(&table, payload)?;
                0
            };
            let imported = db.row_count(&table)? - before;
            info!(table = %table, rows = imported, "import finished");
            writeln!(out, "imported {imported} rows into '{}'", sanitize(&table))?;
        }
    }

    db.close()?;
    Ok(())
}
