//! Tabula CLI
//!
//! Command-line management shell for a local Tabula table file.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use tabula::{
    Condition, Config, Direction, Engine, IndexAction, IndexKind, Operator, Query, Record, Result,
    TabulaError,
};

/// Tabula CLI
#[derive(Parser, Debug)]
#[command(name = "tabula-cli")]
#[command(about = "Management shell for Tabula table files")]
struct Args {
    /// Path of the table file
    #[arg(short, long, default_value = "./tabula.tdb")]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an empty table file (truncating any existing one)
    Create,

    /// Store a record: columns given as col=value pairs
    Put {
        /// The primary key
        pk: String,

        /// Column values, each as col=value
        #[arg(required = true)]
        columns: Vec<String>,
    },

    /// Print a record
    Get {
        /// The primary key
        pk: String,
    },

    /// Delete a record
    Del {
        /// The primary key
        pk: String,
    },

    /// List primary keys
    List {
        /// Only keys with this prefix
        #[arg(short, long)]
        prefix: Option<String>,

        /// Maximum number of keys
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print the number of records
    Count,

    /// Remove all records
    Clear,

    /// Build or drop a secondary index
    Setindex {
        /// Column name (empty string indexes the primary key)
        column: String,

        /// Index kind: lexical | decimal
        kind: String,

        /// Action: add | remove
        action: String,
    },

    /// Query records by conditions
    Search {
        /// Condition as column,op,operand (repeatable). Prefix op with '!'
        /// to negate, e.g. name,!eq,Jeff
        #[arg(short, long)]
        cond: Vec<String>,

        /// Order spec as column,direction (asc|desc|numasc|numdesc)
        #[arg(short, long)]
        order: Option<String>,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print primary keys only
        #[arg(long)]
        keys_only: bool,
    },

    /// Copy the table to a new file
    Copy {
        /// Destination path
        dest: PathBuf,

        /// Reclaim space from deleted/overwritten records
        #[arg(long)]
        compact: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    // Only `create` makes a new file; every other command expects one.
    let creating = matches!(args.command, Commands::Create);
    let engine = Engine::open(
        Config::builder()
            .path(&args.db)
            .create(creating)
            .truncate(creating)
            .build(),
    )?;

    match args.command {
        Commands::Create => {
            println!("created {}", args.db.display());
        }
        Commands::Put { pk, columns } => {
            let mut record = Record::new();
            for pair in &columns {
                let (column, value) = pair.split_once('=').ok_or_else(|| {
                    TabulaError::InvalidRecord(format!("expected col=value, got {:?}", pair))
                })?;
                record.set(column, value);
            }
            engine.put(pk.as_bytes(), record)?;
        }
        Commands::Get { pk } => match engine.get(pk.as_bytes()) {
            Some(record) => print_record(&pk, &record),
            None => println!("(not found)"),
        },
        Commands::Del { pk } => {
            if engine.delete(pk.as_bytes())?.is_none() {
                println!("(not found)");
            }
        }
        Commands::List { prefix, limit } => {
            for key in engine.keys(prefix.as_ref().map(|p| p.as_bytes()), limit) {
                println!("{}", String::from_utf8_lossy(&key));
            }
        }
        Commands::Count => println!("{}", engine.count()),
        Commands::Clear => engine.clear()?,
        Commands::Setindex {
            column,
            kind,
            action,
        } => {
            let kind = parse_kind(&kind)?;
            let action = match action.as_str() {
                "add" => IndexAction::Add,
                "remove" => IndexAction::Remove,
                other => {
                    return Err(TabulaError::InvalidQuery(format!(
                        "unknown index action {:?} (expected add | remove)",
                        other
                    )))
                }
            };
            engine.set_index(column.as_bytes(), kind, action)?;
        }
        Commands::Search {
            cond,
            order,
            limit,
            keys_only,
        } => {
            let mut query = Query::new();
            for spec in &cond {
                query = query.condition(parse_condition(spec)?);
            }
            if let Some(spec) = order {
                let (column, direction) = parse_order(&spec)?;
                query = query.order_by(column, direction);
            }
            if let Some(limit) = limit {
                query = query.limit(limit);
            }
            if keys_only {
                query = query.keys_only();
            }

            for row in engine.search(&query)? {
                let pk = String::from_utf8_lossy(&row.pk).into_owned();
                match row.record {
                    Some(record) => print_record(&pk, &record),
                    None => println!("{}", pk),
                }
            }
        }
        Commands::Copy { dest, compact } => {
            engine.copy(&dest, compact)?;
            println!("copied to {}", dest.display());
        }
    }

    engine.close()
}

fn print_record(pk: &str, record: &Record) {
    let columns: Vec<String> = record
        .iter()
        .map(|(c, v)| {
            format!(
                "{}={}",
                String::from_utf8_lossy(c),
                String::from_utf8_lossy(v)
            )
        })
        .collect();
    println!("{}\t{}", pk, columns.join("\t"));
}

fn parse_kind(kind: &str) -> Result<IndexKind> {
    match kind {
        "lexical" => Ok(IndexKind::Lexical),
        "decimal" => Ok(IndexKind::Decimal),
        other => Err(TabulaError::InvalidQuery(format!(
            "unknown index kind {:?} (expected lexical | decimal)",
            other
        ))),
    }
}

/// Parse "column,op,operand" into a condition
///
/// Operator aliases live here at the boundary; the engine sees only the
/// canonical enum.
fn parse_condition(spec: &str) -> Result<Condition> {
    let mut parts = spec.splitn(3, ',');
    let (Some(column), Some(op), Some(operand)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(TabulaError::InvalidQuery(format!(
            "expected column,op,operand, got {:?}",
            spec
        )));
    };

    let (op, negate) = match op.strip_prefix('!') {
        Some(op) => (op, true),
        None => (op, false),
    };

    let op = match op {
        "eq" | "streq" => Operator::Eq,
        "inc" | "contains" => Operator::Contains,
        "bw" | "begins" => Operator::BeginsWith,
        "ew" | "ends" => Operator::EndsWith,
        "and" | "alltokens" => Operator::AllTokens,
        "or" | "anytoken" => Operator::AnyToken,
        "oreq" | "eqany" => Operator::EqAnyToken,
        "rx" | "regex" => Operator::Regex,
        "numeq" => Operator::NumEq,
        "numgt" | "gt" => Operator::NumGt,
        "numge" | "ge" => Operator::NumGe,
        "numlt" | "lt" => Operator::NumLt,
        "numle" | "le" => Operator::NumLe,
        "bt" | "between" => Operator::NumBetween,
        "numoreq" | "numanyof" => Operator::NumAnyOf,
        other => {
            return Err(TabulaError::InvalidQuery(format!(
                "unknown operator {:?}",
                other
            )))
        }
    };

    let condition = Condition::new(column, op, operand)?;
    Ok(if negate { condition.negate() } else { condition })
}

fn parse_order(spec: &str) -> Result<(Vec<u8>, Direction)> {
    let Some((column, direction)) = spec.rsplit_once(',') else {
        return Err(TabulaError::InvalidQuery(format!(
            "expected column,direction, got {:?}",
            spec
        )));
    };

    let direction = match direction {
        "asc" => Direction::LexicalAsc,
        "desc" => Direction::LexicalDesc,
        "numasc" => Direction::NumericAsc,
        "numdesc" => Direction::NumericDesc,
        other => {
            return Err(TabulaError::InvalidQuery(format!(
                "unknown direction {:?} (expected asc | desc | numasc | numdesc)",
                other
            )))
        }
    };

    Ok((column.as_bytes().to_vec(), direction))
}
