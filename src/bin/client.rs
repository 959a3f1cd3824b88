//! Data-service command-line client
//!
//! ## Usage
//!
//! ```bash
//! # Check the server is reachable
//! dataservice-client --url "jdbc:pdi://localhost:9080/kettle?webappname=pentaho-di" -u admin status
//!
//! # List virtual tables and their columns
//! dataservice-client --url "jdbc:pdi://localhost:9080/kettle" tables
//! dataservice-client --url "jdbc:pdi://localhost:9080/kettle" columns --table sequence
//!
//! # Run a query, at most 10 rows, one JSON object per row
//! dataservice-client --url "jdbc:pdi://localhost:9080/kettle" query "SELECT * FROM sequence" --max-rows 10 --json
//! ```
//!
//! The password is read from `--password` or the `DATASERVICE_PASSWORD`
//! environment variable.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dataservice_client::config::LoggingConfig;
use dataservice_client::{ClientConfig, Credentials, Driver, LocalServiceRegistry, QueryRequest};
use std::env;
use std::sync::OnceLock;

static TRACE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "dataservice-client", version, about = "Query remote PDI data services")]
struct Cli {
    /// Connection address, e.g. jdbc:pdi://localhost:9080/kettle
    #[arg(long)]
    url: String,

    #[arg(short, long)]
    user: Option<String>,

    #[arg(short, long)]
    password: Option<String>,

    /// Configuration file (defaults to dataservice.toml lookup)
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the server is reachable
    Status,
    /// List services with their fields
    Services,
    /// List virtual tables
    Tables {
        #[arg(long)]
        schema: Option<String>,
        #[arg(long)]
        table: Option<String>,
    },
    /// List virtual columns
    Columns {
        #[arg(long)]
        schema: Option<String>,
        #[arg(long)]
        table: Option<String>,
        #[arg(long)]
        column: Option<String>,
    },
    /// Run a SQL statement and print the rows
    Query {
        sql: String,
        /// 0 = unbounded
        #[arg(long, default_value_t = 0)]
        max_rows: usize,
        /// One JSON object per row
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {path}"))?,
        None => ClientConfig::load().unwrap_or_else(|e| {
            eprintln!("Using default configuration ({e})");
            ClientConfig::default()
        }),
    };
    init_tracing(&config.logging);

    let driver = Driver::new(config, LocalServiceRegistry::new());
    if !driver.accepts_address(&cli.url) {
        bail!("Not a data-service address: {}", cli.url);
    }

    let credentials = match cli.user {
        Some(user) => {
            let password = cli
                .password
                .or_else(|| env::var("DATASERVICE_PASSWORD").ok())
                .unwrap_or_default();
            Credentials::new(user, password)
        }
        None => Credentials::anonymous(),
    };

    let connection = driver.connect(&cli.url, credentials)?;

    match cli.command {
        Command::Status => {
            println!("OK {}", connection.descriptor().base_url());
        }
        Command::Services => {
            for service in connection.service_information()? {
                println!("{}", service.name);
                for field in &service.fields {
                    println!("  {} {}", field.name, field.field_type);
                }
            }
        }
        Command::Tables { schema, table } => {
            let metadata = connection.metadata();
            for row in metadata.tables(schema.as_deref(), table.as_deref())? {
                println!("{}\t{}\t{}", row.schema, row.name, row.table_type);
            }
        }
        Command::Columns {
            schema,
            table,
            column,
        } => {
            let metadata = connection.metadata();
            for row in metadata.columns(schema.as_deref(), table.as_deref(), column.as_deref())? {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    row.table,
                    row.ordinal,
                    row.name,
                    row.type_name(),
                    row.field_type
                );
            }
        }
        Command::Query {
            sql,
            max_rows,
            json,
        } => {
            let mut rows = connection.execute(QueryRequest::new(sql).with_max_rows(max_rows))?;
            let meta = rows.row_meta().clone();
            if !json {
                println!("{}", meta.field_names().join("\t"));
            }
            let mut count = 0usize;
            for row in rows.by_ref() {
                let row = row?;
                if json {
                    let object: serde_json::Map<String, serde_json::Value> = meta
                        .fields()
                        .iter()
                        .zip(row.values())
                        .map(|(field, value)| {
                            Ok((field.name.clone(), serde_json::to_value(value)?))
                        })
                        .collect::<Result<_, serde_json::Error>>()?;
                    println!("{}", serde_json::Value::Object(object));
                } else {
                    let cells: Vec<String> = row.values().iter().map(ToString::to_string).collect();
                    println!("{}", cells.join("\t"));
                }
                count += 1;
            }
            eprintln!("{count} row(s)");
        }
    }

    Ok(())
}

/// Install the tracing subscriber described by the logging config.
///
/// `RUST_LOG` overrides the configured level. Output goes to the configured
/// file through a non-blocking writer, or to stderr.
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let json = logging.format == "json";

    let writer = match &logging.file {
        Some(path) => match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        {
            Ok(file) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                let _ = TRACE_GUARD.set(guard);
                tracing_subscriber::fmt::writer::BoxMakeWriter::new(non_blocking)
            }
            Err(e) => {
                eprintln!("ERROR: Unable to open log file '{path}': {e}");
                return;
            }
        },
        None => tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stderr),
    };

    let base = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer);

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if json {
        Box::new(base.json().finish())
    } else {
        Box::new(base.compact().finish())
    };

    let _ = tracing::subscriber::set_global_default(subscriber);
}
