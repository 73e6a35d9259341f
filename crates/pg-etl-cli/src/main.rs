//! pg-etl CLI - run schema-driven PostgreSQL ingestion pipelines.

use clap::{Parser, Subcommand};
use pg_etl::{
    import_table, run_pipeline, CommandRegistry, Config, Connection, EtlError, ImportOptions,
    PgConnection, RecordingConnection, TaskContext, TaskOutput,
};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};

/// Printed after dry-run row counts, which come from payload line counts.
const ESTIMATE_NOTE: &str = "  (dry run: row counts are estimated from line counts)";

#[derive(Parser)]
#[command(name = "pg-etl")]
#[command(about = "Schema-driven PostgreSQL ingestion pipelines")]
#[command(version)]
struct Cli {
    /// Path to YAML pipeline file
    #[arg(short, long, default_value = "pipeline.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every task of the pipeline in order
    Run {
        /// Dry run: print the SQL that would be issued instead of connecting
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate the pipeline file and show the task plan
    Validate,

    /// Load one CSV file into a table of the configured target
    Import {
        /// CSV file to load
        #[arg(long)]
        file: PathBuf,

        /// Destination table (declared in the schema, or inferred from the header)
        #[arg(long)]
        table: String,

        /// The first record is a header line
        #[arg(long)]
        header: bool,

        /// Field delimiter
        #[arg(long, default_value = ",")]
        delimiter: char,

        /// Text that denotes a null field
        #[arg(long, default_value = "")]
        null_string: String,

        /// Quote character
        #[arg(long, default_value = "\"")]
        quote: char,

        /// Escape character
        #[arg(long, default_value = "\"")]
        escape: char,

        /// Dry run: print the SQL that would be issued instead of connecting
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), EtlError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let config = Config::load(&cli.config)?;
    info!("Loaded pipeline from {:?} (hash {})", cli.config, config.hash());

    let registry = CommandRegistry::with_builtins();

    match cli.command {
        Commands::Run { dry_run } => {
            let recording = RecordingConnection::new();
            let live;
            let conn: &dyn Connection = if dry_run {
                &recording
            } else {
                live = PgConnection::connect(&config.target).await?;
                &live
            };

            let ctx = TaskContext::new(conn, &config.schema);
            let outputs = run_pipeline(&config.tasks, &ctx, &registry).await?;

            if cli.output_json {
                let tasks: Vec<_> = config
                    .tasks
                    .iter()
                    .zip(&outputs)
                    .map(|(task, output)| {
                        json!({
                            "command": task.command,
                            "description": task.description,
                            "output": output,
                        })
                    })
                    .collect();
                let mut result = json!({
                    "config_hash": config.hash(),
                    "dry_run": dry_run,
                    "tasks": tasks,
                });
                if dry_run {
                    result["statements"] = json!(recording.statements());
                    result["rows_estimated"] = json!(true);
                }
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                if dry_run {
                    for statement in recording.statements() {
                        println!("{};", statement);
                    }
                    println!();
                }
                let status_msg = if dry_run { "Dry run completed!" } else { "Pipeline completed!" };
                println!("{}", status_msg);
                for (task, output) in config.tasks.iter().zip(&outputs) {
                    println!("  {}: {}", task.command, output);
                }
                if dry_run && outputs.iter().any(|o| matches!(o, TaskOutput::Loaded(_))) {
                    println!("{}", ESTIMATE_NOTE);
                }
            }
        }

        Commands::Validate => {
            for task in &config.tasks {
                if !registry.contains(&task.command) {
                    return Err(EtlError::UnknownCommand(task.command.clone()));
                }
            }

            if cli.output_json {
                let result = json!({
                    "config_hash": config.hash(),
                    "tables": config.schema.table_names(),
                    "tasks": config.tasks,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Pipeline is valid");
                println!("  Tables: {}", config.schema.table_names().join(", "));
                println!("  Tasks:");
                for (index, task) in config.tasks.iter().enumerate() {
                    println!("    {}. {} - {}", index + 1, task.command, task.description);
                }
            }
        }

        Commands::Import {
            file,
            table,
            header,
            delimiter,
            null_string,
            quote,
            escape,
            dry_run,
        } => {
            let options = ImportOptions {
                delimiter,
                null_string,
                header,
                quote_character: quote,
                escape_character: escape,
            };

            let recording = RecordingConnection::new();
            let live;
            let conn: &dyn Connection = if dry_run {
                &recording
            } else {
                live = PgConnection::connect(&config.target).await?;
                &live
            };

            let result = import_table(conn, &config.schema, &file, &table, &options).await?;

            if cli.output_json {
                let mut value = serde_json::to_value(&result)?;
                if dry_run {
                    value["rows_estimated"] = json!(true);
                }
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                if dry_run {
                    for statement in recording.statements() {
                        println!("{};", statement);
                    }
                    println!();
                }
                println!(
                    "Loaded {}{} rows ({} bytes) into {}",
                    if dry_run { "~" } else { "" },
                    result.rows,
                    result.bytes,
                    result.table
                );
                if dry_run {
                    println!("{}", ESTIMATE_NOTE);
                }
            }
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so stdout carries only results.
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
