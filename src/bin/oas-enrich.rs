//! oas-enrich CLI
//!
//! Command-line interface for pruning OpenAPI documents and reporting
//! component reachability.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use oas_enrich::{load_document, prune, reachable_components, Document};

#[derive(Parser)]
#[command(name = "oas-enrich")]
#[command(about = "Prune unreachable components from OpenAPI documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove components no operation can reach
    Prune {
        /// Document file to prune
        document: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// List what would be removed without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Report unreachable components (exit code 1 when any exist)
    Check {
        /// Document file to check
        document: PathBuf,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,

        /// Suppress the per-component listing, only print the summary
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Prune {
            document,
            output,
            pretty,
            dry_run,
        } => run_prune(&document, output, pretty, dry_run),

        Commands::Check {
            document,
            json,
            quiet,
        } => run_check(&document, json, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_prune(
    document_path: &PathBuf,
    output: Option<PathBuf>,
    pretty: bool,
    dry_run: bool,
) -> Result<(), u8> {
    let mut document = load_document(document_path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    if dry_run {
        let total = document.components.schemas.len();
        let unreachable = unreachable_names(&document);
        for name in &unreachable {
            println!("would remove: {}", name);
        }
        println!("{} of {} components unreachable", unreachable.len(), total);
        return Ok(());
    }

    prune(&mut document);

    let json_output = if pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_check(document_path: &PathBuf, json: bool, quiet: bool) -> Result<(), u8> {
    let document = load_document(document_path).map_err(|e| {
        if json {
            println!(r#"{{"error":"{}"}}"#, e);
        } else {
            eprintln!("Error: {}", e);
        }
        e.exit_code() as u8
    })?;

    let unreachable = unreachable_names(&document);

    if json {
        let output = serde_json::json!({
            "unreachable": unreachable,
            "count": unreachable.len(),
        });
        println!("{}", output);
    } else if unreachable.is_empty() {
        println!("All components reachable");
    } else {
        if !quiet {
            for name in &unreachable {
                println!("unreachable: {}", name);
            }
        }
        println!("{} unreachable component(s)", unreachable.len());
    }

    if unreachable.is_empty() {
        Ok(())
    } else {
        Err(1)
    }
}

/// Component names the reachability walk never marks, in catalog order.
fn unreachable_names(document: &Document) -> Vec<String> {
    let live = reachable_components(document);
    document
        .components
        .schemas
        .keys()
        .filter(|name| !live.contains(*name))
        .cloned()
        .collect()
}
