#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the ward indicator statistics tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ward_stats_cli::{OutputFormat, read_rows, render_report};
use ward_stats_domains::{Domain, RunOptions, describe, run_domain, validate_domain_toml};
use ward_stats_engine::PlainFormatter;

#[derive(Parser)]
#[command(name = "ward_stats", about = "Ward indicator statistics tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the registered statistical domains
    Domains,
    /// Run a domain's pipeline over a row file
    Process {
        /// Domain key (e.g., "`housing_tenure`")
        domain: String,
        /// Path to a `.csv` or `.json` row file
        rows: PathBuf,
        /// Number of top categories to keep (overrides the domain config)
        #[arg(long)]
        top_n: Option<usize>,
        /// What to print
        #[arg(long, value_enum, default_value_t = OutputFormat::Both)]
        format: OutputFormat,
    },
    /// Validate a domain config file against a domain's categories
    Validate {
        /// Path to the TOML config
        config: PathBuf,
        /// Domain whose category keys the config uses
        #[arg(long)]
        domain: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Domains => {
            println!("{:<16} {:<16} {:>10} {:>7} SCORES", "ID", "NAME", "CATEGORIES", "GROUPS");
            println!("{}", "-".repeat(70));
            for domain in Domain::all() {
                let summary = describe(*domain)?;
                println!(
                    "{:<16} {:<16} {:>10} {:>7} {}",
                    summary.id,
                    summary.name,
                    summary.categories.len(),
                    summary.groups.len(),
                    summary.scores.join(", ")
                );
            }
        }
        Commands::Process {
            domain,
            rows,
            top_n,
            format,
        } => {
            let domain = Domain::from_key(&domain)?;
            let rows = read_rows(&rows)?;
            let report = run_domain(
                domain,
                &rows,
                RunOptions { top_n },
                &PlainFormatter::default(),
            )?;
            println!("{}", render_report(&report, format)?);
        }
        Commands::Validate { config, domain } => {
            let domain = Domain::from_key(&domain)?;
            let toml = std::fs::read_to_string(&config)?;
            let summary = validate_domain_toml(domain, &toml)?;
            log::info!("Validated {} against {domain}", config.display());
            println!(
                "OK: {} ({}) with {} groups and {} scores",
                summary.id,
                summary.name,
                summary.groups.len(),
                summary.scores.len()
            );
        }
    }

    Ok(())
}
