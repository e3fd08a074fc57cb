use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use squery_sql::{registry, translate_squery, url_query, TranslateOptions};

#[derive(Parser)]
#[command(name = "squery-sql")]
#[command(author, version, about = "Translate SQuery request URLs into SQL Server SELECT statements")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a request URL against a registry config
    Translate {
        /// Full request URL carrying the squery parameter
        #[arg(short, long)]
        url: String,

        /// Path to the JSON registry config
        #[arg(short, long)]
        registry: PathBuf,

        /// Paging offset in rows (ignored when the query has a top)
        #[arg(long, default_value_t = 0)]
        offset: i64,

        /// Paging limit in rows (ignored when the query has a top)
        #[arg(long, default_value_t = 0)]
        limit: i64,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Translate {
            url,
            registry: registry_path,
            offset,
            limit,
            verbose,
        } => {
            let filter = if verbose { "debug" } else { "warn" };
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
                .with_target(false)
                .init();

            let registry = registry::config::load_registry(&registry_path)?;
            let request = url_query::parse_request(&url)?;
            let options = TranslateOptions { offset, limit };
            let translation =
                translate_squery(&request.squery, &request.root_entity, &registry, &options)?;

            println!("{}", translation.sql);
            if !translation.parameters.is_empty() {
                println!();
                for (name, value) in &translation.parameters {
                    println!("-- {name} = {value:?}");
                }
            }
            for warning in &translation.warnings {
                eprintln!("warning: {warning}");
            }
        }
    }

    Ok(())
}
