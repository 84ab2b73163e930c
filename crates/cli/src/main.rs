//! MealMind CLI - database migrations and recipe formatting.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! mealmind-cli migrate
//!
//! # Print a recipe file as formatted text
//! mealmind-cli format recipe.txt
//!
//! # Print the formatted blocks as JSON (use - for stdin)
//! mealmind-cli format - --json < recipe.txt
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mealmind-cli")]
#[command(author, version, about = "MealMind CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Format recipe text the way the app displays it
    Format {
        /// Recipe text file, or `-` for stdin
        file: PathBuf,

        /// Print blocks as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Format { file, json } => {
            let output = commands::format::run(&file, json)?;
            #[allow(clippy::print_stdout)]
            {
                println!("{output}");
            }
        }
    }
    Ok(())
}
