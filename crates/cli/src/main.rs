//! moneyrag CLI — the main entry point.
//!
//! Commands:
//! - `search` — Rank knowledge documents for a question
//! - `ask`    — Build the full retrieval context and prompts for a question
//! - `stats`  — Show knowledge base status

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "moneyrag",
    about = "moneyrag — retrieval context builder for a personal finance assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank knowledge documents for a question
    Search {
        /// The question to search for
        query: String,

        /// Number of documents to return
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Restrict to a category (free text, e.g. "Ăn uống")
        #[arg(short, long)]
        category: Option<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build the retrieval context and prompts for a question
    Ask {
        /// The user's question
        query: String,

        /// Ledger snapshot (JSON); an empty ledger is used when omitted
        #[arg(short, long)]
        ledger: Option<PathBuf>,

        #[arg(short, long, default_value_t = 1)]
        user: i64,

        /// Wallet/account id
        #[arg(short, long, default_value_t = 1)]
        account: i64,

        /// Pre-classified category of the question
        #[arg(short, long)]
        category: Option<String>,

        /// Pre-classified query type (spending, income, comparison, trend, category_list, general)
        #[arg(short = 't', long)]
        query_type: Option<String>,

        /// Print the single combined prompt instead of system + user prompts
        #[arg(long)]
        combined: bool,

        /// Also print the canned fallback answer
        #[arg(long)]
        fallback: bool,
    },

    /// Show knowledge base status
    Stats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Search {
            query,
            top_k,
            category,
            json,
        } => commands::search::run(query, top_k, category, json).await?,
        Commands::Ask {
            query,
            ledger,
            user,
            account,
            category,
            query_type,
            combined,
            fallback,
        } => {
            commands::ask::run(commands::ask::AskArgs {
                query,
                ledger,
                user,
                account,
                category,
                query_type,
                combined,
                fallback,
            })
            .await?
        }
        Commands::Stats => commands::stats::run().await?,
    }

    Ok(())
}
