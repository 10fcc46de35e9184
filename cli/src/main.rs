//! Order forms portal CLI
//!
//! Works on product schemas offline and talks to the portal gateway for
//! orders and forms.
//!
//! # Usage
//!
//! ```bash
//! formctl schema validate sit.json
//! formctl schema generate sit.json --rooms 3
//! formctl schema options sit.json --property BARVA --set TYP=ALU
//! formctl orders list --format json
//! formctl forms submit -f form.json --form-type SIT --order-id 12
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

use output::OutputFormat;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const MAX_ROOMS: i64 = 500;

#[derive(Parser)]
#[command(name = "formctl")]
#[command(version)]
#[command(about = "Order forms portal command line interface", long_about = None)]
struct Cli {
    /// Gateway URL, including the `/api` prefix
    #[arg(long, env = "FORMCTL_API_URL")]
    api_url: Option<String>,

    /// Session token issued by the auth service
    #[arg(long, env = "FORMCTL_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Output format
    #[arg(long, short)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect product schemas (offline)
    Schema {
        #[command(subcommand)]
        action: SchemaCommands,
    },
    /// Browse orders
    Orders {
        #[command(subcommand)]
        action: OrderCommands,
    },
    /// Browse and submit production forms
    Forms {
        #[command(subcommand)]
        action: FormCommands,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Check a schema file
    Validate { file: PathBuf },
    /// Print the initial form_json for a schema
    Generate {
        file: PathBuf,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=MAX_ROOMS))]
        rooms: u16,
    },
    /// Resolve the options of an enum property
    Options {
        file: PathBuf,
        #[arg(long)]
        property: String,
        /// Context value, repeatable
        #[arg(long = "set", value_name = "CODE=VALUE", value_parser = commands::schema::parse_assignment)]
        set: Vec<(String, String)>,
    },
}

#[derive(Subcommand)]
enum OrderCommands {
    /// List orders
    List {
        #[arg(long)]
        page: Option<u32>,
    },
    /// Get order details
    Get { id: i64 },
}

#[derive(Subcommand)]
enum FormCommands {
    /// List forms
    List {
        #[arg(long)]
        order_id: Option<i64>,
    },
    /// Get form details
    Get { id: i64 },
    /// Submit a form_json file as a new form
    Submit {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long)]
        form_type: String,
        #[arg(long)]
        order_id: Option<i64>,
        /// Normalize the form against this schema before sending
        #[arg(long)]
        schema: Option<PathBuf>,
    },
    /// Replace the form_json of an existing form
    Update {
        id: i64,
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = config::Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring unreadable config file");
        config::Config::default()
    });
    let format = cli
        .format
        .or_else(|| config.default_format.as_deref().and_then(OutputFormat::from_name))
        .unwrap_or(OutputFormat::Table);
    let api_url = cli
        .api_url
        .or(config.api_url)
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let token = cli.token.or(config.token);

    let client = commands::ApiClient::new(&api_url, token.as_deref());

    let result = match cli.command {
        Commands::Schema { action } => commands::schema::handle(action, format),
        Commands::Orders { action } => commands::orders::handle(action, &client, format).await,
        Commands::Forms { action } => commands::forms::handle(action, &client, format).await,
        Commands::Config { action } => commands::config::handle(action),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
