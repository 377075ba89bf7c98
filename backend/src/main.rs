//! Register Analysis CLI - budget register CSV to dashboard data
//!
//! # Commands
//!
//! ```bash
//! register-analysis serve                           # Start HTTP server (port 3000)
//! register-analysis analyze register.csv            # Print dashboard JSON
//! register-analysis analyze register.csv --category Rent --start 2024-01-01
//! register-analysis parse register.csv              # Just parse CSV to JSON
//! ```

use clap::{Parser, Subcommand};
use register_analysis::config::{ServerConfig, DEFAULT_HOST, DEFAULT_MAX_UPLOAD_MB, DEFAULT_PORT};
use register_analysis::{build_dashboard, parse_csv_file, DashboardFilter};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "register-analysis")]
#[command(about = "Turn a budget register export into dashboard data", long_about = None)]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server
    Serve {
        /// Address to bind
        #[arg(long, env = "REGISTER_HOST", default_value = DEFAULT_HOST)]
        host: String,

        /// Port to listen on
        #[arg(short, long, env = "REGISTER_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Upload size limit in megabytes
        #[arg(long, env = "REGISTER_MAX_UPLOAD_MB", default_value_t = DEFAULT_MAX_UPLOAD_MB)]
        max_upload_mb: usize,
    },

    /// Build the dashboard for a register CSV and output JSON
    Analyze {
        /// Input CSV file
        input: PathBuf,

        /// Keep only this category
        #[arg(short, long)]
        category: Option<String>,

        /// First date to include (YYYY-MM-DD)
        #[arg(short, long)]
        start: Option<String>,

        /// Last date to include (YYYY-MM-DD)
        #[arg(short, long)]
        end: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Parse a CSV file and output JSON records
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logger(cli.verbose);

    let result = match cli.command {
        Commands::Serve {
            host,
            port,
            max_upload_mb,
        } => cmd_serve(ServerConfig::new(host, port, max_upload_mb)).await,

        Commands::Analyze {
            input,
            category,
            start,
            end,
            output,
            compact,
        } => cmd_analyze(
            &input,
            category.as_deref(),
            start.as_deref(),
            end.as_deref(),
            output.as_deref(),
            compact,
        ),

        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),
    };

    if let Err(e) = result {
        tracing::error!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays clean JSON.
fn init_logger(verbose: bool) {
    let default = if verbose {
        "register_analysis=debug,info"
    } else {
        "register_analysis=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn cmd_serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    register_analysis::server::start_server(config).await
}

fn cmd_analyze(
    input: &Path,
    category: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
    output: Option<&Path>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("📄 Processing: {}", input.display());

    let filter = DashboardFilter::from_raw(category, start, end)?;
    let dataset = parse_csv_file(input)?;
    tracing::info!(
        "   Encoding: {}, delimiter: '{}', rows: {}",
        dataset.encoding,
        format_delimiter(dataset.delimiter),
        dataset.len()
    );

    let run = build_dashboard(&dataset, &filter)?;
    tracing::info!(
        "   Charted {} of {} rows across {} categories",
        run.filtered_row_count,
        run.row_count,
        run.dashboard.categories.len()
    );

    let json = if compact {
        serde_json::to_string(&run.dashboard)?
    } else {
        serde_json::to_string_pretty(&run.dashboard)?
    };
    write_output(&json, output)
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("📄 Parsing CSV: {}", input.display());

    let dataset = parse_csv_file(input)?;
    tracing::info!("   Encoding: {}", dataset.encoding);
    tracing::info!("   Delimiter: '{}' (auto-detected)", format_delimiter(dataset.delimiter));
    tracing::info!("   Columns: {}", dataset.headers.join(", "));
    tracing::info!("✅ Parsed {} records", dataset.len());

    let json = serde_json::to_string_pretty(&dataset.to_records())?;
    write_output(&json, output)
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            tracing::info!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
