use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{self, EnvFilter};

use log2sqlite::config::Settings;
use log2sqlite::importer::import_file;

/// Imports W3C Extended Log Format files into a SQLite database, deriving
/// the table schema from each file's #Fields: directive.
#[derive(Parser)]
#[command(name = "log2sqlite", version, about)]
struct Cli {
    /// SQLite database file
    #[arg(long)]
    db: Option<PathBuf>,

    /// Table name
    #[arg(long)]
    table: Option<String>,

    /// Config file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// URL query params to be extracted to separate columns
    #[arg(long = "qpar", value_name = "PARAM")]
    qpar: Vec<String>,

    /// Files to import
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::resolve(&cli.config, cli.db, cli.table, cli.qpar)?;
    tracing::debug!(?settings, "resolved settings");

    // A failed file is reported and skipped; the remaining files still run.
    for file in &cli.files {
        tracing::info!(file = %file.display(), "importing");
        if let Err(err) = import_file(file, &settings) {
            tracing::error!(file = %file.display(), "import failed: {err}");
            tracing::debug!(?err, "import failure detail");
        }
    }

    Ok(())
}
