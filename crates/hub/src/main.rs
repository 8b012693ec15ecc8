use anyhow::Result;
use clap::Parser;

use hub::config::HubConfig;

#[derive(Debug, Parser)]
#[command(name = "hub")]
#[command(about = "Issue tracker connection hub")]
struct Cli {
    /// Path to the JSON config file.
    #[arg(long)]
    config: Option<String>,

    /// Listen address, overriding the config file.
    #[arg(long)]
    bind: Option<String>,

    /// SQLite database path, overriding the config file.
    #[arg(long)]
    database: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config.as_deref() {
        Some(path) => HubConfig::load_from(path)?,
        None => HubConfig::load()?,
    };
    if let Some(bind) = cli.bind {
        config.bind_address = Some(bind);
    }
    if let Some(database) = cli.database {
        config.database_path = Some(database);
    }

    hub::logging::init_logging(&config.log_filter());
    hub::server::run(&config).await
}
