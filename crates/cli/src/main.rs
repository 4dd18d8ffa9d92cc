use clap::{Parser, Subcommand};
use redzone_domain::config::StoreBackend;
use redzone_domain::CliOverrides;
use std::path::PathBuf;
use tracing::info;

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "redzone")]
#[command(version, about = "Authoritative GeoDNS server backed by a key/value zone store")]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "redzone.toml")]
    config: String,

    #[arg(short = 'p', long)]
    dns_port: Option<u16>,

    #[arg(short, long)]
    bind: Option<String>,

    #[arg(long)]
    log_level: Option<String>,

    /// Zone store backend: redis or memory
    #[arg(long, value_parser = parse_backend)]
    store: Option<StoreBackend>,

    #[arg(long)]
    store_url: Option<String>,

    /// Zone data loaded into the store before serving
    #[arg(long)]
    seed: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Write zone data from a JSON file into the store and exit
    Seed { file: PathBuf },
}

fn parse_backend(value: &str) -> Result<StoreBackend, String> {
    match value.to_ascii_lowercase().as_str() {
        "redis" => Ok(StoreBackend::Redis),
        "memory" => Ok(StoreBackend::Memory),
        other => Err(format!("unknown store backend '{other}' (expected redis or memory)")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        dns_port: cli.dns_port,
        bind_address: cli.bind,
        store_url: cli.store_url,
        store_backend: cli.store,
        log_level: cli.log_level,
    };
    let config = bootstrap::load_config(Some(&cli.config), overrides)?;
    bootstrap::init_logging(&config);

    info!("Starting redzone v{}", env!("CARGO_PKG_VERSION"));

    let store = redzone_infrastructure::store::connect(&config.store).await?;

    if let Some(Command::Seed { file }) = cli.command {
        bootstrap::seed_zones(store, &config, &file).await?;
        return Ok(());
    }
    if let Some(file) = cli.seed.as_deref() {
        bootstrap::seed_zones(store.clone(), &config, file).await?;
    }

    let services = di::DnsServices::new(&config, store).await?;
    server::run(&config, services).await
}
