use clap::Parser;
use mapserver_dns_domain::CliOverrides;
use mapserver_dns_infrastructure::dns::DnsServerHandler;
use tracing::{error, info};

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "mapserver-dns")]
#[command(version)]
#[command(about = "Serves validated map-server inclusion proofs as DNS TXT records")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// DNS server port
    #[arg(short = 'd', long)]
    dns_port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Map server address (host:port)
    #[arg(short = 'm', long)]
    map_address: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        dns_port: cli.dns_port,
        bind_address: cli.bind.clone(),
        map_address: cli.map_address.clone(),
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config);

    info!("Starting Mapserver DNS v{}", env!("CARGO_PKG_VERSION"));

    let settings = config.validate()?;
    let services = di::ProofServices::new(&settings);

    let dns_addr = format!("{}:{}", config.server.bind_address, config.server.dns_port);
    let dns_handler = DnsServerHandler::new(services.serve_proof);
    let policy = config.server.failure_policy;

    tokio::select! {
        result = server::start_dns_server(dns_addr, dns_handler, policy) => {
            if let Err(e) = result {
                error!(error = %e, "DNS server error");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
