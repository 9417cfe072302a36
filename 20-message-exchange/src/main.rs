use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use message_exchange::{
    cli::{Cli, Command},
    client,
    message::SenderName,
    server::Server,
};

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Server(args) => {
            let identity = SenderName::new(args.name.clone()).context("invalid server name")?;
            let listener = TcpListener::bind(args.listen_addr())
                .await
                .with_context(|| format!("failed to bind {}", args.listen_addr()))?;
            let server = Server::new(listener, identity);
            let addr = server.local_addr()?;
            info!("server listening on {}", addr);
            info!("Ctrl + C to exit.");
            if let Err(err) = server.run_until_ctrl_c().await {
                warn!("server exited with error: {err:?}");
                return Err(err);
            }
        }
        Command::Client(args) => client::run(args).await?,
    }

    Ok(())
}
