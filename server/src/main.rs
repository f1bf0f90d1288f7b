use anyhow::{Context, Result};
use clap::Parser;
use pdfsearch_server::build_app;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

/// Serve TF-IDF search over a folder indexed by `pdfsearch --update`.
#[derive(Parser)]
#[command(name = "pdfsearch-server")]
struct Args {
    /// Indexed PDF folder
    #[arg(long)]
    folder: String,
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let app = build_app(&args.folder).with_context(|| format!("cannot serve {}", args.folder))?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", args.host, args.port))?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, folder = %args.folder, "serving search");
    axum::serve(listener, app).await?;
    Ok(())
}
