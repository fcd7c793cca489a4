use clap::Parser;
use geoatlas_server::{loader, run_server};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 3001)]
    port: u16,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Directory holding boundaries|cities|cells|pois.geojson.
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Optional JSON file overriding zoom thresholds and display fields.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geoatlas_server=info,geoatlas=info,info".into()),
        )
        .init();

    let args = Args::parse();

    let config = loader::load_config(args.config.as_deref())?;
    info!(data_dir = %args.data_dir.display(), "loading layers");
    let service = loader::load_service(&args.data_dir, config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl_c signal");
    };

    run_server(addr, Arc::new(service), shutdown).await?;

    Ok(())
}
