use clap::Parser;
use shardvec_core::config;
use shardvec_core::index::VectorIndex;
use shardvec_core::storage::ShardedStorage;
use shardvec_server::api::create_router;
use shardvec_server::api::handlers::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shardvec", about = "Sharded vector database server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// Data directory holding the per-shard databases
    #[arg(short, long, default_value = config::DEFAULT_DATA_DIR)]
    data_dir: String,

    /// Number of shards (must match the directory's original layout)
    #[arg(long, default_value_t = config::DEFAULT_SHARD_COUNT)]
    shards: usize,

    /// Graceful shutdown timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_SHUTDOWN_TIMEOUT_SECS)]
    shutdown_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(
                    "shardvec_server=info"
                        .parse()
                        .expect("valid directive literal"),
                )
                .add_directive(
                    "shardvec_core=info"
                        .parse()
                        .expect("valid directive literal"),
                ),
        )
        .init();

    let args = Args::parse();

    if args.port == 0 {
        eprintln!("Error: port must be > 0");
        std::process::exit(1);
    }
    if args.shards == 0 {
        eprintln!("Error: at least one shard is required");
        std::process::exit(1);
    }
    let data_path = std::path::Path::new(&args.data_dir);
    if data_path.exists() && !data_path.is_dir() {
        eprintln!(
            "Error: data_dir '{}' exists but is not a directory",
            args.data_dir
        );
        std::process::exit(1);
    }

    let node_names: Vec<String> = (0..args.shards).map(|i| i.to_string()).collect();
    let storage = Arc::new(ShardedStorage::open(&args.data_dir, &node_names)?);

    tracing::info!(shards = args.shards, "rebuilding index from storage");
    let index = Arc::new(VectorIndex::new(Arc::clone(&storage))?);

    let state = AppState { storage, index };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    let shutdown = Arc::new(Notify::new());
    let server = {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.notified().await })
                .await
        })
    };

    shutdown_signal().await;
    tracing::info!("shutdown signal received, draining in-flight requests");
    shutdown.notify_one();

    match tokio::time::timeout(Duration::from_secs(args.shutdown_timeout), server).await {
        Ok(joined) => joined??,
        Err(_) => tracing::warn!(
            "graceful shutdown timed out after {}s",
            args.shutdown_timeout
        ),
    }

    tracing::info!("server exited");
    Ok(())
}

/// Completes on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
