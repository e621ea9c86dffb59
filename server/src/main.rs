mod error;
mod routes;
mod state;

use clap::Parser;
use patchbay_core::config::CoreConfig;
use patchbay_core::context::CoreContext;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "patchbay-server", about = "Image-processing patchbay HTTP server")]
struct Args {
	/// Root directory for the image store and the default SQLite database file.
	#[arg(long, env = "DATA_DIR")]
	data_dir: PathBuf,

	/// Port to bind the HTTP server on.
	#[arg(long, env = "PORT", default_value = "8080")]
	port: u16,

	/// SeaORM connection string. Defaults to a SQLite file under `data_dir`.
	#[arg(long, env = "DATABASE_URL")]
	database_url: Option<String>,

	/// Path to the external thumbnailer binary invoked by the thumbnail service. Falls back to
	/// the data directory's persisted config file, then to a hardcoded default, when unset.
	#[arg(long, env = "THUMBNAILER_COMMAND")]
	thumbnailer_command: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "info,patchbay_core=debug,patchbay_server=debug".into()),
		)
		.init();

	let args = Args::parse();

	let config = CoreConfig::resolve(
		args.data_dir.clone(),
		args.database_url.clone(),
		args.thumbnailer_command.clone(),
	);

	info!(data_dir = ?config.data_dir, database_url = %config.database_url, "bootstrapping core");
	let core = CoreContext::bootstrap(&config).await?;

	let app = routes::router(AppState { core }).layer(TraceLayer::new_for_http());

	let mut addr = "[::]:8080".parse::<SocketAddr>().expect("hardcoded address is valid");
	addr.set_port(args.port);

	let listener = tokio::net::TcpListener::bind(addr).await?;
	info!(port = args.port, "patchbay server listening");

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
	};

	#[cfg(unix)]
	let terminate = async {
		signal::unix::signal(signal::unix::SignalKind::terminate())
			.expect("failed to install signal handler")
			.recv()
			.await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = ctrl_c => info!("received Ctrl+C, shutting down gracefully"),
		() = terminate => info!("received SIGTERM, shutting down gracefully"),
	}
}
