use asset_stream_cli::{cli::Cli, commands};
use clap::Parser;
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();

	if let Err(err) = commands::dispatch(cli).await {
		error!(target = "asm", error = %err, "command failed");
		std::process::exit(1);
	}
}
