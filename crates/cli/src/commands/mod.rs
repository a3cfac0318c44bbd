//! Command dispatch.

mod serve;
mod session;

use crate::cli::{Cli, Commands};
use crate::daemon::default_socket_path;
use crate::error::Result;
use crate::logging::{LogSink, init_logging};

pub async fn dispatch(cli: Cli) -> Result<()> {
	let socket = cli.socket.clone().unwrap_or_else(default_socket_path);
	let format = cli.format;

	// The daemon sets up its own sinks once its config is loaded.
	if !matches!(cli.command, Commands::Serve(_)) {
		init_logging(cli.verbose, LogSink::Stderr)?;
	}

	match cli.command {
		Commands::Serve(args) => serve::run(args, socket, cli.verbose).await,
		Commands::StartSession {
			gamelet_name,
			workstation_directory,
			origin,
		} => session::start(&socket, gamelet_name, workstation_directory, origin.into(), format).await,
		Commands::StopSession { gamelet_id } => session::stop(&socket, gamelet_id, format).await,
		Commands::Status => session::status(&socket, format).await,
		Commands::Shutdown => session::shutdown(&socket, format).await,
	}
}
