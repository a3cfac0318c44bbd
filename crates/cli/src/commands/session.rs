//! Client-side commands talking to a running daemon.

use std::path::{Path, PathBuf};

use asset_stream_protocol::{ManagerRequest, ManagerResponse, RequestOrigin, StartSessionRequest, StopSessionRequest};
use serde::Serialize;
use tracing::debug;

use crate::daemon::{endpoint_label, send_request};
use crate::error::{CliError, Result};
use crate::output::{OutputFormat, ResultBuilder, SessionData, ShutdownData, StatusData, print_result};

pub async fn start(socket: &Path, gamelet_name: String, directory: PathBuf, origin: RequestOrigin, format: OutputFormat) -> Result<()> {
	// The daemon may run with another working directory.
	let directory = std::path::absolute(&directory).unwrap_or(directory);
	let workstation_directory = directory.display().to_string();
	let request = ManagerRequest::StartSession(StartSessionRequest {
		gamelet_name: gamelet_name.clone(),
		workstation_directory: workstation_directory.clone(),
		origin,
	});
	let data = SessionData {
		gamelet: gamelet_name,
		workstation_directory: Some(workstation_directory),
	};
	call("start-session", socket, &request, data, format).await
}

pub async fn stop(socket: &Path, gamelet_id: String, format: OutputFormat) -> Result<()> {
	let request = ManagerRequest::StopSession(StopSessionRequest { gamelet_id: gamelet_id.clone() });
	let data = SessionData {
		gamelet: gamelet_id,
		workstation_directory: None,
	};
	call("stop-session", socket, &request, data, format).await
}

pub async fn status(socket: &Path, format: OutputFormat) -> Result<()> {
	let endpoint = endpoint_label(socket);
	let data = match send_request(socket, &ManagerRequest::Status).await? {
		None => StatusData::not_running(endpoint),
		Some(ManagerResponse::Status(status)) => StatusData {
			running: true,
			endpoint,
			session_count: Some(status.session_count),
			sessions: status.sessions,
			config: Some(status.config),
		},
		Some(other) => return Err(unexpected(other)),
	};
	let result = ResultBuilder::new("status").data(data).build();
	print_result(&result, format);
	Ok(())
}

pub async fn shutdown(socket: &Path, format: OutputFormat) -> Result<()> {
	let stopped = match send_request(socket, &ManagerRequest::Shutdown).await? {
		None => false,
		Some(ManagerResponse::Ok) => true,
		Some(other) => return Err(unexpected(other)),
	};
	let result = ResultBuilder::new("shutdown")
		.data(ShutdownData {
			stopped,
			endpoint: endpoint_label(socket),
		})
		.build();
	print_result(&result, format);
	Ok(())
}

/// Sends `request`, prints the envelope, and turns daemon errors into a failing exit.
async fn call<T: Serialize>(command: &str, socket: &Path, request: &ManagerRequest, data: T, format: OutputFormat) -> Result<()> {
	debug!(target = "asm.client", command, socket = %socket.display(), "sending request");

	let outcome = match send_request(socket, request).await? {
		None => Err(CliError::NotRunning(endpoint_label(socket))),
		Some(ManagerResponse::Ok) => Ok(()),
		Some(ManagerResponse::Error { code, message }) => Err(CliError::Daemon { code, message }),
		Some(other) => Err(unexpected(other)),
	};

	let result = match &outcome {
		Ok(()) => ResultBuilder::new(command).data(data).build(),
		Err(err) => ResultBuilder::<T>::new(command).error(err.code(), err.to_string()).build(),
	};
	print_result(&result, format);
	outcome
}

fn unexpected(response: ManagerResponse) -> CliError {
	CliError::Context(format!("unexpected daemon response: {response:?}"))
}
