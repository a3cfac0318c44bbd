use std::path::Path;

use anyhow::Context;
use asset_stream_protocol::{ManagerRequest, ManagerResponse};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::{CliError, Result};

/// Sends one request to the daemon. `Ok(None)` means nothing is listening.
pub async fn send_request(socket: &Path, request: &ManagerRequest) -> Result<Option<ManagerResponse>> {
	let stream = match connect_daemon(socket).await {
		Ok(stream) => stream,
		Err(err) if is_not_running(&err) => return Ok(None),
		Err(err) => return Err(CliError::Io(err)),
	};

	let response = send_request_stream(stream, request).await?;
	Ok(Some(response))
}

#[cfg(unix)]
async fn connect_daemon(socket: &Path) -> std::io::Result<tokio::net::UnixStream> {
	tokio::net::UnixStream::connect(socket).await
}

#[cfg(windows)]
async fn connect_daemon(_socket: &Path) -> std::io::Result<tokio::net::TcpStream> {
	tokio::net::TcpStream::connect(("127.0.0.1", super::DAEMON_TCP_PORT)).await
}

fn is_not_running(err: &std::io::Error) -> bool {
	matches!(err.kind(), std::io::ErrorKind::NotFound | std::io::ErrorKind::ConnectionRefused)
}

async fn send_request_stream<S>(mut stream: S, request: &ManagerRequest) -> Result<ManagerResponse>
where
	S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
	let payload = serde_json::to_string(request).context("Failed to serialize daemon request")?;
	stream.write_all(format!("{payload}\n").as_bytes()).await.context("Failed writing daemon request")?;
	stream.flush().await.context("Failed flushing daemon request")?;

	let mut reader = BufReader::new(stream);
	let mut line = String::new();
	reader.read_line(&mut line).await.context("Failed reading daemon response")?;
	if line.is_empty() {
		return Err(CliError::Context("daemon closed the connection without answering".into()));
	}
	let response = serde_json::from_str(&line).context("Failed parsing daemon response")?;
	Ok(response)
}
