//! Local RPC daemon serving `ManagerRequest`s as newline-delimited JSON.

mod client;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use asset_stream::{LocalAssetsStreamManager, SessionManager};
use asset_stream_protocol::{ManagerRequest, ManagerResponse, StatusCode};
pub use client::send_request;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Loopback port used instead of a unix socket on Windows.
pub const DAEMON_TCP_PORT: u16 = 44432;

const SOCKET_FILE_NAME: &str = "asset_stream_manager.sock";

/// Socket path used when none is given, under the user runtime dir when there is one.
pub fn default_socket_path() -> PathBuf {
	dirs::runtime_dir().unwrap_or_else(std::env::temp_dir).join(SOCKET_FILE_NAME)
}

/// Human-readable address a daemon at `socket` listens on.
pub fn endpoint_label(socket: &Path) -> String {
	if cfg!(windows) {
		format!("127.0.0.1:{DAEMON_TCP_PORT}")
	} else {
		socket.display().to_string()
	}
}

/// Accept loop around a [`LocalAssetsStreamManager`].
pub struct Daemon {
	manager: Arc<LocalAssetsStreamManager>,
	registry: Arc<SessionManager>,
	socket: PathBuf,
	shutdown: watch::Sender<bool>,
}

impl Daemon {
	pub fn new(manager: Arc<LocalAssetsStreamManager>, registry: Arc<SessionManager>, socket: PathBuf) -> Self {
		let (shutdown, _) = watch::channel(false);
		Self {
			manager,
			registry,
			socket,
			shutdown,
		}
	}

	/// Serves connections until a `shutdown` request or Ctrl-C, then stops all sessions.
	pub async fn run(self) -> Result<()> {
		let result = self.accept_loop().await;
		self.registry.shutdown();
		#[cfg(unix)]
		let _ = std::fs::remove_file(&self.socket);
		info!(target = "asm.daemon", "daemon stopped");
		result
	}

	#[cfg(unix)]
	async fn accept_loop(&self) -> Result<()> {
		use tokio::net::UnixListener;

		if let Some(parent) = self.socket.parent() {
			std::fs::create_dir_all(parent)?;
		}
		if self.socket.exists() {
			let _ = std::fs::remove_file(&self.socket);
		}
		let listener = UnixListener::bind(&self.socket)?;
		info!(target = "asm.daemon", socket = %self.socket.display(), "daemon listening");

		let mut shutdown = self.shutdown.subscribe();
		loop {
			tokio::select! {
				changed = shutdown.changed() => {
					if changed.is_err() || *shutdown.borrow() {
						break;
					}
				}
				_ = tokio::signal::ctrl_c() => {
					info!(target = "asm.daemon", "interrupted");
					break;
				}
				accept = listener.accept() => match accept {
					Ok((stream, _)) => self.spawn_connection(stream),
					Err(err) => warn!(target = "asm.daemon", error = %err, "accept failed"),
				}
			}
		}
		Ok(())
	}

	#[cfg(windows)]
	async fn accept_loop(&self) -> Result<()> {
		use tokio::net::TcpListener;

		let listener = TcpListener::bind(("127.0.0.1", DAEMON_TCP_PORT)).await?;
		info!(target = "asm.daemon", port = DAEMON_TCP_PORT, "daemon listening");

		let mut shutdown = self.shutdown.subscribe();
		loop {
			tokio::select! {
				changed = shutdown.changed() => {
					if changed.is_err() || *shutdown.borrow() {
						break;
					}
				}
				_ = tokio::signal::ctrl_c() => {
					info!(target = "asm.daemon", "interrupted");
					break;
				}
				accept = listener.accept() => match accept {
					Ok((stream, _)) => self.spawn_connection(stream),
					Err(err) => warn!(target = "asm.daemon", error = %err, "accept failed"),
				}
			}
		}
		Ok(())
	}

	fn spawn_connection<S>(&self, stream: S)
	where
		S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
	{
		let manager = Arc::clone(&self.manager);
		let registry = Arc::clone(&self.registry);
		let shutdown = self.shutdown.clone();
		tokio::spawn(async move {
			if let Err(err) = serve_connection(stream, &manager, &registry, &shutdown).await {
				debug!(target = "asm.daemon", error = %err, "connection closed with error");
			}
		});
	}
}

/// Answers every request line on `stream` until the peer hangs up.
async fn serve_connection<S>(stream: S, manager: &LocalAssetsStreamManager, registry: &SessionManager, shutdown: &watch::Sender<bool>) -> std::io::Result<()>
where
	S: AsyncRead + AsyncWrite + Unpin,
{
	let (read_half, mut write_half) = tokio::io::split(stream);
	let mut lines = BufReader::new(read_half).lines();

	while let Some(line) = lines.next_line().await? {
		if line.trim().is_empty() {
			continue;
		}
		let response = match serde_json::from_str::<ManagerRequest>(&line) {
			Ok(request) => handle_request(manager, registry, request, shutdown).await,
			Err(err) => ManagerResponse::error(StatusCode::InvalidArgument, format!("malformed request: {err}")),
		};
		let mut payload = serde_json::to_string(&response).map_err(std::io::Error::other)?;
		payload.push('\n');
		write_half.write_all(payload.as_bytes()).await?;
		write_half.flush().await?;
	}
	Ok(())
}

/// Runs one request against the manager and maps the outcome to a wire response.
pub async fn handle_request(
	manager: &LocalAssetsStreamManager,
	registry: &SessionManager,
	request: ManagerRequest,
	shutdown: &watch::Sender<bool>,
) -> ManagerResponse {
	let result = match request {
		ManagerRequest::Status => return ManagerResponse::Status(registry.status()),
		ManagerRequest::Shutdown => {
			info!(target = "asm.daemon", "shutdown requested");
			let _ = shutdown.send(true);
			return ManagerResponse::Ok;
		}
		ManagerRequest::StartSession(request) => manager.start_session(&request).await,
		ManagerRequest::StopSession(request) => manager.stop_session(&request).await,
	};
	match result {
		Ok(()) => ManagerResponse::Ok,
		Err(err) => ManagerResponse::error(err.code(), err.to_string()),
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use asset_stream::{AddressResolver, LogMetricsRecorder, SessionConfig};
	use asset_stream_protocol::{RequestOrigin, StartSessionRequest, StopSessionRequest};
	use asset_stream_runtime::TokioProcessFactory;

	use super::*;

	fn manager() -> (LocalAssetsStreamManager, Arc<SessionManager>) {
		let metrics = Arc::new(LogMetricsRecorder);
		let registry = Arc::new(SessionManager::new(SessionConfig::default(), metrics.clone()));
		let resolver = AddressResolver::new(Arc::new(TokioProcessFactory), "/nonexistent/dev/bin/ggp");
		(LocalAssetsStreamManager::new(registry.clone() as Arc<dyn asset_stream::SessionRegistry>, resolver, metrics), registry)
	}

	#[tokio::test]
	async fn status_and_shutdown() {
		let (manager, registry) = manager();
		let (shutdown, mut rx) = watch::channel(false);
		let ManagerResponse::Status(status) = handle_request(&manager, &registry, ManagerRequest::Status, &shutdown).await else {
			panic!("expected a status response");
		};
		assert_eq!(status.session_count, 0);
		assert!(status.sessions.is_empty());
		assert_eq!(status.config["debug"], serde_json::Value::Bool(false));
		assert_eq!(handle_request(&manager, &registry, ManagerRequest::Shutdown, &shutdown).await, ManagerResponse::Ok);
		assert!(rx.has_changed().unwrap());
		assert!(*rx.borrow_and_update());
	}

	#[tokio::test]
	async fn start_session_errors_carry_status() {
		let (manager, registry) = manager();
		let (shutdown, _rx) = watch::channel(false);
		let request = ManagerRequest::StartSession(StartSessionRequest {
			gamelet_name: "gamelets/missing-segments".into(),
			workstation_directory: "/tmp".into(),
			origin: RequestOrigin::Cli,
		});
		let response = handle_request(&manager, &registry, request, &shutdown).await;
		assert_eq!(response.code(), StatusCode::InvalidArgument);
	}

	#[tokio::test]
	async fn stop_unknown_session_is_not_found() {
		let (manager, registry) = manager();
		let (shutdown, _rx) = watch::channel(false);
		let request = ManagerRequest::StopSession(StopSessionRequest { gamelet_id: "edge/e-1/nope".into() });
		assert_eq!(handle_request(&manager, &registry, request, &shutdown).await.code(), StatusCode::NotFound);
	}

	#[tokio::test]
	async fn connection_answers_each_line() {
		let (manager, registry) = manager();
		let (shutdown, _rx) = watch::channel(false);
		let (client, server) = tokio::io::duplex(4096);

		let serve = tokio::spawn(async move { serve_connection(server, &manager, &registry, &shutdown).await });

		let (read_half, mut write_half) = tokio::io::split(client);
		write_half.write_all(b"{\"type\":\"status\"}\nnot json\n").await.unwrap();
		let mut lines = BufReader::new(read_half).lines();
		let first: ManagerResponse = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
		let second: ManagerResponse = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
		assert!(matches!(first, ManagerResponse::Status(ref status) if status.session_count == 0));
		assert_eq!(second.code(), StatusCode::InvalidArgument);

		drop(write_half);
		drop(lines);
		serve.await.unwrap().unwrap();
	}
}
