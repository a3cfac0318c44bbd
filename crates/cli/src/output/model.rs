use asset_stream_protocol::{SessionSummary, StatusCode};
use serde::{Deserialize, Serialize};

/// Current schema version for command output.
pub const SCHEMA_VERSION: u32 = 1;

/// The result envelope printed by every client command.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T> {
	pub schema_version: u32,
	pub ok: bool,
	pub command: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub duration_ms: Option<u64>,
}

/// Error information for failed commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: StatusCode,
	pub message: String,
}

/// Payload of `start-session` and `stop-session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
	pub gamelet: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub workstation_directory: Option<String>,
}

/// Payload of `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
	pub running: bool,
	pub endpoint: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_count: Option<usize>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub sessions: Vec<SessionSummary>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub config: Option<serde_json::Value>,
}

impl StatusData {
	pub fn not_running(endpoint: String) -> Self {
		Self {
			running: false,
			endpoint,
			session_count: None,
			sessions: Vec::new(),
			config: None,
		}
	}
}

/// Payload of `shutdown`. `stopped` is false when no daemon was running.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShutdownData {
	pub stopped: bool,
	pub endpoint: String,
}
