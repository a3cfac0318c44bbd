use serde::{Deserialize, Serialize};

use crate::origin::RequestOrigin;
use crate::status::StatusCode;

/// Starts streaming `workstation_directory` to the gamelet named `gamelet_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartSessionRequest {
	/// Full resource name, `organizations/{org}/projects/{proj}/pools/{pool}/gamelets/{id}`.
	pub gamelet_name: String,
	pub workstation_directory: String,
	#[serde(default)]
	pub origin: RequestOrigin,
}

/// Stops the session streaming to `gamelet_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopSessionRequest {
	pub gamelet_id: String,
}

/// One active session as reported by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
	pub instance_id: String,
	pub workstation_directory: String,
	pub host: String,
	pub port: u16,
	pub started_at_unix_secs: u64,
}

/// Daemon state: active sessions and the effective session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerStatus {
	pub session_count: usize,
	pub sessions: Vec<SessionSummary>,
	pub config: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ManagerRequest {
	Status,
	StartSession(StartSessionRequest),
	StopSession(StopSessionRequest),
	Shutdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ManagerResponse {
	Status(ManagerStatus),
	Ok,
	Error { code: StatusCode, message: String },
}

impl ManagerResponse {
	pub fn error(code: StatusCode, message: impl Into<String>) -> Self {
		ManagerResponse::Error { code, message: message.into() }
	}

	pub fn code(&self) -> StatusCode {
		match self {
			ManagerResponse::Status(_) | ManagerResponse::Ok => StatusCode::Ok,
			ManagerResponse::Error { code, .. } => *code,
		}
	}
}
