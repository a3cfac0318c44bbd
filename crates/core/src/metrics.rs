//! Developer telemetry events.
//!
//! Events are built by the request handlers and handed, by value, to exactly
//! one [`MetricsRecorder`] (directly, or through a session handle). Transport
//! and storage belong to the recorder.

use asset_stream_protocol::StatusCode;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
	SessionStart,
	SessionStop,
}

/// Origin of a start request as recorded in telemetry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOrigin {
	#[default]
	Unknown,
	Cli,
	PartnerPortal,
}

impl From<asset_stream_protocol::RequestOrigin> for RequestOrigin {
	fn from(origin: asset_stream_protocol::RequestOrigin) -> Self {
		match origin {
			asset_stream_protocol::RequestOrigin::Unknown => RequestOrigin::Unknown,
			asset_stream_protocol::RequestOrigin::Cli => RequestOrigin::Cli,
			asset_stream_protocol::RequestOrigin::PartnerPortal => RequestOrigin::PartnerPortal,
		}
	}
}

/// Registry-specific outcome of a session start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStartStatus {
	#[default]
	Ok,
	InvalidDirError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStartData {
	pub status_code: StatusCode,
	pub status: SessionStartStatus,
	pub origin: RequestOrigin,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub concurrent_session_count: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssetStreamingManagerData {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub session_start_data: Option<SessionStartData>,
	/// Set when the event is attributed to a single instance.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub instance_id: Option<String>,
	/// Workstation directory of the multi-session that recorded the event.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub workstation_directory: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeveloperLogEvent {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub project_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub organization_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub as_manager_data: Option<AssetStreamingManagerData>,
}

impl DeveloperLogEvent {
	/// Start event with an `Ok` status and the given origin.
	pub fn session_start(origin: RequestOrigin) -> Self {
		Self {
			as_manager_data: Some(AssetStreamingManagerData {
				session_start_data: Some(SessionStartData {
					origin,
					..Default::default()
				}),
				..Default::default()
			}),
			..Default::default()
		}
	}

	pub fn manager_data_mut(&mut self) -> &mut AssetStreamingManagerData {
		self.as_manager_data.get_or_insert_with(Default::default)
	}

	pub fn session_start_data_mut(&mut self) -> &mut SessionStartData {
		self.manager_data_mut().session_start_data.get_or_insert_with(Default::default)
	}

	pub fn session_start_data(&self) -> Option<&SessionStartData> {
		self.as_manager_data.as_ref()?.session_start_data.as_ref()
	}
}

/// Global telemetry sink.
pub trait MetricsRecorder: Send + Sync {
	fn record_event(&self, event: DeveloperLogEvent, kind: EventType);
}

/// Recorder that emits every event as a structured log record.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMetricsRecorder;

impl MetricsRecorder for LogMetricsRecorder {
	fn record_event(&self, event: DeveloperLogEvent, kind: EventType) {
		match serde_json::to_string(&event) {
			Ok(payload) => info!(target = "asm.metrics", ?kind, event = %payload, "recorded event"),
			Err(err) => info!(target = "asm.metrics", ?kind, error = %err, "recorded unserializable event"),
		}
	}
}
