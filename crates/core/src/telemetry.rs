//! Routing of session events to exactly one telemetry sink.

use tracing::debug;

use crate::metrics::{DeveloperLogEvent, EventType, MetricsRecorder};
use crate::session::MultiSessionHandle;

/// Sink selected for one event.
///
/// Computed once from the registry handle; [`TelemetryRoute::dispatch`] consumes
/// both the route and the event, so an event is recorded exactly once.
pub enum TelemetryRoute<'a> {
	/// No registry handle: record through the global recorder.
	Global,
	/// The handle tracks a session for the instance.
	PerInstance {
		handle: &'a dyn MultiSessionHandle,
		instance_id: &'a str,
	},
	/// The handle exists but does not track the instance.
	Aggregate { handle: &'a dyn MultiSessionHandle },
}

impl<'a> TelemetryRoute<'a> {
	pub fn select(handle: Option<&'a dyn MultiSessionHandle>, instance_id: &'a str) -> Self {
		match handle {
			None => TelemetryRoute::Global,
			Some(handle) if !instance_id.is_empty() && handle.has_session_for_instance(instance_id) => {
				TelemetryRoute::PerInstance { handle, instance_id }
			}
			Some(handle) => TelemetryRoute::Aggregate { handle },
		}
	}

	pub fn name(&self) -> &'static str {
		match self {
			TelemetryRoute::Global => "global",
			TelemetryRoute::PerInstance { .. } => "per_instance",
			TelemetryRoute::Aggregate { .. } => "aggregate",
		}
	}

	pub fn dispatch(self, event: DeveloperLogEvent, kind: EventType, global: &dyn MetricsRecorder) {
		debug!(target = "asm.telemetry", route = self.name(), ?kind, "dispatching event");
		match self {
			TelemetryRoute::Global => global.record_event(event, kind),
			TelemetryRoute::PerInstance { handle, instance_id } => handle.record_session_event(event, kind, instance_id),
			TelemetryRoute::Aggregate { handle } => handle.record_multi_session_event(event, kind),
		}
	}
}
