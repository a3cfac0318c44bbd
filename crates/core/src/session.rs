//! Interfaces of the session registry that owns streaming sessions.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::instance_name::ResourceScope;
use crate::metrics::{DeveloperLogEvent, EventType, SessionStartStatus};
use crate::resolver::ResolvedAddress;

/// Arguments of [`SessionRegistry::start_session`].
#[derive(Debug, Clone, Copy)]
pub struct StartSessionParams<'a> {
	pub scope: &'a ResourceScope,
	pub address: &'a ResolvedAddress,
	pub workstation_directory: &'a str,
}

/// Registry-owned state shared by all sessions streaming one workstation directory.
///
/// The registry keeps the handle alive for at least the duration of the request that received it.
pub trait MultiSessionHandle: Send + Sync {
	fn session_count(&self) -> usize;

	fn has_session_for_instance(&self, instance_id: &str) -> bool;

	/// Records an event attributed to the session streaming to `instance_id`.
	fn record_session_event(&self, event: DeveloperLogEvent, kind: EventType, instance_id: &str);

	/// Records an event that concerns the handle as a whole.
	fn record_multi_session_event(&self, event: DeveloperLogEvent, kind: EventType);
}

/// Result of [`SessionRegistry::start_session`].
///
/// `handle` may be set even when `result` is an error.
pub struct RegistryStartOutcome {
	pub handle: Option<Arc<dyn MultiSessionHandle>>,
	pub result: Result<()>,
}

impl RegistryStartOutcome {
	pub fn ok(handle: Arc<dyn MultiSessionHandle>) -> Self {
		Self { handle: Some(handle), result: Ok(()) }
	}

	pub fn failed(handle: Option<Arc<dyn MultiSessionHandle>>, err: crate::Error) -> Self {
		Self { handle, result: Err(err) }
	}
}

/// Owner of active streaming sessions.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
	/// Starts streaming to `params.scope.instance_id`. `status` receives the registry-specific outcome.
	async fn start_session(&self, params: StartSessionParams<'_>, status: &mut SessionStartStatus) -> RegistryStartOutcome;

	/// Stops the session for `instance_id`.
	async fn stop_session(&self, instance_id: &str) -> Result<()>;
}
