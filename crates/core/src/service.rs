//! Request handlers for `StartSession` and `StopSession`.

use std::sync::Arc;

use asset_stream_protocol::{StartSessionRequest, StopSessionRequest};
use tracing::{error, info};

use crate::error::{Result, status_code};
use crate::instance_name::ResourceScope;
use crate::metrics::{DeveloperLogEvent, EventType, MetricsRecorder, SessionStartStatus};
use crate::resolver::AddressResolver;
use crate::session::{MultiSessionHandle, SessionRegistry, StartSessionParams};
use crate::telemetry::TelemetryRoute;

/// Bootstraps and tears down streaming sessions on behalf of RPC clients.
pub struct LocalAssetsStreamManager {
	registry: Arc<dyn SessionRegistry>,
	resolver: AddressResolver,
	metrics: Arc<dyn MetricsRecorder>,
}

impl LocalAssetsStreamManager {
	pub fn new(registry: Arc<dyn SessionRegistry>, resolver: AddressResolver, metrics: Arc<dyn MetricsRecorder>) -> Self {
		Self { registry, resolver, metrics }
	}

	/// Parses the gamelet name, resolves its address and starts a session.
	///
	/// Always records exactly one `SessionStart` event, whichever step failed.
	pub async fn start_session(&self, request: &StartSessionRequest) -> Result<()> {
		info!(
			target = "asm.rpc",
			gamelet_name = %request.gamelet_name,
			workstation_directory = %request.workstation_directory,
			origin = %request.origin,
			"RPC:StartSession"
		);

		let mut event = DeveloperLogEvent::session_start(request.origin.into());
		let mut start_status = SessionStartStatus::Ok;
		let mut handle: Option<Arc<dyn MultiSessionHandle>> = None;
		let mut instance_id = String::new();

		let result = match ResourceScope::parse(&request.gamelet_name) {
			Err(err) => Err(err),
			Ok(scope) => {
				event.project_id = Some(scope.project_id.clone());
				event.organization_id = Some(scope.organization_id.clone());
				instance_id = scope.instance_id.clone();

				match self.resolver.resolve(&scope.instance_id, &scope.project_id, &scope.organization_id).await {
					Err(err) => Err(err),
					Ok(address) => {
						let params = StartSessionParams {
							scope: &scope,
							address: &address,
							workstation_directory: &request.workstation_directory,
						};
						let outcome = self.registry.start_session(params, &mut start_status).await;
						handle = outcome.handle;
						outcome.result
					}
				}
			}
		};

		let data = event.session_start_data_mut();
		data.status_code = status_code(&result);
		data.status = start_status;
		if let Some(handle) = &handle {
			data.concurrent_session_count = Some(handle.session_count());
		}

		TelemetryRoute::select(handle.as_deref(), &instance_id).dispatch(event, EventType::SessionStart, self.metrics.as_ref());

		match &result {
			Ok(()) => info!(target = "asm.rpc", %instance_id, "StartSession() succeeded"),
			Err(err) => error!(target = "asm.rpc", code = %err.code(), error = %err, "StartSession() failed"),
		}
		result
	}

	/// Stops the session for the raw gamelet id. Telemetry is left to the registry.
	pub async fn stop_session(&self, request: &StopSessionRequest) -> Result<()> {
		info!(target = "asm.rpc", gamelet_id = %request.gamelet_id, "RPC:StopSession");

		let result = self.registry.stop_session(&request.gamelet_id).await;
		match &result {
			Ok(()) => info!(target = "asm.rpc", "StopSession() succeeded"),
			Err(err) => error!(target = "asm.rpc", code = %err.code(), error = %err, "StopSession() failed"),
		}
		result
	}
}
