//! In-process session registry.
//!
//! Keeps track of which gamelets are being streamed from which workstation
//! directory. Sessions are grouped by directory into a [`MultiSession`]; an
//! instance belongs to at most one directory at a time. Content streaming is
//! not handled here.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use asset_stream_protocol::{ManagerStatus, SessionSummary};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::instance_name::ResourceScope;
use crate::metrics::{DeveloperLogEvent, EventType, MetricsRecorder, SessionStartStatus};
use crate::resolver::ResolvedAddress;
use crate::session::{MultiSessionHandle, RegistryStartOutcome, SessionRegistry, StartSessionParams};

/// A gamelet receiving the contents of one workstation directory.
#[derive(Debug, Clone)]
pub struct SessionTarget {
	pub scope: ResourceScope,
	pub address: ResolvedAddress,
	pub started_at: SystemTime,
}

/// All sessions streaming one workstation directory.
pub struct MultiSession {
	src_dir: String,
	sessions: Mutex<HashMap<String, SessionTarget>>,
	metrics: Arc<dyn MetricsRecorder>,
}

impl MultiSession {
	fn new(src_dir: String, metrics: Arc<dyn MetricsRecorder>) -> Self {
		Self {
			src_dir,
			sessions: Mutex::new(HashMap::new()),
			metrics,
		}
	}

	pub fn src_dir(&self) -> &str {
		&self.src_dir
	}

	pub fn session(&self, instance_id: &str) -> Option<SessionTarget> {
		self.sessions.lock().get(instance_id).cloned()
	}

	fn insert(&self, target: SessionTarget) -> Option<SessionTarget> {
		self.sessions.lock().insert(target.scope.instance_id.clone(), target)
	}

	fn remove(&self, instance_id: &str) -> Option<SessionTarget> {
		self.sessions.lock().remove(instance_id)
	}

	fn is_empty(&self) -> bool {
		self.sessions.lock().is_empty()
	}

	fn stamp(&self, event: &mut DeveloperLogEvent) {
		event.manager_data_mut().workstation_directory = Some(self.src_dir.clone());
	}
}

impl MultiSessionHandle for MultiSession {
	fn session_count(&self) -> usize {
		self.sessions.lock().len()
	}

	fn has_session_for_instance(&self, instance_id: &str) -> bool {
		self.sessions.lock().contains_key(instance_id)
	}

	fn record_session_event(&self, mut event: DeveloperLogEvent, kind: EventType, instance_id: &str) {
		self.stamp(&mut event);
		event.manager_data_mut().instance_id = Some(instance_id.to_string());
		if let Some(target) = self.session(instance_id) {
			if event.project_id.is_none() && !target.scope.project_id.is_empty() {
				event.project_id = Some(target.scope.project_id);
			}
			if event.organization_id.is_none() && !target.scope.organization_id.is_empty() {
				event.organization_id = Some(target.scope.organization_id);
			}
		}
		self.metrics.record_event(event, kind);
	}

	fn record_multi_session_event(&self, mut event: DeveloperLogEvent, kind: EventType) {
		self.stamp(&mut event);
		self.metrics.record_event(event, kind);
	}
}

/// Registry of active sessions keyed by workstation directory.
pub struct SessionManager {
	config: SessionConfig,
	metrics: Arc<dyn MetricsRecorder>,
	sessions: Mutex<HashMap<String, Arc<MultiSession>>>,
}

impl SessionManager {
	pub fn new(config: SessionConfig, metrics: Arc<dyn MetricsRecorder>) -> Self {
		Self {
			config,
			metrics,
			sessions: Mutex::new(HashMap::new()),
		}
	}

	/// Snapshot of every active session, sorted by instance id, plus the session configuration.
	pub fn status(&self) -> ManagerStatus {
		let mut sessions: Vec<SessionSummary> = self
			.sessions
			.lock()
			.values()
			.flat_map(|ms| {
				ms.sessions
					.lock()
					.values()
					.map(|target| SessionSummary {
						instance_id: target.scope.instance_id.clone(),
						workstation_directory: ms.src_dir.clone(),
						host: target.address.host.clone(),
						port: target.address.port,
						started_at_unix_secs: target.started_at.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default(),
					})
					.collect::<Vec<_>>()
			})
			.collect();
		sessions.sort_by(|a, b| a.instance_id.cmp(&b.instance_id));

		ManagerStatus {
			session_count: sessions.len(),
			sessions,
			config: serde_json::to_value(&self.config).unwrap_or_default(),
		}
	}

	/// Number of sessions across all workstation directories.
	pub fn session_count(&self) -> usize {
		self.sessions.lock().values().map(|ms| ms.session_count()).sum()
	}

	/// Multi-session streaming `src_dir`, if any.
	pub fn multi_session(&self, src_dir: &str) -> Option<Arc<MultiSession>> {
		self.sessions.lock().get(src_dir).cloned()
	}

	/// Multi-session currently holding `instance_id`, if any.
	pub fn find_multi_session_for_instance(&self, instance_id: &str) -> Option<Arc<MultiSession>> {
		self.sessions.lock().values().find(|ms| ms.has_session_for_instance(instance_id)).cloned()
	}

	/// Drops every session, recording a stop event for each.
	pub fn shutdown(&self) {
		let drained: Vec<Arc<MultiSession>> = self.sessions.lock().drain().map(|(_, ms)| ms).collect();
		for ms in drained {
			let ids: Vec<String> = ms.sessions.lock().keys().cloned().collect();
			for instance_id in ids {
				ms.record_session_event(DeveloperLogEvent::default(), EventType::SessionStop, &instance_id);
				ms.remove(&instance_id);
			}
			info!(target = "asm.session", src_dir = %ms.src_dir(), "multi-session shut down");
		}
	}

	// Removes `instance_id` from whichever directory streams it, dropping emptied directories.
	fn detach(&self, instance_id: &str) -> Option<(Arc<MultiSession>, SessionTarget)> {
		let mut sessions = self.sessions.lock();
		let (src_dir, ms) = sessions
			.iter()
			.find(|(_, ms)| ms.has_session_for_instance(instance_id))
			.map(|(dir, ms)| (dir.clone(), Arc::clone(ms)))?;
		let target = ms.remove(instance_id)?;
		if ms.is_empty() {
			sessions.remove(&src_dir);
		}
		Some((ms, target))
	}
}

fn stop_event(target: &SessionTarget) -> DeveloperLogEvent {
	let scope = &target.scope;
	DeveloperLogEvent {
		project_id: Some(scope.project_id.clone()).filter(|id| !id.is_empty()),
		organization_id: Some(scope.organization_id.clone()).filter(|id| !id.is_empty()),
		..Default::default()
	}
}

#[async_trait]
impl SessionRegistry for SessionManager {
	async fn start_session(&self, params: StartSessionParams<'_>, status: &mut SessionStartStatus) -> RegistryStartOutcome {
		let src_dir = params.workstation_directory;
		let is_dir = !src_dir.is_empty() && tokio::fs::metadata(Path::new(src_dir)).await.map(|m| m.is_dir()).unwrap_or(false);
		if !is_dir {
			*status = SessionStartStatus::InvalidDirError;
			let err = Error::FailedPrecondition(format!("Workstation directory '{src_dir}' does not exist or is not a directory"));
			return RegistryStartOutcome::failed(None, err);
		}

		let instance_id = &params.scope.instance_id;
		let target = SessionTarget {
			scope: params.scope.clone(),
			address: params.address.clone(),
			started_at: SystemTime::now(),
		};

		// Lookup, move and insert happen under one lock so an instance never ends up in two directories.
		let (ms, moved, replaced) = {
			let mut sessions = self.sessions.lock();
			let mut moved = None;
			let previous = sessions
				.iter()
				.find(|(dir, ms)| dir.as_str() != src_dir && ms.has_session_for_instance(instance_id))
				.map(|(dir, ms)| (dir.clone(), Arc::clone(ms)));
			if let Some((previous_dir, previous)) = previous {
				if let Some(old) = previous.remove(instance_id) {
					moved = Some((Arc::clone(&previous), old));
				}
				if previous.is_empty() {
					sessions.remove(&previous_dir);
				}
			}

			let ms = Arc::clone(sessions.entry(src_dir.to_string()).or_insert_with(|| {
				debug!(target = "asm.session", %src_dir, "creating multi-session");
				Arc::new(MultiSession::new(src_dir.to_string(), Arc::clone(&self.metrics)))
			}));
			let replaced = ms.insert(target);
			(ms, moved, replaced)
		};

		if let Some((previous, old)) = moved {
			info!(
				target = "asm.session",
				%instance_id,
				from = %previous.src_dir(),
				to = %src_dir,
				"instance was streamed from another directory; stopped that session"
			);
			previous.record_session_event(stop_event(&old), EventType::SessionStop, instance_id);
		}
		if replaced.is_some() {
			warn!(target = "asm.session", %instance_id, %src_dir, "restarted existing session");
		}

		info!(
			target = "asm.session",
			%instance_id,
			%src_dir,
			host = %params.address.host,
			port = params.address.port,
			sessions = ms.session_count(),
			"session started"
		);
		RegistryStartOutcome::ok(ms)
	}

	async fn stop_session(&self, instance_id: &str) -> Result<()> {
		let Some((ms, target)) = self.detach(instance_id) else {
			return Err(Error::NotFound(format!("No session for instance id '{instance_id}' found")));
		};
		ms.record_session_event(stop_event(&target), EventType::SessionStop, instance_id);
		info!(target = "asm.session", %instance_id, src_dir = %ms.src_dir(), "session stopped");
		Ok(())
	}
}
