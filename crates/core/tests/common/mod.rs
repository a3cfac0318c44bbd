#![allow(dead_code)]

use std::sync::Arc;

use asset_stream::metrics::{DeveloperLogEvent, EventType, MetricsRecorder, SessionStartStatus};
use asset_stream::session::{MultiSessionHandle, RegistryStartOutcome, SessionRegistry, StartSessionParams};
use asset_stream::{Error, ResolvedAddress, ResourceScope};
use asset_stream_runtime::{Process, ProcessError, ProcessFactory, ProcessStartInfo};
use async_trait::async_trait;
use parking_lot::Mutex;

/// What a scripted `ggp` invocation does.
#[derive(Debug, Clone)]
pub struct Script {
	pub stdout: Vec<&'static str>,
	pub exit_code: i32,
	pub fail_start: bool,
	pub fail_run: bool,
}

impl Script {
	pub fn ok(stdout: &'static str) -> Self {
		Self {
			stdout: vec![stdout],
			exit_code: 0,
			fail_start: false,
			fail_run: false,
		}
	}

	pub fn chunks(stdout: Vec<&'static str>) -> Self {
		Self { stdout, ..Self::ok("") }
	}

	pub fn exit(code: i32, stdout: &'static str) -> Self {
		Self { exit_code: code, ..Self::ok(stdout) }
	}
}

#[derive(Clone)]
pub struct ScriptedFactory {
	script: Script,
	pub launched: Arc<Mutex<Vec<ProcessStartInfo>>>,
}

impl ScriptedFactory {
	pub fn new(script: Script) -> Self {
		Self {
			script,
			launched: Arc::new(Mutex::new(Vec::new())),
		}
	}

	pub fn launch_count(&self) -> usize {
		self.launched.lock().len()
	}
}

impl ProcessFactory for ScriptedFactory {
	fn create(&self, start_info: ProcessStartInfo) -> Box<dyn Process> {
		self.launched.lock().push(start_info.clone());
		Box::new(ScriptedProcess {
			info: start_info,
			script: self.script.clone(),
			producer: None,
			exit_code: -1,
		})
	}
}

struct ScriptedProcess {
	info: ProcessStartInfo,
	script: Script,
	producer: Option<std::thread::JoinHandle<()>>,
	exit_code: i32,
}

#[async_trait]
impl Process for ScriptedProcess {
	async fn start(&mut self) -> Result<(), ProcessError> {
		if self.script.fail_start {
			return Err(ProcessError::Spawn {
				name: self.info.name.clone(),
				source: std::io::Error::new(std::io::ErrorKind::NotFound, "ggp not installed"),
			});
		}
		// Output arrives from another thread, like a real pipe reader.
		let handler = self.info.stdout_handler.clone();
		let chunks = self.script.stdout.clone();
		self.producer = Some(std::thread::spawn(move || {
			if let Some(handler) = handler {
				for chunk in chunks {
					let _ = handler(chunk.as_bytes());
				}
			}
		}));
		Ok(())
	}

	async fn run_until_exit(&mut self) -> Result<(), ProcessError> {
		if let Some(producer) = self.producer.take() {
			let _ = producer.join();
		}
		if self.script.fail_run {
			return Err(ProcessError::Wait {
				name: self.info.name.clone(),
				source: std::io::Error::other("wait interrupted"),
			});
		}
		self.exit_code = self.script.exit_code;
		Ok(())
	}

	fn exit_code(&self) -> i32 {
		self.exit_code
	}
}

/// Events seen by each of the three sinks.
#[derive(Default)]
pub struct Sinks {
	pub global: Mutex<Vec<(DeveloperLogEvent, EventType)>>,
	pub per_instance: Mutex<Vec<(DeveloperLogEvent, EventType, String)>>,
	pub aggregate: Mutex<Vec<(DeveloperLogEvent, EventType)>>,
}

impl Sinks {
	pub fn counts(&self) -> (usize, usize, usize) {
		(self.global.lock().len(), self.per_instance.lock().len(), self.aggregate.lock().len())
	}
}

pub struct GlobalRecorder(pub Arc<Sinks>);

impl MetricsRecorder for GlobalRecorder {
	fn record_event(&self, event: DeveloperLogEvent, kind: EventType) {
		self.0.global.lock().push((event, kind));
	}
}

pub struct FakeHandle {
	pub tracked: Vec<String>,
	pub count: usize,
	pub sinks: Arc<Sinks>,
}

impl MultiSessionHandle for FakeHandle {
	fn session_count(&self) -> usize {
		self.count
	}

	fn has_session_for_instance(&self, instance_id: &str) -> bool {
		self.tracked.iter().any(|id| id == instance_id)
	}

	fn record_session_event(&self, event: DeveloperLogEvent, kind: EventType, instance_id: &str) {
		self.sinks.per_instance.lock().push((event, kind, instance_id.to_string()));
	}

	fn record_multi_session_event(&self, event: DeveloperLogEvent, kind: EventType) {
		self.sinks.aggregate.lock().push((event, kind));
	}
}

/// How the fake registry answers `start_session`.
pub enum RegistryReply {
	Started { tracked: Vec<String>, count: usize },
	FailedWithHandle { tracked: Vec<String>, count: usize, status: SessionStartStatus, err: fn() -> Error },
	FailedWithoutHandle { err: fn() -> Error },
}

pub struct FakeRegistry {
	reply: RegistryReply,
	sinks: Arc<Sinks>,
	pub starts: Mutex<Vec<(ResourceScope, ResolvedAddress, String)>>,
	pub stops: Mutex<Vec<String>>,
	pub stop_result: fn(&str) -> Result<(), Error>,
}

impl FakeRegistry {
	pub fn new(reply: RegistryReply, sinks: Arc<Sinks>) -> Self {
		Self {
			reply,
			sinks,
			starts: Mutex::new(Vec::new()),
			stops: Mutex::new(Vec::new()),
			stop_result: |_| Ok(()),
		}
	}

	fn handle(&self, tracked: &[String], count: usize) -> Arc<dyn MultiSessionHandle> {
		Arc::new(FakeHandle {
			tracked: tracked.to_vec(),
			count,
			sinks: Arc::clone(&self.sinks),
		})
	}
}

#[async_trait]
impl SessionRegistry for FakeRegistry {
	async fn start_session(&self, params: StartSessionParams<'_>, status: &mut SessionStartStatus) -> RegistryStartOutcome {
		self.starts
			.lock()
			.push((params.scope.clone(), params.address.clone(), params.workstation_directory.to_string()));
		match &self.reply {
			RegistryReply::Started { tracked, count } => RegistryStartOutcome::ok(self.handle(tracked, *count)),
			RegistryReply::FailedWithHandle {
				tracked,
				count,
				status: reported,
				err,
			} => {
				*status = *reported;
				RegistryStartOutcome::failed(Some(self.handle(tracked, *count)), err())
			}
			RegistryReply::FailedWithoutHandle { err } => RegistryStartOutcome::failed(None, err()),
		}
	}

	async fn stop_session(&self, instance_id: &str) -> Result<(), Error> {
		self.stops.lock().push(instance_id.to_string());
		(self.stop_result)(instance_id)
	}
}
