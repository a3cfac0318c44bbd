//! Process spawning with streamed stdout capture.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{ProcessError, Result};

const READ_CHUNK_SIZE: usize = 4096;

/// Callback receiving every chunk of standard output.
///
/// Runs on the reader task, not on the task that waits for the process.
pub type OutputHandler = Arc<dyn Fn(&[u8]) -> std::result::Result<(), String> + Send + Sync>;

/// Everything needed to launch one external process.
#[derive(Clone)]
pub struct ProcessStartInfo {
	pub program: PathBuf,
	pub args: Vec<String>,
	/// Short name used in logs and errors.
	pub name: String,
	pub stdout_handler: Option<OutputHandler>,
	/// Logs stdout line by line in addition to handing it to `stdout_handler`.
	pub forward_output_to_log: bool,
}

impl ProcessStartInfo {
	pub fn new(program: impl Into<PathBuf>) -> Self {
		let program = program.into();
		let name = program.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
		Self {
			program,
			args: Vec::new(),
			name,
			stdout_handler: None,
			forward_output_to_log: false,
		}
	}

	pub fn arg(mut self, arg: impl Into<String>) -> Self {
		self.args.push(arg.into());
		self
	}

	pub fn args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args.extend(args.into_iter().map(Into::into));
		self
	}

	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}

	pub fn stdout_handler(mut self, handler: OutputHandler) -> Self {
		self.stdout_handler = Some(handler);
		self
	}

	pub fn forward_output_to_log(mut self, forward: bool) -> Self {
		self.forward_output_to_log = forward;
		self
	}

	/// Renders the invocation as a single line, quoting arguments that need it.
	pub fn command_line(&self) -> String {
		let mut line = self.program.display().to_string();
		for arg in &self.args {
			if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '"' || c == '\\') {
				let _ = write!(line, " {}", quoted(arg));
			} else {
				let _ = write!(line, " {arg}");
			}
		}
		line
	}
}

impl std::fmt::Debug for ProcessStartInfo {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ProcessStartInfo")
			.field("program", &self.program)
			.field("args", &self.args)
			.field("name", &self.name)
			.field("stdout_handler", &self.stdout_handler.is_some())
			.field("forward_output_to_log", &self.forward_output_to_log)
			.finish()
	}
}

/// Wraps `s` in double quotes, escaping embedded quotes and backslashes.
pub fn quoted(s: &str) -> String {
	let mut out = String::with_capacity(s.len() + 2);
	out.push('"');
	for c in s.chars() {
		if c == '"' || c == '\\' {
			out.push('\\');
		}
		out.push(c);
	}
	out.push('"');
	out
}

/// A launched (or launchable) external process.
#[async_trait]
pub trait Process: Send {
	/// Spawns the process. Output delivery starts immediately.
	async fn start(&mut self) -> Result<()>;

	/// Blocks the calling task until the process exits and all output has been delivered.
	async fn run_until_exit(&mut self) -> Result<()>;

	/// Exit code after [`Process::run_until_exit`]; `-1` when unavailable (not exited, or killed by a signal).
	fn exit_code(&self) -> i32;
}

/// Creates processes. Lets callers swap in scripted processes for tests.
pub trait ProcessFactory: Send + Sync {
	fn create(&self, start_info: ProcessStartInfo) -> Box<dyn Process>;
}

/// Factory for [`TokioProcess`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessFactory;

impl ProcessFactory for TokioProcessFactory {
	fn create(&self, start_info: ProcessStartInfo) -> Box<dyn Process> {
		Box::new(TokioProcess::new(start_info))
	}
}

/// [`Process`] backed by `tokio::process`.
pub struct TokioProcess {
	info: ProcessStartInfo,
	child: Option<Child>,
	readers: Vec<JoinHandle<Result<()>>>,
	exit_code: Option<i32>,
}

impl TokioProcess {
	pub fn new(info: ProcessStartInfo) -> Self {
		Self {
			info,
			child: None,
			readers: Vec::new(),
			exit_code: None,
		}
	}
}

#[async_trait]
impl Process for TokioProcess {
	async fn start(&mut self) -> Result<()> {
		if self.child.is_some() {
			return Err(ProcessError::AlreadyStarted { name: self.info.name.clone() });
		}

		info!(target = "asm.process", name = %self.info.name, command = %self.info.command_line(), "starting process");

		let mut cmd = Command::new(&self.info.program);
		cmd.args(&self.info.args)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true);

		let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
			name: self.info.name.clone(),
			source,
		})?;

		if let Some(stdout) = child.stdout.take() {
			self.readers.push(tokio::spawn(pump_stdout(
				stdout,
				self.info.name.clone(),
				self.info.stdout_handler.clone(),
				self.info.forward_output_to_log,
			)));
		}
		if let Some(stderr) = child.stderr.take() {
			self.readers.push(tokio::spawn(pump_stderr(stderr, self.info.name.clone())));
		}

		debug!(target = "asm.process", name = %self.info.name, pid = child.id(), "process started");
		self.child = Some(child);
		Ok(())
	}

	async fn run_until_exit(&mut self) -> Result<()> {
		let name = self.info.name.clone();
		let child = self.child.as_mut().ok_or_else(|| ProcessError::NotStarted { name: name.clone() })?;

		let status = child.wait().await.map_err(|source| ProcessError::Wait { name: name.clone(), source })?;
		self.exit_code = Some(status.code().unwrap_or(-1));

		// Pipes close on exit, so the readers finish once the remaining output is drained.
		let mut first_error = None;
		for reader in self.readers.drain(..) {
			let outcome = reader.await.unwrap_or_else(|err| {
				Err(ProcessError::Reader {
					name: name.clone(),
					message: err.to_string(),
				})
			});
			if let Err(err) = outcome {
				first_error.get_or_insert(err);
			}
		}

		debug!(target = "asm.process", %name, exit_code = self.exit_code(), "process exited");
		match first_error {
			Some(err) => Err(err),
			None => Ok(()),
		}
	}

	fn exit_code(&self) -> i32 {
		self.exit_code.unwrap_or(-1)
	}
}

async fn pump_stdout<R>(mut stdout: R, name: String, handler: Option<OutputHandler>, forward_to_log: bool) -> Result<()>
where
	R: AsyncRead + Unpin,
{
	let mut buf = vec![0u8; READ_CHUNK_SIZE];
	let mut pending_line = Vec::new();
	let mut handler_error = None;

	loop {
		let n = stdout.read(&mut buf).await.map_err(|err| ProcessError::Reader {
			name: name.clone(),
			message: err.to_string(),
		})?;
		if n == 0 {
			break;
		}
		let chunk = &buf[..n];

		// Keep draining after a handler failure so the child never blocks on a full pipe.
		if handler_error.is_none() {
			if let Some(handler) = &handler {
				if let Err(message) = handler(chunk) {
					warn!(target = "asm.process", %name, %message, "stdout handler failed");
					handler_error = Some(message);
				}
			}
		}

		if forward_to_log {
			pending_line.extend_from_slice(chunk);
			while let Some(pos) = pending_line.iter().position(|b| *b == b'\n') {
				let line: Vec<u8> = pending_line.drain(..=pos).collect();
				log_line(&name, &line);
			}
		}
	}

	if forward_to_log && !pending_line.is_empty() {
		log_line(&name, &pending_line);
	}

	match handler_error {
		Some(message) => Err(ProcessError::Handler { name, message }),
		None => Ok(()),
	}
}

async fn pump_stderr<R>(stderr: R, name: String) -> Result<()>
where
	R: AsyncRead + Unpin,
{
	let mut lines = BufReader::new(stderr).lines();
	while let Some(line) = lines.next_line().await.map_err(|err| ProcessError::Reader {
		name: name.clone(),
		message: err.to_string(),
	})? {
		warn!(target = "asm.process", %name, stderr = %line.trim_end());
	}
	Ok(())
}

fn log_line(name: &str, line: &[u8]) {
	let text = String::from_utf8_lossy(line);
	info!(target = "asm.process", %name, stdout = %text.trim_end());
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn quoted_escapes_quotes_and_backslashes() {
		assert_eq!(quoted("edge/e-1/abc"), "\"edge/e-1/abc\"");
		assert_eq!(quoted(r#"a "b" \c"#), r#""a \"b\" \\c""#);
		assert_eq!(quoted(""), "\"\"");
	}

	#[test]
	fn command_line_quotes_only_when_needed() {
		let info = ProcessStartInfo::new("/sdk/dev/bin/ggp").args(["ssh", "init", "--instance", "my instance"]);
		assert_eq!(info.command_line(), "/sdk/dev/bin/ggp ssh init --instance \"my instance\"");
	}

	#[test]
	fn name_defaults_to_program_file_name() {
		let info = ProcessStartInfo::new("/usr/bin/true");
		assert_eq!(info.name, "true");
		assert_eq!(ProcessStartInfo::new("/usr/bin/true").name("resolver").name, "resolver");
	}

	#[tokio::test]
	async fn run_before_start_is_rejected() {
		let mut process = TokioProcess::new(ProcessStartInfo::new("does-not-matter"));
		let err = process.run_until_exit().await.unwrap_err();
		assert!(matches!(err, ProcessError::NotStarted { .. }));
		assert_eq!(process.exit_code(), -1);
	}

	#[tokio::test]
	async fn missing_binary_fails_to_spawn() {
		let mut process = TokioProcessFactory.create(ProcessStartInfo::new("/nonexistent/asm-test-binary"));
		let err = process.start().await.unwrap_err();
		assert!(matches!(err, ProcessError::Spawn { .. }));
	}
}
