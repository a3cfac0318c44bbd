//! SSH address resolution via `ggp ssh init`.

use std::path::PathBuf;
use std::sync::Arc;

use asset_stream_runtime::{OutputHandler, ProcessFactory, ProcessStartInfo};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, OutputField, Result};
use crate::output_fields::parse_value;

const TOOL: &str = "ggp";

/// Reachable SSH endpoint of a gamelet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress {
	pub host: String,
	pub port: u16,
}

/// Runs `ggp ssh init` and extracts the gamelet's host and port from its output.
#[derive(Clone)]
pub struct AddressResolver {
	process_factory: Arc<dyn ProcessFactory>,
	ggp_path: PathBuf,
}

impl AddressResolver {
	pub fn new(process_factory: Arc<dyn ProcessFactory>, ggp_path: impl Into<PathBuf>) -> Self {
		Self {
			process_factory,
			ggp_path: ggp_path.into(),
		}
	}

	/// Builds the `ggp ssh init` invocation. Project and organization are passed only when non-empty.
	pub fn start_info(&self, instance_id: &str, project_id: &str, organization_id: &str) -> ProcessStartInfo {
		let mut info = ProcessStartInfo::new(&self.ggp_path)
			.name("ggp ssh init")
			.args(["ssh", "init", "--instance", instance_id]);
		if !project_id.is_empty() {
			info = info.args(["--project", project_id]);
		}
		if !organization_id.is_empty() {
			info = info.args(["--organization", organization_id]);
		}
		info
	}

	/// Resolves the SSH address of `instance_id`. Every failure is terminal.
	pub async fn resolve(&self, instance_id: &str, project_id: &str, organization_id: &str) -> Result<ResolvedAddress> {
		// Written by the process reader task while this task waits for exit.
		let output = Arc::new(Mutex::new(Vec::<u8>::new()));
		let sink = Arc::clone(&output);
		let handler: OutputHandler = Arc::new(move |data: &[u8]| {
			sink.lock().extend_from_slice(data);
			Ok(())
		});

		let start_info = self
			.start_info(instance_id, project_id, organization_id)
			.stdout_handler(handler)
			.forward_output_to_log(true);
		let mut process = self.process_factory.create(start_info);

		process.start().await.map_err(|source| Error::ProcessStart { tool: TOOL.into(), source })?;
		process.run_until_exit().await.map_err(|source| Error::ProcessRun { tool: TOOL.into(), source })?;

		let code = process.exit_code();
		if code != 0 {
			return Err(Error::ProcessExitNonZero { tool: TOOL.into(), code });
		}

		let output = String::from_utf8_lossy(&output.lock()).into_owned();
		let address = parse_ssh_init_output(&output)?;
		debug!(target = "asm.resolver", %instance_id, host = %address.host, port = address.port, "resolved gamelet address");
		Ok(address)
	}
}

/// Extracts `Host:` and `Port:` from `ggp ssh init` output.
pub fn parse_ssh_init_output(output: &str) -> Result<ResolvedAddress> {
	let parse_error = |field| Error::OutputParse {
		field,
		output: output.to_string(),
	};

	let host = parse_value(output, "Host").ok_or_else(|| parse_error(OutputField::Host))?;
	let port = parse_value(output, "Port")
		.map(atoi)
		.and_then(|port| u16::try_from(port).ok())
		.filter(|port| *port != 0)
		.ok_or_else(|| parse_error(OutputField::Port))?;

	Ok(ResolvedAddress {
		host: host.to_string(),
		port,
	})
}

/// Leading-integer parse: optional whitespace and sign, then digits. Anything else yields 0.
fn atoi(text: &str) -> i64 {
	let text = text.trim_start();
	let (negative, digits) = match text.as_bytes().first() {
		Some(b'-') => (true, &text[1..]),
		Some(b'+') => (false, &text[1..]),
		_ => (false, text),
	};

	let value = digits
		.bytes()
		.take_while(u8::is_ascii_digit)
		.fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(i64::from(d - b'0')));
	if negative { -value } else { value }
}
