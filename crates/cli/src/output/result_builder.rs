use std::io::{self, Write};
use std::time::Instant;

use asset_stream_protocol::StatusCode;
use serde::Serialize;

use super::format::OutputFormat;
use super::model::{CommandError, CommandResult, SCHEMA_VERSION};

/// Builder for constructing command results.
pub struct ResultBuilder<T> {
	command: String,
	data: Option<T>,
	error: Option<CommandError>,
	start_time: Instant,
}

impl<T: Serialize> ResultBuilder<T> {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			data: None,
			error: None,
			start_time: Instant::now(),
		}
	}

	pub fn data(mut self, data: T) -> Self {
		self.data = Some(data);
		self
	}

	pub fn error(mut self, code: StatusCode, message: impl Into<String>) -> Self {
		self.error = Some(CommandError { code, message: message.into() });
		self
	}

	pub fn build(self) -> CommandResult<T> {
		CommandResult {
			schema_version: SCHEMA_VERSION,
			ok: self.error.is_none(),
			command: self.command,
			data: self.data,
			error: self.error,
			duration_ms: Some(self.start_time.elapsed().as_millis() as u64),
		}
	}
}

/// Print a command result to stdout in the specified format.
pub fn print_result<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string_pretty(result) {
				println!("{json}");
			}
		}
		OutputFormat::Ndjson => {
			if let Ok(json) = serde_json::to_string(result) {
				println!("{json}");
			}
		}
		OutputFormat::Text => print_result_text(result),
	}
}

fn print_result_text<T: Serialize>(result: &CommandResult<T>) {
	let mut stdout = io::stdout().lock();

	if let Some(error) = &result.error {
		let _ = writeln!(stdout, "Error [{}]: {}", error.code, error.message);
	} else if let Some(data) = &result.data {
		if let Ok(json) = serde_json::to_string_pretty(data) {
			let _ = writeln!(stdout, "{json}");
		}
	}

	if let Some(duration_ms) = result.duration_ms {
		let _ = writeln!(stdout, "Completed in {duration_ms}ms");
	}
}
