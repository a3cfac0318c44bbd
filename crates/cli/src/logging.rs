//! Tracing subscriber setup.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::Result;

/// Where log records go.
#[derive(Debug, Clone)]
pub enum LogSink {
	Stdout,
	Stderr,
	File(PathBuf),
}

/// Default daemon log file, `<data dir>/asset_stream_manager/logs/assets_stream_manager.log`.
pub fn default_log_file() -> PathBuf {
	dirs::data_local_dir()
		.unwrap_or_else(std::env::temp_dir)
		.join("asset_stream_manager")
		.join("logs")
		.join("assets_stream_manager.log")
}

fn filter_for(verbose: u8) -> EnvFilter {
	EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		let level = match verbose {
			0 => "warn",
			1 => "info",
			_ => "debug",
		};
		EnvFilter::new(level)
	})
}

/// Installs the global subscriber. `RUST_LOG` overrides the `-v` count.
pub fn init_logging(verbose: u8, sink: LogSink) -> Result<()> {
	let builder = tracing_subscriber::fmt().with_env_filter(filter_for(verbose)).with_target(true);

	// A subscriber may already be installed (tests, repeated init); keep the first one.
	match sink {
		LogSink::Stdout => {
			let _ = builder.with_writer(std::io::stdout).try_init();
		}
		LogSink::Stderr => {
			let _ = builder.with_writer(std::io::stderr).try_init();
		}
		LogSink::File(path) => {
			if let Some(dir) = path.parent() {
				std::fs::create_dir_all(dir)?;
			}
			let file = OpenOptions::new().create(true).append(true).open(&path)?;
			let _ = builder.with_ansi(false).with_writer(Mutex::new(file)).try_init();
		}
	}
	Ok(())
}
