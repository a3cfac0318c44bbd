//! Asset streaming configuration.
//!
//! Values start from defaults, are overridden by command line flags, and
//! finally by an optional JSON file:
//!
//! ```json
//! {
//!   "src_dir": "C:\\path\\to\\assets",
//!   "verbosity": 3,
//!   "debug": 0,
//!   "singlethreaded": 0,
//!   "stats": 0,
//!   "quiet": 0,
//!   "check": 0,
//!   "log_to_stdout": 0,
//!   "cache_capacity": "150G",
//!   "cleanup_timeout": 300,
//!   "access_idle_timeout": 5,
//!   "manifest_updater_threads": 4,
//!   "file_change_wait_duration_ms": 500
//! }
//! ```
//!
//! A value that cannot be read is reported through
//! [`AssetStreamConfig::flag_read_errors`] and leaves the previous value in place.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

pub const DEFAULT_CACHE_CAPACITY: u64 = 150 << 30;

/// Settings handed to every streaming session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionConfig {
	pub verbosity: u32,
	pub debug: bool,
	pub singlethreaded: bool,
	pub stats: bool,
	pub quiet: bool,
	pub check: bool,
	/// Remote cache capacity in bytes.
	pub cache_capacity: u64,
	pub cleanup_timeout_sec: u64,
	pub access_idle_timeout_sec: u64,
	pub manifest_updater_threads: u32,
	pub file_change_wait_duration_ms: u64,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			verbosity: 2,
			debug: false,
			singlethreaded: false,
			stats: false,
			quiet: false,
			check: false,
			cache_capacity: DEFAULT_CACHE_CAPACITY,
			cleanup_timeout_sec: 300,
			access_idle_timeout_sec: 5,
			manifest_updater_threads: 4,
			file_change_wait_duration_ms: 500,
		}
	}
}

#[derive(Debug, Clone, Default)]
pub struct AssetStreamConfig {
	/// Workstation directory to stream at startup. Usually empty; sessions are started over RPC.
	pub src_dir: String,
	/// Address of a gamelet to stream to at startup, for development.
	pub instance_ip: String,
	pub instance_port: u16,
	pub session: SessionConfig,
	pub log_to_stdout: bool,
	/// SDK installation root used to locate `ggp`.
	pub sdk_dir: Option<PathBuf>,
	flags_read_from_file: BTreeSet<String>,
	flag_read_errors: BTreeMap<String, String>,
}

impl AssetStreamConfig {
	/// Overrides values with those present in the JSON file at `path`.
	///
	/// Returns [`Error::NotFound`] when the file is missing and
	/// [`Error::InvalidArgument`] when it is not a JSON object.
	pub fn load_from_file(&mut self, path: &Path) -> Result<()> {
		let content = match std::fs::read_to_string(path) {
			Ok(content) => content,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
				return Err(Error::NotFound(format!("Config file '{}' not found", path.display())));
			}
			Err(err) => return Err(err.into()),
		};

		let value: Value = serde_json::from_str(&content)
			.map_err(|err| Error::InvalidArgument(format!("Failed to parse config file '{}': {err}", path.display())))?;
		let Value::Object(fields) = value else {
			return Err(Error::InvalidArgument(format!("Config file '{}' must contain a JSON object", path.display())));
		};

		for (key, value) in &fields {
			match self.apply(key, value) {
				Ok(()) => {
					self.flags_read_from_file.insert(key.clone());
				}
				Err(message) => {
					self.flag_read_errors.insert(key.clone(), message);
				}
			}
		}
		Ok(())
	}

	/// Comma-separated, sorted list of values taken from the config file.
	pub fn flags_read_from_file(&self) -> String {
		self.flags_read_from_file.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
	}

	/// One line per value that could not be read from the config file.
	pub fn flag_read_errors(&self) -> String {
		self.flag_read_errors
			.iter()
			.map(|(key, message)| format!("Failed to read '{key}': {message}"))
			.collect::<Vec<_>>()
			.join("\n")
	}

	fn apply(&mut self, key: &str, value: &Value) -> std::result::Result<(), String> {
		let session = &mut self.session;
		match key {
			"src_dir" => self.src_dir = read_string(value)?,
			"instance_ip" => self.instance_ip = read_string(value)?,
			"instance_port" => self.instance_port = read_int(value)?,
			"sdk_dir" => self.sdk_dir = Some(PathBuf::from(read_string(value)?)).filter(|p| !p.as_os_str().is_empty()),
			"log_to_stdout" => self.log_to_stdout = read_bool(value)?,
			"verbosity" => session.verbosity = read_int(value)?,
			"debug" => session.debug = read_bool(value)?,
			"singlethreaded" => session.singlethreaded = read_bool(value)?,
			"stats" => session.stats = read_bool(value)?,
			"quiet" => session.quiet = read_bool(value)?,
			"check" => session.check = read_bool(value)?,
			"cache_capacity" => session.cache_capacity = read_size(value)?,
			"cleanup_timeout" => session.cleanup_timeout_sec = read_int(value)?,
			"access_idle_timeout" => session.access_idle_timeout_sec = read_int(value)?,
			"manifest_updater_threads" => session.manifest_updater_threads = read_int(value)?,
			"file_change_wait_duration_ms" => session.file_change_wait_duration_ms = read_int(value)?,
			_ => return Err("unknown option".to_string()),
		}
		Ok(())
	}
}

impl fmt::Display for AssetStreamConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = &self.session;
		writeln!(f, "src_dir                      = {}", self.src_dir)?;
		writeln!(f, "instance_ip                  = {}", self.instance_ip)?;
		writeln!(f, "instance_port                = {}", self.instance_port)?;
		writeln!(f, "sdk_dir                      = {}", self.sdk_dir.as_deref().map(|p| p.display().to_string()).unwrap_or_default())?;
		writeln!(f, "log_to_stdout                = {}", self.log_to_stdout)?;
		writeln!(f, "verbosity                    = {}", s.verbosity)?;
		writeln!(f, "debug                        = {}", s.debug)?;
		writeln!(f, "singlethreaded               = {}", s.singlethreaded)?;
		writeln!(f, "stats                        = {}", s.stats)?;
		writeln!(f, "quiet                        = {}", s.quiet)?;
		writeln!(f, "check                        = {}", s.check)?;
		writeln!(f, "cache_capacity               = {}", s.cache_capacity)?;
		writeln!(f, "cleanup_timeout              = {}", s.cleanup_timeout_sec)?;
		writeln!(f, "access_idle_timeout          = {}", s.access_idle_timeout_sec)?;
		writeln!(f, "manifest_updater_threads     = {}", s.manifest_updater_threads)?;
		write!(f, "file_change_wait_duration_ms = {}", s.file_change_wait_duration_ms)
	}
}

/// Default location of the config file, `<config dir>/asset_stream_manager/assets_stream_manager.json`.
pub fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("asset_stream_manager").join("assets_stream_manager.json"))
}

fn read_string(value: &Value) -> std::result::Result<String, String> {
	value.as_str().map(str::to_string).ok_or_else(|| format!("expected a string, got {value}"))
}

fn read_bool(value: &Value) -> std::result::Result<bool, String> {
	match value {
		Value::Bool(b) => Ok(*b),
		Value::Number(n) => match n.as_i64() {
			Some(0) => Ok(false),
			Some(1) => Ok(true),
			_ => Err(format!("expected 0 or 1, got {n}")),
		},
		other => Err(format!("expected a boolean, got {other}")),
	}
}

fn read_int<T: TryFrom<u64>>(value: &Value) -> std::result::Result<T, String> {
	let n = value.as_u64().ok_or_else(|| format!("expected a non-negative integer, got {value}"))?;
	T::try_from(n).map_err(|_| format!("value {n} is out of range"))
}

fn read_size(value: &Value) -> std::result::Result<u64, String> {
	match value {
		Value::String(s) => parse_size(s),
		Value::Number(_) => read_int(value),
		other => Err(format!("expected a size such as \"150G\", got {other}")),
	}
}

/// Parses sizes like `1024`, `512K`, `150G` (binary units).
pub fn parse_size(text: &str) -> std::result::Result<u64, String> {
	let text = text.trim();
	let split = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
	let (digits, unit) = text.split_at(split);
	let base: u64 = digits.parse().map_err(|_| format!("invalid size '{text}'"))?;
	let shift = match unit.trim().to_ascii_uppercase().trim_end_matches('B') {
		"" => 0,
		"K" => 10,
		"M" => 20,
		"G" => 30,
		"T" => 40,
		_ => return Err(format!("invalid size unit in '{text}'")),
	};
	base.checked_mul(1u64 << shift).ok_or_else(|| format!("size '{text}' is too large"))
}
