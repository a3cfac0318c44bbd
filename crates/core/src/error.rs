use asset_stream_protocol::StatusCode;
use asset_stream_runtime::ProcessError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Field of the `ggp ssh init` response that could not be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputField {
	Host,
	Port,
}

impl std::fmt::Display for OutputField {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			OutputField::Host => write!(f, "host"),
			OutputField::Port => write!(f, "ssh port"),
		}
	}
}

#[derive(Debug, Error)]
pub enum Error {
	#[error("{0}")]
	InvalidArgument(String),

	#[error("{0}")]
	NotFound(String),

	#[error("{0}")]
	FailedPrecondition(String),

	#[error("Failed to start {tool} process: {source}")]
	ProcessStart {
		tool: String,
		#[source]
		source: ProcessError,
	},

	#[error("Failed to run {tool} process: {source}")]
	ProcessRun {
		tool: String,
		#[source]
		source: ProcessError,
	},

	#[error("{tool} process exited with code {code}")]
	ProcessExitNonZero { tool: String, code: i32 },

	#[error("Failed to parse {field} from ggp ssh init response\n{output}")]
	OutputParse { field: OutputField, output: String },

	/// Status reported by the session registry, passed through untouched.
	#[error("{message}")]
	Registry { code: StatusCode, message: String },

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

impl Error {
	pub fn registry(code: StatusCode, message: impl Into<String>) -> Self {
		Error::Registry { code, message: message.into() }
	}

	/// Transport-level status for this error.
	pub fn code(&self) -> StatusCode {
		match self {
			Error::InvalidArgument(_) => StatusCode::InvalidArgument,
			Error::NotFound(_) => StatusCode::NotFound,
			Error::FailedPrecondition(_) => StatusCode::FailedPrecondition,
			// A tool that is not installed is a lookup failure, not a crash.
			Error::ProcessStart {
				source: ProcessError::Spawn { source, .. },
				..
			} if source.kind() == std::io::ErrorKind::NotFound => StatusCode::NotFound,
			Error::ProcessStart { .. } | Error::ProcessRun { .. } | Error::ProcessExitNonZero { .. } | Error::OutputParse { .. } | Error::Io(_) => {
				StatusCode::Internal
			}
			Error::Registry { code, .. } => *code,
		}
	}
}

/// Status code of a result, `Ok` on success.
pub fn status_code<T>(result: &Result<T>) -> StatusCode {
	match result {
		Ok(_) => StatusCode::Ok,
		Err(err) => err.code(),
	}
}
