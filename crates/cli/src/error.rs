use asset_stream_protocol::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("{0}")]
	Context(String),

	#[error("daemon returned {code}: {message}")]
	Daemon { code: StatusCode, message: String },

	#[error("daemon is not running at {0}")]
	NotRunning(String),

	#[error(transparent)]
	Core(#[from] asset_stream::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl CliError {
	/// Status code reported in command output.
	pub fn code(&self) -> StatusCode {
		match self {
			CliError::Daemon { code, .. } => *code,
			CliError::Core(err) => err.code(),
			CliError::NotRunning(_) => StatusCode::Unavailable,
			CliError::Context(_) | CliError::Io(_) | CliError::Anyhow(_) => StatusCode::Internal,
		}
	}
}
