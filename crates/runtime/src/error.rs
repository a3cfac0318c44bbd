use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessError>;

#[derive(Debug, Error)]
pub enum ProcessError {
	#[error("process '{name}' has not been started")]
	NotStarted { name: String },

	#[error("process '{name}' is already running")]
	AlreadyStarted { name: String },

	#[error("failed to spawn '{name}': {source}")]
	Spawn {
		name: String,
		#[source]
		source: std::io::Error,
	},

	#[error("failed waiting for '{name}': {source}")]
	Wait {
		name: String,
		#[source]
		source: std::io::Error,
	},

	#[error("output reader for '{name}' failed: {message}")]
	Reader { name: String, message: String },

	#[error("output handler for '{name}' rejected data: {message}")]
	Handler { name: String, message: String },
}
