//! Transport-level status codes returned by every RPC.

use serde::{Deserialize, Serialize};

/// Closed status taxonomy used on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
	#[default]
	Ok,
	Cancelled,
	Unknown,
	InvalidArgument,
	DeadlineExceeded,
	NotFound,
	AlreadyExists,
	ResourceExhausted,
	FailedPrecondition,
	Aborted,
	Unimplemented,
	Internal,
	Unavailable,
}

impl StatusCode {
	pub fn is_ok(&self) -> bool {
		matches!(self, StatusCode::Ok)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			StatusCode::Ok => "OK",
			StatusCode::Cancelled => "CANCELLED",
			StatusCode::Unknown => "UNKNOWN",
			StatusCode::InvalidArgument => "INVALID_ARGUMENT",
			StatusCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
			StatusCode::NotFound => "NOT_FOUND",
			StatusCode::AlreadyExists => "ALREADY_EXISTS",
			StatusCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
			StatusCode::FailedPrecondition => "FAILED_PRECONDITION",
			StatusCode::Aborted => "ABORTED",
			StatusCode::Unimplemented => "UNIMPLEMENTED",
			StatusCode::Internal => "INTERNAL",
			StatusCode::Unavailable => "UNAVAILABLE",
		}
	}
}

impl std::fmt::Display for StatusCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn wire_form_matches_display() {
		for code in [StatusCode::Ok, StatusCode::InvalidArgument, StatusCode::FailedPrecondition, StatusCode::Internal] {
			let wire = serde_json::to_value(code).unwrap();
			assert_eq!(wire, serde_json::Value::String(code.to_string()));
		}
	}
}
