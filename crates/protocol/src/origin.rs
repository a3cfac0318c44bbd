//! Request origin tags carried by `StartSession`.

use serde::{Deserialize, Deserializer, Serialize};

/// Who asked for a streaming session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOrigin {
	#[default]
	Unknown,
	Cli,
	PartnerPortal,
}

impl RequestOrigin {
	/// Parses an origin tag, mapping anything unrecognized to [`RequestOrigin::Unknown`].
	pub fn from_tag(tag: &str) -> Self {
		match tag.trim().to_ascii_lowercase().replace('-', "_").as_str() {
			"cli" | "origin_cli" => RequestOrigin::Cli,
			"partner_portal" | "origin_partner_portal" => RequestOrigin::PartnerPortal,
			_ => RequestOrigin::Unknown,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			RequestOrigin::Unknown => "unknown",
			RequestOrigin::Cli => "cli",
			RequestOrigin::PartnerPortal => "partner_portal",
		}
	}
}

impl<'de> Deserialize<'de> for RequestOrigin {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let value = serde_json::Value::deserialize(deserializer)?;
		Ok(match value {
			serde_json::Value::String(tag) => RequestOrigin::from_tag(&tag),
			serde_json::Value::Number(n) => match n.as_u64() {
				Some(1) => RequestOrigin::Cli,
				Some(2) => RequestOrigin::PartnerPortal,
				_ => RequestOrigin::Unknown,
			},
			_ => RequestOrigin::Unknown,
		})
	}
}

impl std::str::FromStr for RequestOrigin {
	type Err = std::convert::Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(RequestOrigin::from_tag(s))
	}
}

impl std::fmt::Display for RequestOrigin {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
