//! Gamelet resource names.
//!
//! A gamelet is addressed by a fixed ten-segment name:
//! `organizations/{org}/projects/{proj}/pools/{pool}/gamelets/{a}/{b}/{c}`.
//! The instance id is the `{a}/{b}/{c}` tail, e.g.
//! `edge/e-europe-west3-b/49d010c7be1845ac9a19a9033c64a460ces1`.

use std::str::FromStr;

use crate::error::{Error, Result};

const SEGMENT_COUNT: usize = 10;

/// Organization, project and instance a session streams to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResourceScope {
	pub instance_id: String,
	pub project_id: String,
	pub organization_id: String,
}

impl ResourceScope {
	/// Scope for an instance addressed without a project or organization.
	pub fn instance(instance_id: impl Into<String>) -> Self {
		Self {
			instance_id: instance_id.into(),
			..Default::default()
		}
	}

	/// Parses a full gamelet resource name. The pool id is validated and dropped.
	pub fn parse(name: &str) -> Result<Self> {
		parse_segments(name).ok_or_else(|| Error::InvalidArgument(format!("Failed to parse instance name '{name}'")))
	}
}

impl FromStr for ResourceScope {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		Self::parse(s)
	}
}

fn parse_segments(name: &str) -> Option<ResourceScope> {
	let parts: Vec<&str> = name.split('/').collect();
	if parts.len() != SEGMENT_COUNT {
		return None;
	}

	let labelled = |label: usize, value: usize, expected: &str| parts[label] == expected && !parts[value].is_empty();
	if !labelled(0, 1, "organizations") || !labelled(2, 3, "projects") || !labelled(4, 5, "pools") {
		return None;
	}
	if parts[6] != "gamelets" || parts[7..].iter().any(|part| part.is_empty()) {
		return None;
	}

	Some(ResourceScope {
		instance_id: parts[7..].join("/"),
		project_id: parts[3].to_string(),
		organization_id: parts[1].to_string(),
	})
}
