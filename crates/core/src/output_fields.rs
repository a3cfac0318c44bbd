//! `key: value` extraction from free-form tool output.

/// Returns the value of the first line starting with `key:`, trimmed.
///
/// Unrelated lines are skipped. An empty value still counts as found.
pub fn parse_value<'a>(data: &'a str, key: &str) -> Option<&'a str> {
	data.split('\n').find_map(|line| {
		let rest = line.strip_prefix(key)?.strip_prefix(':')?;
		Some(rest.trim_matches(is_space))
	})
}

// Matches C `isspace`: ASCII whitespace plus vertical tab.
fn is_space(c: char) -> bool {
	c.is_ascii_whitespace() || c == '\x0b'
}
