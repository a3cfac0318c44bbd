//! Locating the provisioning SDK.

use std::path::{Path, PathBuf};

/// Environment variable pointing at the SDK installation root.
pub const SDK_PATH_ENV: &str = "GGP_SDK_PATH";

const GGP_BINARY: &str = if cfg!(windows) { "ggp.exe" } else { "ggp" };

/// Directory holding the SDK developer binaries, if an SDK root is known.
pub fn dev_bin_dir(sdk_dir: Option<&Path>) -> Option<PathBuf> {
	let root = sdk_dir
		.map(Path::to_path_buf)
		.or_else(|| std::env::var_os(SDK_PATH_ENV).filter(|v| !v.is_empty()).map(PathBuf::from))?;
	Some(root.join("dev").join("bin"))
}

/// Path of the `ggp` tool. Falls back to resolving `ggp` through `PATH`.
pub fn ggp_path(sdk_dir: Option<&Path>) -> PathBuf {
	match dev_bin_dir(sdk_dir) {
		Some(dir) => dir.join(GGP_BINARY),
		None => PathBuf::from(GGP_BINARY),
	}
}
