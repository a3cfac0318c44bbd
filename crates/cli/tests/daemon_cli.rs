use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const GAMELET: &str = "organizations/o1/projects/p1/pools/pool1/gamelets/edge/e-1/abc123";

fn run_asm(socket: &Path, args: &[&str]) -> (bool, Value, String) {
	let output: Output = Command::new(env!("CARGO_BIN_EXE_asset_stream_manager"))
		.arg("--format")
		.arg("ndjson")
		.arg("--socket")
		.arg(socket)
		.args(args)
		.output()
		.expect("failed to execute asset_stream_manager");

	let stdout = String::from_utf8_lossy(&output.stdout).to_string();
	let stderr = String::from_utf8_lossy(&output.stderr).to_string();
	let parsed = serde_json::from_str(stdout.trim()).unwrap_or_else(|_| serde_json::json!({ "raw": stdout }));
	(output.status.success(), parsed, stderr)
}

#[test]
fn status_without_daemon_reports_not_running() {
	let dir = TempDir::new().unwrap();
	let (ok, result, stderr) = run_asm(&dir.path().join("asm.sock"), &["status"]);
	assert!(ok, "stderr: {stderr}");
	assert_eq!(result["ok"], true);
	assert_eq!(result["data"]["running"], false);
	assert!(result["data"].get("sessionCount").is_none());
}

#[cfg(unix)]
#[test]
fn stop_session_without_daemon_fails_with_unavailable() {
	let dir = TempDir::new().unwrap();
	let (ok, result, _) = run_asm(&dir.path().join("asm.sock"), &["stop-session", "--gamelet-id", "edge/e-1/abc123"]);
	assert!(!ok);
	assert_eq!(result["ok"], false);
	assert_eq!(result["error"]["code"], "UNAVAILABLE");
}

#[cfg(unix)]
mod daemon {
	use std::os::unix::fs::PermissionsExt;
	use std::process::{Child, Stdio};
	use std::time::{Duration, Instant};

	use super::*;

	struct Fixture {
		_root: TempDir,
		socket: std::path::PathBuf,
		assets: std::path::PathBuf,
		daemon: Child,
	}

	impl Drop for Fixture {
		fn drop(&mut self) {
			let _ = self.daemon.kill();
			let _ = self.daemon.wait();
		}
	}

	fn fake_sdk(root: &Path, script: &str) -> std::path::PathBuf {
		let bin = root.join("sdk").join("dev").join("bin");
		std::fs::create_dir_all(&bin).unwrap();
		let ggp = bin.join("ggp");
		std::fs::write(&ggp, script).unwrap();
		std::fs::set_permissions(&ggp, std::fs::Permissions::from_mode(0o755)).unwrap();
		root.join("sdk")
	}

	fn spawn_daemon(ggp_script: &str) -> Fixture {
		let root = TempDir::new().unwrap();
		let sdk = fake_sdk(root.path(), ggp_script);
		let assets = root.path().join("assets");
		std::fs::create_dir_all(&assets).unwrap();
		let socket = root.path().join("asm.sock");

		let daemon = Command::new(env!("CARGO_BIN_EXE_asset_stream_manager"))
			.arg("--socket")
			.arg(&socket)
			.arg("serve")
			.arg("--sdk-dir")
			.arg(&sdk)
			.arg("--log-to-stdout")
			.env("XDG_CONFIG_HOME", root.path().join("config"))
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.spawn()
			.expect("failed to spawn daemon");

		let fixture = Fixture {
			_root: root,
			socket,
			assets,
			daemon,
		};

		let deadline = Instant::now() + Duration::from_secs(10);
		loop {
			let (_, result, _) = run_asm(&fixture.socket, &["status"]);
			if result["data"]["running"] == true {
				break;
			}
			assert!(Instant::now() < deadline, "daemon did not come up");
			std::thread::sleep(Duration::from_millis(50));
		}
		fixture
	}

	fn wait_for_exit(child: &mut Child) -> bool {
		let deadline = Instant::now() + Duration::from_secs(10);
		while Instant::now() < deadline {
			if let Ok(Some(_)) = child.try_wait() {
				return true;
			}
			std::thread::sleep(Duration::from_millis(50));
		}
		false
	}

	#[test]
	fn start_stop_and_shutdown() {
		let mut fixture = spawn_daemon("#!/bin/sh\necho 'Host: 127.0.0.1'\necho 'Port: 2222'\n");
		let dir = fixture.assets.display().to_string();

		let (ok, result, stderr) = run_asm(&fixture.socket, &["start-session", "--gamelet-name", GAMELET, "--dir", &dir]);
		assert!(ok, "result: {result} stderr: {stderr}");
		assert_eq!(result["data"]["workstationDirectory"], dir);

		let (ok, result, _) = run_asm(&fixture.socket, &["status"]);
		assert!(ok);
		assert_eq!(result["data"]["sessionCount"], 1);
		assert_eq!(result["data"]["sessions"][0]["instance_id"], "edge/e-1/abc123");
		assert_eq!(result["data"]["sessions"][0]["port"], 2222);

		let (ok, _, _) = run_asm(&fixture.socket, &["stop-session", "--gamelet-id", "edge/e-1/abc123"]);
		assert!(ok);

		let (_, result, _) = run_asm(&fixture.socket, &["status"]);
		assert_eq!(result["data"]["sessionCount"], 0);

		let (ok, result, _) = run_asm(&fixture.socket, &["stop-session", "--gamelet-id", "edge/e-1/abc123"]);
		assert!(!ok);
		assert_eq!(result["error"]["code"], "NOT_FOUND");

		let (ok, result, _) = run_asm(&fixture.socket, &["shutdown"]);
		assert!(ok);
		assert_eq!(result["data"]["stopped"], true);
		assert!(wait_for_exit(&mut fixture.daemon), "daemon kept running after shutdown");
		assert!(!fixture.socket.exists());
	}

	#[test]
	fn failing_ggp_reports_internal_error() {
		let fixture = spawn_daemon("#!/bin/sh\necho 'not logged in' >&2\nexit 1\n");
		let dir = fixture.assets.display().to_string();

		let (ok, result, _) = run_asm(&fixture.socket, &["start-session", "--gamelet-name", GAMELET, "--dir", &dir]);
		assert!(!ok);
		assert_eq!(result["error"]["code"], "INTERNAL");
		assert!(result["error"]["message"].as_str().unwrap().contains("exited with code 1"));
	}

	#[test]
	fn malformed_gamelet_name_is_invalid_argument() {
		let fixture = spawn_daemon("#!/bin/sh\nexit 0\n");
		let dir = fixture.assets.display().to_string();

		let (ok, result, _) = run_asm(&fixture.socket, &["start-session", "--gamelet-name", "gamelets/abc", "--dir", &dir]);
		assert!(!ok);
		assert_eq!(result["error"]["code"], "INVALID_ARGUMENT");
	}
}
