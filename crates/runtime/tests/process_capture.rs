#![cfg(unix)]

use std::sync::Arc;

use asset_stream_runtime::{OutputHandler, ProcessError, ProcessFactory, ProcessStartInfo, TokioProcessFactory};
use tokio::sync::Mutex;

fn shell(script: &str) -> ProcessStartInfo {
	ProcessStartInfo::new("/bin/sh").args(["-c", script]).name("sh")
}

#[tokio::test]
async fn stdout_is_delivered_before_run_until_exit_returns() {
	let output = Arc::new(std::sync::Mutex::new(Vec::new()));
	let sink = Arc::clone(&output);
	let handler: OutputHandler = Arc::new(move |data: &[u8]| {
		sink.lock().map_err(|e| e.to_string())?.extend_from_slice(data);
		Ok(())
	});

	let info = shell("printf 'Host: 1.2.3.4\\n'; printf 'Port: 2222\\n'").stdout_handler(handler).forward_output_to_log(true);
	let mut process = TokioProcessFactory.create(info);
	process.start().await.expect("process should start");
	process.run_until_exit().await.expect("process should run");

	assert_eq!(process.exit_code(), 0);
	let text = String::from_utf8(output.lock().unwrap().clone()).unwrap();
	assert_eq!(text, "Host: 1.2.3.4\nPort: 2222\n");
}

#[tokio::test]
async fn non_zero_exit_code_is_reported() {
	let mut process = TokioProcessFactory.create(shell("echo boom >&2; exit 3"));
	process.start().await.unwrap();
	process.run_until_exit().await.unwrap();
	assert_eq!(process.exit_code(), 3);
}

#[tokio::test]
async fn large_output_is_fully_captured() {
	let total = Arc::new(Mutex::new(0usize));
	let counter = Arc::clone(&total);
	let handler: OutputHandler = Arc::new(move |data: &[u8]| {
		let mut guard = counter.try_lock().map_err(|e| e.to_string())?;
		*guard += data.len();
		Ok(())
	});

	let mut process = TokioProcessFactory.create(shell("head -c 100000 /dev/zero").stdout_handler(handler));
	process.start().await.unwrap();
	process.run_until_exit().await.unwrap();
	assert_eq!(*total.lock().await, 100_000);
}

#[tokio::test]
async fn handler_failure_surfaces_after_exit() {
	let handler: OutputHandler = Arc::new(|_: &[u8]| Err("no room".to_string()));
	let mut process = TokioProcessFactory.create(shell("echo hello").stdout_handler(handler));
	process.start().await.unwrap();
	let err = process.run_until_exit().await.unwrap_err();
	assert!(matches!(err, ProcessError::Handler { ref message, .. } if message == "no room"));
	assert_eq!(process.exit_code(), 0);
}

#[tokio::test]
async fn starting_twice_is_rejected() {
	let mut process = TokioProcessFactory.create(shell("true"));
	process.start().await.unwrap();
	assert!(matches!(process.start().await, Err(ProcessError::AlreadyStarted { .. })));
	process.run_until_exit().await.unwrap();
}
