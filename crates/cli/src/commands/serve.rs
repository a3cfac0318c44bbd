use std::path::PathBuf;
use std::sync::Arc;

use asset_stream::config::default_config_path;
use asset_stream::metrics::SessionStartStatus;
use asset_stream::sdk::ggp_path;
use asset_stream::session::{SessionRegistry, StartSessionParams};
use asset_stream::{AddressResolver, AssetStreamConfig, LocalAssetsStreamManager, LogMetricsRecorder, ResolvedAddress, ResourceScope, SessionManager};
use asset_stream_runtime::TokioProcessFactory;
use tracing::{error, info, warn};

use crate::cli::ServeArgs;
use crate::daemon::Daemon;
use crate::error::Result;
use crate::logging::{LogSink, default_log_file, init_logging};

/// Runs the daemon in the foreground until it is told to stop.
pub async fn run(args: ServeArgs, socket: PathBuf, verbose: u8) -> Result<()> {
	let config = match load_config(&args) {
		Ok(config) => config,
		Err(err) => {
			init_logging(verbose, LogSink::Stderr)?;
			return Err(err);
		}
	};

	let sink = if config.log_to_stdout { LogSink::Stdout } else { LogSink::File(default_log_file()) };
	let verbose = if config.session.debug { verbose.max(2) } else { verbose.max(1) };
	init_logging(verbose, sink)?;

	let flags = config.flags_read_from_file();
	if !flags.is_empty() {
		info!(target = "asm.config", flags = %flags, "read values from config file");
	}
	let errors = config.flag_read_errors();
	if !errors.is_empty() {
		warn!(target = "asm.config", "{errors}");
	}
	info!(target = "asm.config", "configuration:\n{config}");

	let metrics = Arc::new(LogMetricsRecorder);
	let registry = Arc::new(SessionManager::new(config.session.clone(), metrics.clone()));
	let ggp = ggp_path(config.sdk_dir.as_deref());
	info!(target = "asm.config", ggp = %ggp.display(), "using provisioning tool");
	let resolver = AddressResolver::new(Arc::new(TokioProcessFactory), ggp);
	let manager = Arc::new(LocalAssetsStreamManager::new(registry.clone(), resolver, metrics));

	if !config.src_dir.is_empty() && !config.instance_ip.is_empty() && config.instance_port != 0 {
		start_development_session(&registry, &config).await;
	}

	Daemon::new(manager, registry, socket).run().await
}

/// Defaults, then command line flags, then values from the config file.
fn load_config(args: &ServeArgs) -> Result<AssetStreamConfig> {
	let mut config = AssetStreamConfig::default();
	if let Some(src_dir) = &args.src_dir {
		config.src_dir = src_dir.clone();
	}
	if let Some(ip) = &args.instance_ip {
		config.instance_ip = ip.clone();
	}
	if let Some(port) = args.instance_port {
		config.instance_port = port;
	}
	if args.sdk_dir.is_some() {
		config.sdk_dir = args.sdk_dir.clone();
	}
	config.log_to_stdout |= args.log_to_stdout;

	match &args.config {
		Some(path) => config.load_from_file(path)?,
		None => {
			// A missing default config file is fine.
			if let Some(path) = default_config_path().filter(|path| path.exists()) {
				config.load_from_file(&path)?;
			}
		}
	}
	Ok(config)
}

/// Streams `src_dir` to a gamelet given by address, skipping `ggp`.
async fn start_development_session(registry: &SessionManager, config: &AssetStreamConfig) {
	let scope = ResourceScope::instance(config.instance_ip.clone());
	let address = ResolvedAddress {
		host: config.instance_ip.clone(),
		port: config.instance_port,
	};
	let params = StartSessionParams {
		scope: &scope,
		address: &address,
		workstation_directory: &config.src_dir,
	};
	let mut status = SessionStartStatus::Ok;
	match registry.start_session(params, &mut status).await.result {
		Ok(()) => info!(target = "asm.daemon", src_dir = %config.src_dir, host = %address.host, port = address.port, "development session started"),
		Err(err) => error!(target = "asm.daemon", error = %err, ?status, "failed to start development session"),
	}
}
