use std::path::PathBuf;

use asset_stream_protocol::RequestOrigin;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "asset_stream_manager")]
#[command(about = "Streams local asset directories to remote gamelets")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format for client commands
	#[arg(short, long, global = true, value_enum, default_value = "json")]
	pub format: OutputFormat,

	/// Daemon socket path (TCP port on Windows)
	#[arg(long, global = true, env = "ASSET_STREAM_MANAGER_SOCKET", value_name = "PATH")]
	pub socket: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Run the session manager daemon in the foreground
	Serve(ServeArgs),

	/// Start streaming a workstation directory to a gamelet
	StartSession {
		/// Full gamelet resource name (organizations/../gamelets/..)
		#[arg(long)]
		gamelet_name: String,
		/// Workstation directory to stream
		#[arg(long = "dir", value_name = "DIR")]
		workstation_directory: PathBuf,
		/// Who is asking for the session
		#[arg(long, value_enum, default_value = "cli")]
		origin: OriginArg,
	},

	/// Stop streaming to a gamelet
	StopSession {
		/// Gamelet instance id, e.g. edge/e-europe-west3-b/49d010c7
		#[arg(long)]
		gamelet_id: String,
	},

	/// Report whether the daemon is running
	Status,

	/// Ask a running daemon to stop
	Shutdown,
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
	/// JSON config file; values in it override flags
	#[arg(long, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Workstation directory to stream at startup (development)
	#[arg(long, value_name = "DIR")]
	pub src_dir: Option<String>,

	/// Gamelet IP to stream to at startup (development)
	#[arg(long, value_name = "IP")]
	pub instance_ip: Option<String>,

	/// Gamelet SSH port to stream to at startup (development)
	#[arg(long, value_name = "PORT")]
	pub instance_port: Option<u16>,

	/// SDK installation root containing dev/bin/ggp
	#[arg(long, env = "GGP_SDK_PATH", value_name = "DIR")]
	pub sdk_dir: Option<PathBuf>,

	/// Log to stdout instead of the log file
	#[arg(long)]
	pub log_to_stdout: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OriginArg {
	Unknown,
	#[default]
	Cli,
	PartnerPortal,
}

impl From<OriginArg> for RequestOrigin {
	fn from(origin: OriginArg) -> Self {
		match origin {
			OriginArg::Unknown => RequestOrigin::Unknown,
			OriginArg::Cli => RequestOrigin::Cli,
			OriginArg::PartnerPortal => RequestOrigin::PartnerPortal,
		}
	}
}
