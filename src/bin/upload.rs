//! Uploads a `.rd` job file to a Ruida controller over UDP.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use ruida_rs::{UploadConfig, UploadError};

#[derive(Parser)]
#[command(name = "upload", about = "Upload a scrambled Ruida job file to a controller")]
struct Cli {
	/// Address of the physical controller
	controller_ip: IpAddr,

	/// Path to the `.rd` job file
	file: PathBuf,

	/// Optional TOML file overriding port/MTU/timeout defaults
	#[arg(short, long, value_name = "FILE")]
	config: Option<PathBuf>,
}

fn main() {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let cli = Cli::parse();

	let mut config: UploadConfig = match ruida_rs::config_loader::load(cli.config.as_deref()) {
		Ok(config) => config,
		Err(e) => {
			eprintln!("Error: invalid configuration: {e}");
			std::process::exit(1);
		}
	};
	config.dest_addr = cli.controller_ip;

	let data = match std::fs::read(&cli.file) {
		Ok(data) => data,
		Err(e) => {
			eprintln!("Error: failed to read {}: {e}", cli.file.display());
			std::process::exit(1);
		}
	};

	if let Err(e) = ruida_uploader::upload(&config, &data) {
		log::error!("upload failed: {e}");
		let code = match e {
			UploadError::Io(_) => 1,
			UploadError::ChecksumRejected { .. } | UploadError::UnexpectedReply(_) | UploadError::Timeout => 2,
		};
		std::process::exit(code);
	}
}
