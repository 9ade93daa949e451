//! Starts the single-client UDP relay in front of a Ruida controller.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use clap::Parser;
use ruida_rs::RelayConfig;

#[derive(Parser)]
#[command(name = "relay", about = "Single-client UDP relay in front of a Ruida laser controller")]
struct Cli {
	/// Address of the physical controller
	controller_ip: IpAddr,

	/// Local interface to bind both sockets on (default: all interfaces)
	listen_ip: Option<IpAddr>,

	/// Optional TOML file overriding port/timeout defaults
	#[arg(short, long, value_name = "FILE")]
	config: Option<PathBuf>,
}

fn main() {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let cli = Cli::parse();

	let mut config: RelayConfig = match ruida_rs::config_loader::load(cli.config.as_deref()) {
		Ok(config) => config,
		Err(e) => {
			eprintln!("Error: invalid configuration: {e}");
			std::process::exit(1);
		}
	};
	config.controller_addr = cli.controller_ip;
	config.listen_addr = cli.listen_ip.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

	if let Err(e) = ruida_relay::run(&config, &|| false) {
		log::error!("relay exited: {e}");
		std::process::exit(1);
	}
}
