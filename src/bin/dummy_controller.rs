//! Standalone UDP stub standing in for a physical Ruida controller, for
//! exercising the relay and uploader without hardware.
//!
//! For every datagram received it replies with `0xC6` (ACK), unless a
//! fault-injection mode is active, in which case the Nth datagram since
//! the last reply is NACKed or dropped instead.

use std::net::{IpAddr, UdpSocket};

use clap::Parser;

const ACK_BYTE: u8 = 0xc6;
const NACK_BYTE: u8 = 0x46;

#[derive(Parser)]
#[command(name = "dummy-controller", about = "UDP stub standing in for a Ruida controller")]
struct Cli {
	/// Interface to listen on
	#[arg(long, default_value = "0.0.0.0")]
	listen: IpAddr,

	/// Port to listen on
	#[arg(long, default_value_t = 50200)]
	port: u16,

	/// Reply NACK instead of ACK to every Nth datagram
	#[arg(long, value_name = "N")]
	nack_every: Option<u64>,

	/// Silently drop every Nth datagram instead of replying
	#[arg(long, value_name = "N")]
	drop_every: Option<u64>,
}

fn main() {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let cli = Cli::parse();
	let listen = cli.listen;

	let socket = match UdpSocket::bind((listen, cli.port)) {
		Ok(socket) => socket,
		Err(e) => {
			eprintln!("Error: failed to bind {listen}:{}: {e}", cli.port);
			std::process::exit(1);
		}
	};
	log::info!("dummy controller listening on {listen}:{}", cli.port);

	let mut buf = [0u8; 4096];
	let mut count: u64 = 0;

	loop {
		let (n, from) = match socket.recv_from(&mut buf) {
			Ok(v) => v,
			Err(e) => {
				log::error!("recv failed: {e}");
				std::process::exit(1);
			}
		};
		count += 1;
		log::debug!("datagram {count} ({n} bytes) from {from}");

		if cli.drop_every.is_some_and(|n| count % n == 0) {
			log::warn!("dropping datagram {count} per --drop-every");
			continue;
		}

		let reply = if cli.nack_every.is_some_and(|n| count % n == 0) {
			log::warn!("NACKing datagram {count} per --nack-every");
			NACK_BYTE
		} else {
			ACK_BYTE
		};

		if let Err(e) = socket.send_to(&[reply], from) {
			log::error!("send failed: {e}");
		}
	}
}
