//! Debug utility: decodes a hex-encoded scrambled buffer and prints the
//! recovered document's decode trace.

use std::io::Read;

use clap::Parser;
use ruida_types::{ChecksumMode, DecodeOptions};

#[derive(Parser)]
#[command(name = "hex-decode", about = "Decode a hex-encoded Ruida buffer for debugging")]
struct Cli {
	/// Hex string to decode, or `-` to read it from stdin
	input: String,

	/// The buffer carries a 2-byte checksum prefix, as a captured upload chunk would
	#[arg(long, conflicts_with = "no_checksum")]
	with_checksum: bool,

	/// The buffer carries no checksum prefix (the default)
	#[arg(long)]
	no_checksum: bool,
}

fn main() {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let cli = Cli::parse();

	let hex_text = if cli.input == "-" {
		let mut buf = String::new();
		if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
			eprintln!("Error: failed to read stdin: {e}");
			std::process::exit(1);
		}
		buf
	} else {
		cli.input
	};

	let raw = match hex::decode(hex_text.trim()) {
		Ok(raw) => raw,
		Err(e) => {
			eprintln!("Error: invalid hex input: {e}");
			std::process::exit(1);
		}
	};

	let mode = if cli.with_checksum { ChecksumMode::Prefixed } else { ChecksumMode::None };
	let scrambled = match ruida_types::checksum::strip_prefix(&raw, mode) {
		Ok(scrambled) => scrambled,
		Err(e) => {
			eprintln!("Error: {e}");
			std::process::exit(2);
		}
	};

	let unscrambled = ruida_types::unscramble_bytes(scrambled);
	match ruida_types::decode(&unscrambled, DecodeOptions::default()) {
		Ok(result) => {
			for op in &result.trace {
				match op.value {
					Some(value) => println!("{:>6}  {}  {value}", op.offset, op.name),
					None => println!("{:>6}  {}", op.offset, op.name),
				}
			}
		}
		Err(e) => {
			eprintln!("Error: {e}");
			std::process::exit(3);
		}
	}
}
