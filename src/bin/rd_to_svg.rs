//! Decodes a `.rd` job file and writes it out as SVG.

use std::path::PathBuf;

use clap::Parser;
use ruida_types::{DecodeOptions, UnknownOpcodePolicy};

#[derive(Parser)]
#[command(name = "rd-to-svg", about = "Render a scrambled Ruida job file as SVG")]
struct Cli {
	/// Path to the `.rd` job file
	file: PathBuf,

	/// Write SVG here instead of stdout
	#[arg(short, long, value_name = "FILE")]
	output: Option<PathBuf>,

	/// Skip unknown opcodes instead of failing on them
	#[arg(long)]
	lenient: bool,
}

fn main() {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let cli = Cli::parse();

	let raw = match std::fs::read(&cli.file) {
		Ok(raw) => raw,
		Err(e) => {
			eprintln!("Error: failed to read {}: {e}", cli.file.display());
			std::process::exit(1);
		}
	};

	let unscrambled = ruida_types::unscramble_bytes(&raw);
	let options = DecodeOptions {
		on_unknown_opcode: if cli.lenient { UnknownOpcodePolicy::Lenient } else { UnknownOpcodePolicy::Fatal },
	};

	let result = match ruida_types::decode(&unscrambled, options) {
		Ok(result) => result,
		Err(e) => {
			eprintln!("Error: {e}");
			std::process::exit(3);
		}
	};

	for (offset, message) in &result.anomalies {
		log::warn!("offset {offset}: {message}");
	}

	let svg = ruida_types::svg::to_svg(&result.document);

	if let Some(output) = cli.output {
		if let Err(e) = std::fs::write(&output, svg) {
			eprintln!("Error: failed to write {}: {e}", output.display());
			std::process::exit(1);
		}
	} else {
		print!("{svg}");
	}
}
