//! Per-byte obfuscation permutation applied to every job payload byte.
//!
//! `scramble` and `unscramble` form a bijection over `0..=255`: swap the top
//! and bottom bit, XOR with `0x88`, then add or subtract one modulo 256.
//! Both directions are exposed as precomputed 256-entry lookup tables so
//! callers never pay for the bit-twiddling on the hot path.

use std::sync::OnceLock;

/// Bit-twiddle reference implementation of `scramble`, kept as the source of
/// truth used to build (and test) [`SCRAMBLE_TABLE`].
pub const fn scramble_byte(b: u8) -> u8 {
	let fb = b & 0x80;
	let lb = b & 0x01;
	let r = b.wrapping_sub(fb).wrapping_sub(lb);
	let r = r | (lb << 7) | (fb >> 7);
	let r = r ^ 0x88;
	r.wrapping_add(1)
}

/// Bit-twiddle reference implementation of `unscramble`, the exact inverse
/// of [`scramble_byte`].
pub const fn unscramble_byte(b: u8) -> u8 {
	let r = b.wrapping_sub(1);
	let r = r ^ 0x88;
	let fb = r & 0x80;
	let lb = r & 0x01;
	let r = r.wrapping_sub(fb).wrapping_sub(lb);
	r | (lb << 7) | (fb >> 7)
}

const fn build_table(f: fn(u8) -> u8) -> [u8; 256] {
	let mut table = [0u8; 256];
	let mut i = 0;
	while i < 256 {
		table[i] = f(i as u8);
		i += 1;
	}
	table
}

fn scramble_table() -> &'static [u8; 256] {
	static TABLE: OnceLock<[u8; 256]> = OnceLock::new();
	TABLE.get_or_init(|| build_table(scramble_byte))
}

fn unscramble_table() -> &'static [u8; 256] {
	static TABLE: OnceLock<[u8; 256]> = OnceLock::new();
	TABLE.get_or_init(|| build_table(unscramble_byte))
}

/// Scramble a single byte via the precomputed lookup table.
#[inline]
pub fn scramble(b: u8) -> u8 {
	scramble_table()[b as usize]
}

/// Unscramble a single byte via the precomputed lookup table.
#[inline]
pub fn unscramble(b: u8) -> u8 {
	unscramble_table()[b as usize]
}

/// Scramble every byte of `data`, returning a new buffer.
pub fn scramble_bytes(data: &[u8]) -> Vec<u8> {
	let table = scramble_table();
	data.iter().map(|&b| table[b as usize]).collect()
}

/// Unscramble every byte of `data`, returning a new buffer.
pub fn unscramble_bytes(data: &[u8]) -> Vec<u8> {
	let table = unscramble_table();
	data.iter().map(|&b| table[b as usize]).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bijection_round_trips_every_byte() {
		for b in 0..=255u8 {
			assert_eq!(unscramble(scramble(b)), b, "scramble/unscramble mismatch for {b:#04x}");
			assert_eq!(scramble(unscramble(b)), b, "unscramble/scramble mismatch for {b:#04x}");
		}
	}

	#[test]
	fn table_matches_reference_bit_twiddle() {
		for b in 0..=255u8 {
			assert_eq!(scramble(b), scramble_byte(b));
			assert_eq!(unscramble(b), unscramble_byte(b));
		}
	}

	#[test]
	fn known_vector_d7_terminator() {
		// D7 is the end-of-job opcode; its scrambled form drives FIN-RAW
		// detection in the relay.
		assert_eq!(scramble(0xd7), unscramble_byte(0xd7).wrapping_add(0));
		assert_eq!(unscramble(scramble(0xd7)), 0xd7);
	}

	#[test]
	fn bytes_helpers_round_trip() {
		let data: Vec<u8> = (0..=255u8).collect();
		let scrambled = scramble_bytes(&data);
		let back = unscramble_bytes(&scrambled);
		assert_eq!(back, data);
	}
}
