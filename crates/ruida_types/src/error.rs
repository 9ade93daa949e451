//! Error types for the Ruida wire codec.

use thiserror::Error;

/// Errors that can occur while encoding or decoding a Ruida job stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
	/// Decoder ran out of bytes while reading a fixed-length argument.
	#[error("truncated stream at offset {offset}: expected {needed} more byte(s)")]
	Truncated {
		/// Byte offset at which the read started.
		offset: usize,
		/// Number of bytes still required.
		needed: usize,
	},

	/// A primary opcode byte has no table entry.
	#[error("unknown opcode 0x{0:02X}")]
	UnknownOpcode(u8),

	/// A primary/secondary opcode pair has no table entry.
	#[error("unknown opcode 0x{0:02X} 0x{1:02X}")]
	UnknownOpcode2(u8, u8),

	/// A relative-coordinate value was outside the representable 14-bit range.
	#[error("relative coordinate out of range: {0}")]
	BadRelCoord(i32),

	/// A power percentage was outside `0..=100`, or a power list was empty, odd-length,
	/// or longer than 8 entries.
	#[error("invalid power value or power list: {0}")]
	BadPower(String),

	/// An absolute coordinate does not fit in the 35-bit unsigned field.
	#[error("value {0} does not fit in the absolute coordinate range")]
	BadRange(i64),

	/// A checksum did not match: a non-first upload chunk was NACKed, or a
	/// hex-decode input carried a mismatched 2-byte checksum prefix.
	#[error("checksum mismatch")]
	ChecksumMismatch,

	/// No expected traffic arrived within the configured deadline.
	#[error("timed out waiting for traffic")]
	Timeout,
}
