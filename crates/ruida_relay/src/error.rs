//! Errors the relay's socket setup and run loop can raise.

use std::net::AddrParseError;

/// I/O and configuration failures from running the relay.
///
/// Stray senders and ordinary session transitions (FIN, inactivity timeout)
/// are not represented here — they are normal control flow, logged and
/// handled inside [`crate::run`], never surfaced as an `Err`.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
	/// A configured address string did not parse.
	#[error("invalid address {addr:?}: {source}")]
	InvalidAddress {
		/// The offending address string.
		addr: String,
		/// The underlying parse failure.
		#[source]
		source: AddrParseError,
	},
	/// Binding or using a UDP socket failed.
	#[error("socket I/O error: {0}")]
	Io(#[from] std::io::Error),
}
