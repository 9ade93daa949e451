//! Typed uploader configuration, with defaults matching the documented
//! protocol constants.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Network parameters for [`crate::upload`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
	/// Controller address to send chunks to.
	pub dest_addr: IpAddr,
	/// Controller's receiving port. Default `50200`.
	pub dest_port: u16,
	/// Local port to send from. Default `40200`.
	pub source_port: u16,
	/// Maximum chunk payload size, excluding the 2-byte checksum prefix.
	pub mtu: usize,
	/// Per-chunk reply timeout, milliseconds. Default `3000`.
	pub network_timeout_ms: u64,
	/// Initial backoff delay for first-chunk retries. Default `200ms`.
	pub backoff_initial_ms: u64,
	/// Backoff delay cap for first-chunk retries. Default `5000ms`.
	pub backoff_max_ms: u64,
}

impl UploadConfig {
	/// [`Self::network_timeout_ms`] as a [`Duration`].
	pub fn network_timeout(&self) -> Duration {
		Duration::from_millis(self.network_timeout_ms)
	}
}

impl Default for UploadConfig {
	fn default() -> Self {
		UploadConfig {
			dest_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
			dest_port: 50200,
			source_port: 40200,
			mtu: 1470,
			network_timeout_ms: 3000,
			backoff_initial_ms: 200,
			backoff_max_ms: 5000,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_documented_protocol_constants() {
		let cfg = UploadConfig::default();
		assert_eq!(cfg.dest_port, 50200);
		assert_eq!(cfg.source_port, 40200);
		assert_eq!(cfg.mtu, 1470);
		assert_eq!(cfg.network_timeout(), Duration::from_secs(3));
	}
}
