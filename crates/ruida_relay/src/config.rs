//! Typed relay configuration, with defaults matching the documented
//! protocol constants.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

/// Network parameters for [`crate::run`].
///
/// Constructible directly (the common case — CLI flags or test fixtures);
/// the `relay` demo binary additionally layers a TOML file and environment
/// overrides on top of [`RelayConfig::default`] via the `config` crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
	/// Local interface the relay binds both sockets on.
	pub listen_addr: IpAddr,
	/// The controller's address; only datagrams from here are accepted on
	/// the backend port.
	pub controller_addr: IpAddr,
	/// Client-facing port clients send to. Default `50200`.
	pub frontend_port: u16,
	/// Controller-facing port the controller sends to. Default `40200`.
	pub backend_port: u16,
	/// Seconds of silence after which an active session is dropped.
	pub busy_timeout_secs: f64,
}

impl Default for RelayConfig {
	fn default() -> Self {
		RelayConfig {
			listen_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
			controller_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
			frontend_port: 50200,
			backend_port: 40200,
			busy_timeout_secs: 10.0,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_documented_protocol_constants() {
		let cfg = RelayConfig::default();
		assert_eq!(cfg.frontend_port, 50200);
		assert_eq!(cfg.backend_port, 40200);
		assert_eq!(cfg.busy_timeout_secs, 10.0);
	}
}
