//! Layered configuration loading for the `relay` and `upload` binaries:
//! typed `Default`s, optionally overridden by a TOML file and
//! `RUIDA_*`-namespaced environment variables.
//!
//! Nothing in [`ruida_relay`] or [`ruida_uploader`] depends on this —
//! [`ruida_relay::RelayConfig`] and [`ruida_uploader::UploadConfig`] are
//! plain structs a caller can build directly. This loader only exists to
//! wire the demo binaries to operator overrides.

use serde::de::DeserializeOwned;
use std::path::Path;

/// Build `T` from its `#[serde(default)]` fields, a TOML file at `path`
/// (if given), and environment variables prefixed `RUIDA_` (e.g.
/// `RUIDA_BUSY_TIMEOUT_SECS`).
pub fn load<T: DeserializeOwned>(path: Option<&Path>) -> Result<T, config::ConfigError> {
	let mut builder = config::Config::builder();
	if let Some(path) = path {
		builder = builder.add_source(config::File::from(path));
	}
	builder = builder.add_source(config::Environment::with_prefix("RUIDA"));
	builder.build()?.try_deserialize()
}
