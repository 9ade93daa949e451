#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc(html_favicon_url = "../3.ico")]
#![doc(html_logo_url = "../3.ico")]

//! [![Ruida Logo](../logo.jpg)](https://github.com/ruida-rs/ruida-rs.git)
//!
//! `ruida-rs` wires the [`ruida_types`] codec, [`ruida_relay`] relay, and
//! [`ruida_uploader`] uploader crates to a handful of process entry points.
//! The library surface here is intentionally thin: everything a caller
//! needs for the protocol itself lives in those three crates, and this
//! crate only adds the TOML-plus-environment configuration loader shared
//! by the `relay` and `upload` binaries.

pub mod config_loader;

pub use ruida_relay::{RelayConfig, RelayError};
pub use ruida_types::{decode, encode, scramble_bytes, unscramble_bytes, DecodeOptions, EncodeOptions};
pub use ruida_uploader::{UploadConfig, UploadError};
