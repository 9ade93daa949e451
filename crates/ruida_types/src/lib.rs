//! Codec for the Ruida laser-cutter wire protocol.
//!
//! This crate is a pure, synchronous core: a byte-level obfuscation
//! permutation ([`scramble`]), fixed-shape numeric
//! primitives ([`primitives`]), a static two-level opcode dispatch table
//! ([`opcode`]), a stream decoder that rebuilds a [`model::Document`]
//! ([`decoder`]), an encoder that assembles a job from one ([`encoder`]),
//! and a minimal SVG sink for inspecting decoded geometry ([`svg`]).
//!
//! Nothing here touches a socket or a filesystem; callers (the relay,
//! uploader, and CLI demos in the wider workspace) own all I/O.

pub mod checksum;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod model;
pub mod opcode;
pub mod primitives;
pub mod scramble;
pub mod svg;

pub use checksum::ChecksumMode;
pub use decoder::{decode, DecodeOptions, DecodeResult, DecodedOp, UnknownOpcodePolicy};
pub use encoder::{encode, EncodeOptions};
pub use error::CodecError;
pub use model::{BBox, Color, Document, Laser, Layer, Point, Speed};
pub use scramble::{scramble, scramble_bytes, unscramble, unscramble_bytes};
