//! Benchmark helper utilities for ruida-rs
//!
//! Generates synthetic jobs of a given size so the encoder/decoder
//! throughput benchmarks don't depend on checked-in fixture files.

use ruida_types::{Color, Document, Layer, Speed};

/// Builds a single-layer document tracing a zig-zag of `segments` line
/// segments, each `1mm` long, so the encoded geometry exercises both the
/// relative and (periodically) forced-absolute move/cut encodings.
pub fn synthetic_document(segments: usize) -> Document {
	let mut doc = Document::new();
	let mut layer = Layer::new(Speed::scalar(300.0), vec![20.0, 80.0], Color::new(255, 0, 0));

	let mut path = Vec::with_capacity(segments + 1);
	let mut x = 0.0;
	let mut y = 0.0;
	path.push((x, y));
	for i in 0..segments {
		if i % 2 == 0 {
			x += 1.0;
		} else {
			y += 1.0;
		}
		path.push((x, y));
	}
	layer.add_path(path);

	doc.add_layer(layer);
	doc.recompute_bbox();
	doc.recompute_odometer();
	doc
}

/// Common benchmark sizes, in path segments.
pub mod sizes {
	/// Tiny job: 16 segments.
	pub const TINY: usize = 16;
	/// Small job: 256 segments.
	pub const SMALL: usize = 256;
	/// Medium job: 4,096 segments.
	pub const MEDIUM: usize = 4096;
	/// Large job: 65,536 segments.
	pub const LARGE: usize = 65536;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn synthetic_document_has_the_requested_segment_count() {
		let doc = synthetic_document(sizes::SMALL);
		assert_eq!(doc.layers.len(), 1);
		assert_eq!(doc.layers[0].paths[0].len(), sizes::SMALL + 1);
	}
}
