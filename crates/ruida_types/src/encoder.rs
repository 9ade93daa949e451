//! Assembles a complete, scrambled job stream from a [`Document`].
//!
//! The job has three contiguous sections — [`header`], [`body`], and
//! [`trailer`] — each built from the declarative [`EncArg`]/[`enc`]
//! template assembler in [`crate::primitives`] so the wire layout stays
//! auditable against the documented opcode table, mirroring the header and
//! trailer templates in `ruida.py`'s own `header()`/`body()`/`trailer()`.

use crate::error::CodecError;
use crate::model::{BBox, Document, Layer, Point};
use crate::primitives::{enc, encode_hex, EncArg};
use crate::scramble::scramble_bytes;

/// Rolling-counter threshold beyond which the encoder forces an absolute
/// move/cut even if the delta would fit in a relative one, bounding
/// accumulated rounding error. Matches `ruida.py`'s `_forceabs` default.
pub const DEFAULT_FORCE_ABS_INTERVAL: usize = 100;

/// Knobs for [`encode`] covering the open questions resolved in
/// `SPEC_FULL.md` §9.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
	/// Number of consecutive relative moves/cuts allowed before the encoder
	/// forces an absolute one, to bound precision loss. `0` disables
	/// forcing; `1` disables relative moves entirely.
	pub force_abs_interval: usize,
	/// If `true`, skip the final [`scramble_bytes`] pass and return the raw
	/// (unobfuscated) stream. Only useful for debugging against the
	/// documented byte layout.
	pub raw: bool,
	/// The trailer's `DA 01 06 20` record encodes the cut distance twice by
	/// default (observed controller behavior). Set this to emit the travel
	/// distance as the second value instead.
	pub trailer_travel_distance: bool,
	/// Emit the laser 3/4 power records (`C6 05/06/07/08` in the body,
	/// `C6 35/36/37/38` in the header). The reference encoder emits these
	/// unconditionally for every layer; this only exists to let a caller
	/// targeting a controller without lasers 3/4 suppress them.
	pub enable_laser_3_4: bool,
}

impl Default for EncodeOptions {
	fn default() -> Self {
		EncodeOptions {
			force_abs_interval: DEFAULT_FORCE_ABS_INTERVAL,
			raw: false,
			trailer_travel_distance: false,
			enable_laser_3_4: true,
		}
	}
}

/// Encode `doc` into the scrambled (unless [`EncodeOptions::raw`]) job
/// stream accepted by the controller.
pub fn encode(doc: &Document, options: EncodeOptions) -> Result<Vec<u8>, CodecError> {
	let bbox = overall_bbox(doc);
	let mut out = header(&doc.layers, bbox, &options)?;
	out.extend(body(&doc.layers, &options)?);
	out.extend(trailer(doc.odometer, &options)?);
	if options.raw {
		Ok(out)
	} else {
		Ok(scramble_bytes(&out))
	}
}

/// The union of every layer's bounding box, falling back to a degenerate
/// box at the origin for an empty or path-less document.
fn overall_bbox(doc: &Document) -> BBox {
	doc.layers
		.iter()
		.filter_map(|l| l.bbox)
		.reduce(BBox::union)
		.or(doc.bbox)
		.unwrap_or(BBox::from_point((0.0, 0.0)))
}

fn layer_bbox(layer: &Layer) -> BBox {
	layer.bbox.unwrap_or(BBox::from_point((0.0, 0.0)))
}

/// Build the once-per-job header: light/file-type magic, feeding, overall
/// bbox, then a per-layer speed/power/color/flags/bbox block, the
/// layer-count sentinel, and the fixed F2/E7 preamble block.
fn header(layers: &[Layer], bbox: BBox, options: &EncodeOptions) -> Result<Vec<u8>, CodecError> {
	let (xmin, ymin) = bbox.min;
	let (xmax, ymax) = bbox.max;

	let mut out = encode_hex(
		"
		d8 12           # Red Light on ?
		f0 f1 02 00     # file type ?
		d8 00           # Green Light off ?
		",
	);
	out.extend(enc("-nn", &[EncArg::Hex("e7 06"), EncArg::Number(0.0), EncArg::Number(0.0)])?);
	out.extend(enc("-nn", &[EncArg::Hex("e7 03"), EncArg::Number(xmin), EncArg::Number(ymin)])?);
	out.extend(enc("-nn", &[EncArg::Hex("e7 07"), EncArg::Number(xmax), EncArg::Number(ymax)])?);
	out.extend(enc("-nn", &[EncArg::Hex("e7 50"), EncArg::Number(xmin), EncArg::Number(ymin)])?);
	out.extend(enc("-nn", &[EncArg::Hex("e7 51"), EncArg::Number(xmax), EncArg::Number(ymax)])?);
	out.extend(enc("-nn", &[EncArg::Hex("e7 04 00 01 00 01"), EncArg::Number(0.0), EncArg::Number(0.0)])?);
	out.extend(enc("-", &[EncArg::Hex("e7 05 00")])?);

	for (lnum, layer) in layers.iter().enumerate() {
		let lb = layer_bbox(layer);
		let (lxmin, lymin) = lb.min;
		let (lxmax, lymax) = lb.max;

		out.extend(enc(
			"-bn",
			&[EncArg::Hex("c9 04"), EncArg::Byte(lnum as u8), EncArg::Number(layer.speed.cut)],
		)?);

		out.extend(enc(
			"-bp-bp",
			&[
				EncArg::Hex("c6 31"),
				EncArg::Byte(lnum as u8),
				EncArg::Percent(layer.power[0]),
				EncArg::Hex("c6 32"),
				EncArg::Byte(lnum as u8),
				EncArg::Percent(layer.power[1]),
			],
		)?);
		out.extend(enc(
			"-bp-bp",
			&[
				EncArg::Hex("c6 41"),
				EncArg::Byte(lnum as u8),
				EncArg::Percent(layer.power[2]),
				EncArg::Hex("c6 42"),
				EncArg::Byte(lnum as u8),
				EncArg::Percent(layer.power[3]),
			],
		)?);
		if options.enable_laser_3_4 {
			out.extend(enc(
				"-bp-bp",
				&[
					EncArg::Hex("c6 35"),
					EncArg::Byte(lnum as u8),
					EncArg::Percent(layer.power[4]),
					EncArg::Hex("c6 36"),
					EncArg::Byte(lnum as u8),
					EncArg::Percent(layer.power[5]),
				],
			)?);
			out.extend(enc(
				"-bp-bp",
				&[
					EncArg::Hex("c6 37"),
					EncArg::Byte(lnum as u8),
					EncArg::Percent(layer.power[6]),
					EncArg::Hex("c6 38"),
					EncArg::Byte(lnum as u8),
					EncArg::Percent(layer.power[7]),
				],
			)?);
		}

		out.extend(enc(
			"-bc-bb-bnn-bnn-bnn-bnn-",
			&[
				EncArg::Hex("ca 06"),
				EncArg::Byte(lnum as u8),
				EncArg::Color(layer.color.r, layer.color.g, layer.color.b),
				EncArg::Hex("ca 41"),
				EncArg::Byte(lnum as u8),
				EncArg::Byte(0),
				EncArg::Hex("e7 52"),
				EncArg::Byte(lnum as u8),
				EncArg::Number(lxmin),
				EncArg::Number(lymin),
				EncArg::Hex("e7 53"),
				EncArg::Byte(lnum as u8),
				EncArg::Number(lxmax),
				EncArg::Number(lymax),
				EncArg::Hex("e7 61"),
				EncArg::Byte(lnum as u8),
				EncArg::Number(lxmin),
				EncArg::Number(lymin),
				EncArg::Hex("e7 62"),
				EncArg::Byte(lnum as u8),
				EncArg::Number(lxmax),
				EncArg::Number(lymax),
			],
		)?);
	}

	let last_layer = layers.len().saturating_sub(1) as u8;
	out.extend(enc(
		"-b-",
		&[
			EncArg::Hex("ca 22"),
			EncArg::Byte(last_layer),
			EncArg::Hex(
				"
				e7 54 00 00 00 00 00 00
				e7 54 01 00 00 00 00 00
				",
			),
		],
	)?);
	out.extend(encode_hex(
		"
		e7 55 00 00 00 00 00 00
		e7 55 01 00 00 00 00 00
		f1 03 00 00 00 00 00 00 00 00 00 00
		f1 00 00
		f1 01 00
		f2 00 00
		f2 01 00
		f2 02 05 2a 39 1c 41 04 6a 15 08 20
		",
	));
	out.extend(enc("-nn", &[EncArg::Hex("f2 03"), EncArg::Number(xmin), EncArg::Number(ymin)])?);
	out.extend(enc("-nn", &[EncArg::Hex("f2 04"), EncArg::Number(xmax), EncArg::Number(ymax)])?);
	out.extend(enc("-nn", &[EncArg::Hex("f2 06"), EncArg::Number(xmin), EncArg::Number(ymin)])?);
	out.extend(encode_hex("f2 07 00"));
	out.extend(enc(
		"-nn",
		&[EncArg::Hex("f2 05 00 01 00 01"), EncArg::Number(xmax), EncArg::Number(ymax)],
	)?);
	out.extend(encode_hex("ea 00\ne7 60 00"));
	out.extend(enc("-nn", &[EncArg::Hex("e7 13"), EncArg::Number(xmin), EncArg::Number(ymin)])?);
	out.extend(enc("-nn", &[EncArg::Hex("e7 17"), EncArg::Number(xmax), EncArg::Number(ymax)])?);
	out.extend(enc("-nn", &[EncArg::Hex("e7 23"), EncArg::Number(xmin), EncArg::Number(ymin)])?);
	out.extend(encode_hex("e7 24 00"));
	out.extend(enc(
		"-nn",
		&[EncArg::Hex("e7 08 00 01 00 01"), EncArg::Number(xmax), EncArg::Number(ymax)],
	)?);

	Ok(out)
}

/// Build the per-layer body: a fixed prolog (priority, blow-on, speed,
/// global laser powers) followed by the layer's geometry.
fn body(layers: &[Layer], options: &EncodeOptions) -> Result<Vec<u8>, CodecError> {
	let mut out = Vec::new();
	for (lnum, layer) in layers.iter().enumerate() {
		out.extend(enc(
			"-b-",
			&[
				EncArg::Hex("ca 01 00\nca 02"),
				EncArg::Byte(lnum as u8),
				EncArg::Hex(
					"
					ca 01 30
					ca 01 10
					ca 01 13
					",
				),
			],
		)?);

		out.extend(enc(
			"-n-p-p-p-p-p-p",
			&[
				EncArg::Hex("c9 02"),
				EncArg::Number(layer.speed.cut),
				EncArg::Hex("c6 15 00 00 00 00 00\nc6 16 00 00 00 00 00\nc6 01"),
				EncArg::Percent(layer.power[0]),
				EncArg::Hex("c6 02"),
				EncArg::Percent(layer.power[1]),
				EncArg::Hex("c6 21"),
				EncArg::Percent(layer.power[2]),
				EncArg::Hex("c6 22"),
				EncArg::Percent(layer.power[3]),
			],
		)?);
		if options.enable_laser_3_4 {
			out.extend(enc(
				"-p-p-p-p",
				&[
					EncArg::Hex("c6 05"),
					EncArg::Percent(layer.power[4]),
					EncArg::Hex("c6 06"),
					EncArg::Percent(layer.power[5]),
					EncArg::Hex("c6 07"),
					EncArg::Percent(layer.power[6]),
					EncArg::Hex("c6 08"),
					EncArg::Percent(layer.power[7]),
				],
			)?);
		}
		out.extend(encode_hex("ca 03 01\nca 10 00"));

		out.extend(geometry(layer, options.force_abs_interval)?);
	}
	Ok(out)
}

/// Emit the `Mov`/`Cut` sequence for every path in `layer`, choosing
/// relative vs. absolute form per `SPEC_FULL.md` §4.E.
fn geometry(layer: &Layer, force_abs_interval: usize) -> Result<Vec<u8>, CodecError> {
	let mut out = Vec::new();
	let mut last: Option<Point> = None;
	let mut rel_counter = 0usize;

	for path in &layer.paths {
		let mut travel = true;
		for &p in path {
			let use_rel = relok(last, p) && (force_abs_interval == 0 || rel_counter < force_abs_interval);
			if use_rel {
				if force_abs_interval > 0 {
					rel_counter += 1;
				}
				let (lx, ly) = last.expect("relok only true when last is Some");
				let (dx, dy) = (p.0 - lx, p.1 - ly);
				if dy == 0.0 {
					out.extend(enc("-r", &[EncArg::Hex(if travel { "8a" } else { "aa" }), EncArg::Rel(dx)])?);
				} else if dx == 0.0 {
					out.extend(enc("-r", &[EncArg::Hex(if travel { "8b" } else { "ab" }), EncArg::Rel(dy)])?);
				} else {
					out.extend(enc(
						"-rr",
						&[EncArg::Hex(if travel { "89" } else { "a9" }), EncArg::Rel(dx), EncArg::Rel(dy)],
					)?);
				}
			} else {
				rel_counter = 0;
				out.extend(enc("-nn", &[EncArg::Hex(if travel { "88" } else { "a8" }), EncArg::Number(p.0), EncArg::Number(p.1)])?);
			}
			last = Some(p);
			travel = false;
		}
	}
	Ok(out)
}

/// `true` iff the move from `last` to `point` fits in the 2-byte relative
/// coordinate encoding on both axes.
fn relok(last: Option<Point>, point: Point) -> bool {
	use crate::primitives::MAX_RELCOORD_MM;
	let Some((lx, ly)) = last else { return false };
	let dx = (point.0 - lx).abs();
	let dy = (point.1 - ly).abs();
	dx.max(dy) <= MAX_RELCOORD_MM
}

/// Build the trailer: `EB E7 00`, the odometer record, then `D7` (EOF).
///
/// The odometer record encodes the cut distance (in metres) twice by
/// default, preserving the reference tooling's observed (and possibly
/// buggy) behavior; see `SPEC_FULL.md` §9.
fn trailer(odometer: (f64, f64), options: &EncodeOptions) -> Result<Vec<u8>, CodecError> {
	let (cut_mm, travel_mm) = odometer;
	let cut_m = cut_mm * 0.001;
	let travel_m = travel_mm * 0.001;
	let second = if options.trailer_travel_distance { travel_m } else { cut_m };
	let mut out = enc("-nn-", &[EncArg::Hex("eb e7 00\nda 01 06 20"), EncArg::Number(cut_m), EncArg::Number(second), EncArg::Hex("d7")])?;
	out.shrink_to_fit();
	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{Color, Layer, Speed};

	fn square_doc() -> Document {
		let mut doc = Document::new();
		let mut layer = Layer::new(Speed::scalar(30.0), vec![50.0, 70.0], Color::new(0, 255, 0));
		layer.add_path(vec![(0.0, 0.0), (50.0, 0.0), (50.0, 50.0), (0.0, 50.0), (0.0, 0.0)]);
		doc.add_layer(layer);
		doc.recompute_bbox();
		doc.recompute_odometer();
		doc
	}

	#[test]
	fn encode_is_deterministic() {
		let doc = square_doc();
		let a = encode(&doc, EncodeOptions::default()).unwrap();
		let b = encode(&doc, EncodeOptions::default()).unwrap();
		assert_eq!(a, b);
	}

	#[test]
	fn raw_encode_skips_scramble() {
		let doc = square_doc();
		let raw = encode(&doc, EncodeOptions { raw: true, ..EncodeOptions::default() }).unwrap();
		assert_eq!(raw[0], 0xd8);
		assert_eq!(raw[1], 0x12);
	}

	#[test]
	fn scrambled_encode_matches_raw_scrambled() {
		let doc = square_doc();
		let raw = encode(&doc, EncodeOptions { raw: true, ..EncodeOptions::default() }).unwrap();
		let scrambled = encode(&doc, EncodeOptions::default()).unwrap();
		assert_eq!(scrambled, scramble_bytes(&raw));
	}

	#[test]
	fn trailer_default_repeats_cut_distance() {
		let out = trailer((1000.0, 500.0), &EncodeOptions::default()).unwrap();
		// eb e7 00 | da 01 06 20 | number(1.0) | number(1.0) | d7
		assert_eq!(&out[0..3], &[0xeb, 0xe7, 0x00]);
		let first = &out[7..12];
		let second = &out[12..17];
		assert_eq!(first, second);
		assert_eq!(out[out.len() - 1], 0xd7);
	}

	#[test]
	fn default_options_emit_laser_3_4_records() {
		let doc = square_doc();
		let raw = encode(&doc, EncodeOptions { raw: true, ..EncodeOptions::default() }).unwrap();
		assert!(raw.windows(2).any(|w| w == [0xc6, 0x35]), "header should carry the laser 3/4 min-power record by default");
		assert!(raw.windows(2).any(|w| w == [0xc6, 0x05]), "body should carry the laser 3 min-power record by default");
	}

	#[test]
	fn disabling_laser_3_4_omits_those_records() {
		let doc = square_doc();
		let raw = encode(&doc, EncodeOptions { raw: true, enable_laser_3_4: false, ..EncodeOptions::default() }).unwrap();
		assert!(!raw.windows(2).any(|w| w == [0xc6, 0x35]));
		assert!(!raw.windows(2).any(|w| w == [0xc6, 0x05]));
	}

	#[test]
	fn trailer_travel_distance_option_differs() {
		let default_out = trailer((1000.0, 500.0), &EncodeOptions::default()).unwrap();
		let travel_out = trailer((1000.0, 500.0), &EncodeOptions { trailer_travel_distance: true, ..EncodeOptions::default() }).unwrap();
		assert_ne!(default_out[12..17], travel_out[12..17]);
	}
}
