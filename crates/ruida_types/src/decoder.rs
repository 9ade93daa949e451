//! The stream decoder: walks an unscrambled byte stream, dispatches through
//! the [`crate::opcode`] table, and builds up a [`Document`].

use crate::error::CodecError;
use crate::model::{BBox, Color, Document, Laser, Layer, Point, Speed};
use crate::opcode::{self, Action};
use crate::primitives::{decode_color, decode_number, decode_percent_f, decode_relcoord};

/// One successfully decoded operation, recorded for diagnostics.
#[derive(Debug, Clone)]
pub struct DecodedOp {
	/// Byte offset of the opcode that produced this operation.
	pub offset: usize,
	/// The operation's diagnostic name, from its [`opcode::Leaf`].
	pub name: &'static str,
	/// The decoded argument value, for operations that carry one but have
	/// no field in [`Document`] to store it in (e.g. [`Action::DirectMoveZ`]).
	pub value: Option<f64>,
}

/// Behavior when the decoder meets an opcode with no table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownOpcodePolicy {
	/// Fail immediately (the default).
	#[default]
	Fatal,
	/// Skip the offending byte and continue, recording the anomaly in the trace.
	Lenient,
}

/// Decoder configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
	/// How to handle opcodes with no table entry.
	pub on_unknown_opcode: UnknownOpcodePolicy,
}

/// The outcome of a decode: the recovered document, a diagnostic trace,
/// and — for lenient decodes, or a fatal decode's partial progress — the
/// number of opcode-bytes' worth of anomalies skipped.
#[derive(Debug, Clone)]
pub struct DecodeResult {
	/// The recovered document.
	pub document: Document,
	/// Ordered trace of every operation the decoder dispatched.
	pub trace: Vec<DecodedOp>,
	/// Opcodes skipped under [`UnknownOpcodePolicy::Lenient`].
	pub anomalies: Vec<(usize, String)>,
}

/// Explicit decoder state threaded through every handler, replacing an
/// ad-hoc tangle of "current path" / "current layer" / laser-map globals.
struct DecodeState {
	doc: Document,
	/// Current layer priority: the layer new paths are attached to.
	prio: usize,
	/// Current absolute position, if any path has been started yet.
	cursor: Option<Point>,
	/// The layer owning the path currently open for `Cut*` appends, if any.
	open_path_layer: Option<usize>,
}

impl DecodeState {
	fn new() -> Self {
		DecodeState { doc: Document::new(), prio: 0, cursor: None, open_path_layer: None }
	}

	fn ensure_layer(&mut self, idx: usize) -> usize {
		while self.doc.layers.len() <= idx {
			self.doc.layers.push(Layer::new(Speed::scalar(0.0), vec![0.0, 100.0], Color::default()));
		}
		idx
	}

	fn ensure_laser(&mut self, n: u8, layer: Option<usize>) -> usize {
		if let Some(pos) = self.doc.lasers.iter().position(|l| l.n == n && l.layer == layer) {
			return pos;
		}
		self.doc.lasers.push(Laser::new(n, layer));
		self.doc.lasers.len() - 1
	}

	fn start_path(&mut self, point: Point) {
		let layer = self.ensure_layer(self.prio);
		self.doc.layers[layer].paths.push(vec![point]);
		self.cursor = Some(point);
		self.open_path_layer = Some(layer);
	}

	fn append_point(&mut self, point: Point) {
		match self.open_path_layer {
			Some(layer) => {
				self.doc.layers[layer].paths.last_mut().expect("open_path_layer implies a path exists").push(point);
			}
			None => {
				let origin = (0.0, 0.0);
				self.start_path(origin);
				let layer = self.open_path_layer.expect("just started");
				self.doc.layers[layer].paths.last_mut().unwrap().push(point);
			}
		}
		self.cursor = Some(point);
	}

	fn extend_layer_bbox(&mut self, layer: usize, p1: Point, p2: Point) {
		let layer = self.ensure_layer(layer);
		let mut bbox = BBox::from_point(p1);
		bbox.extend(p2);
		self.doc.layers[layer].bbox = Some(match self.doc.layers[layer].bbox {
			Some(existing) => BBox::union(existing, bbox),
			None => bbox,
		});
	}

	fn extend_doc_bbox(&mut self, p1: Point, p2: Point) {
		let mut bbox = BBox::from_point(p1);
		bbox.extend(p2);
		self.doc.bbox = Some(match self.doc.bbox {
			Some(existing) => BBox::union(existing, bbox),
			None => bbox,
		});
	}
}

fn rel_delta(buf: &[u8]) -> Result<f64, CodecError> {
	decode_relcoord(buf)
}

/// Decode an unscrambled byte stream into a [`Document`] plus diagnostic trace.
pub fn decode(buf: &[u8], options: DecodeOptions) -> Result<DecodeResult, CodecError> {
	let table = opcode::table();
	let mut state = DecodeState::new();
	let mut trace = Vec::new();
	let mut anomalies = Vec::new();
	let mut offset = 0usize;

	while offset < buf.len() {
		let opcode_offset = offset;
		let b0 = buf[offset];
		offset += 1;

		let leaf = if table.has_subtable(b0) {
			if offset >= buf.len() {
				return Err(CodecError::Truncated { offset: opcode_offset, needed: 1 });
			}
			let b1 = buf[offset];
			match table.lookup2(b0, b1) {
				Some(leaf) => {
					offset += 1;
					Some(leaf)
				}
				None => {
					match options.on_unknown_opcode {
						UnknownOpcodePolicy::Fatal => return Err(CodecError::UnknownOpcode2(b0, b1)),
						UnknownOpcodePolicy::Lenient => {
							anomalies.push((opcode_offset, format!("unknown opcode {b0:#04x} {b1:#04x}")));
							offset += 1;
							None
						}
					}
				}
			}
		} else {
			match table.lookup1(b0) {
				Some(leaf) => Some(leaf),
				None => match options.on_unknown_opcode {
					UnknownOpcodePolicy::Fatal => return Err(CodecError::UnknownOpcode(b0)),
					UnknownOpcodePolicy::Lenient => {
						anomalies.push((opcode_offset, format!("unknown opcode {b0:#04x}")));
						None
					}
				},
			}
		};

		let Some(leaf) = leaf else { continue };

		if offset + leaf.arg_len > buf.len() {
			return Err(CodecError::Truncated { offset: opcode_offset, needed: offset + leaf.arg_len - buf.len() });
		}
		let args = &buf[offset..offset + leaf.arg_len];
		offset += leaf.arg_len;

		let value = dispatch(&mut state, leaf.action, leaf.literal, args)?;
		trace.push(DecodedOp { offset: opcode_offset, name: leaf.name, value });
	}

	state.doc.recompute_bbox();
	state.doc.recompute_odometer();
	Ok(DecodeResult { document: state.doc, trace, anomalies })
}

/// Dispatches `action`, returning the decoded value for actions that carry
/// one but have nowhere in [`Document`] to put it (only [`Action::DirectMoveZ`]
/// today).
fn dispatch(
	state: &mut DecodeState,
	action: Action,
	literal: Option<u8>,
	args: &[u8],
) -> Result<Option<f64>, CodecError> {
	if let Action::DirectMoveZ = action {
		// Leading byte is an axis/flag marker the reference table skips;
		// the absolute-number field follows it.
		let z = decode_number(&args[1..6])?;
		return Ok(Some(z));
	}
	mutate(state, action, literal, args)?;
	Ok(None)
}

fn mutate(state: &mut DecodeState, action: Action, literal: Option<u8>, args: &[u8]) -> Result<(), CodecError> {
	match action {
		Action::MoveAbs => {
			let x = decode_number(&args[0..5])?;
			let y = decode_number(&args[5..10])?;
			state.open_path_layer = None;
			state.start_path((x, y));
		}
		Action::MoveRel | Action::MoveHoriz | Action::MoveVert => {
			let (dx, dy) = decode_rel_pair(state, action, args)?;
			let base = state.cursor.unwrap_or((0.0, 0.0));
			state.open_path_layer = None;
			state.start_path((base.0 + dx, base.1 + dy));
		}
		Action::CutAbs => {
			let x = decode_number(&args[0..5])?;
			let y = decode_number(&args[5..10])?;
			state.append_point((x, y));
		}
		Action::CutRel | Action::CutHoriz | Action::CutVert => {
			let (dx, dy) = decode_rel_pair(state, action, args)?;
			let base = state.cursor.unwrap_or((0.0, 0.0));
			state.append_point((base.0 + dx, base.1 + dy));
		}
		Action::LaserMinPow => {
			let pct = decode_percent_f(args)?;
			let idx = state.ensure_laser(literal.unwrap_or(1), None);
			state.doc.lasers[idx].min_pow = Some(pct);
		}
		Action::LaserMaxPow => {
			let pct = decode_percent_f(args)?;
			let idx = state.ensure_laser(literal.unwrap_or(1), None);
			state.doc.lasers[idx].max_pow = Some(pct);
		}
		Action::LaserMinPowLay => {
			let layer = args[0] as usize;
			let pct = decode_percent_f(&args[1..3])?;
			state.ensure_layer(layer);
			let idx = state.ensure_laser(literal.unwrap_or(1), Some(layer));
			state.doc.lasers[idx].min_pow = Some(pct);
		}
		Action::LaserMaxPowLay => {
			let layer = args[0] as usize;
			let pct = decode_percent_f(&args[1..3])?;
			state.ensure_layer(layer);
			let idx = state.ensure_laser(literal.unwrap_or(1), Some(layer));
			state.doc.lasers[idx].max_pow = Some(pct);
		}
		Action::CutThroughPow => {
			// Diagnostic-only: no field in the document model records
			// cut-through power today; the value is still range-checked.
			let _ = decode_percent_f(args)?;
		}
		Action::LaserFreq => {
			let laser_n = args[0];
			let freq = decode_number(&args[2..7])?;
			let idx = state.ensure_laser(laser_n, None);
			state.doc.lasers[idx].freq = Some(freq);
		}
		Action::LayerSpeed => {
			let layer = args[0] as usize;
			let speed = decode_number(&args[1..6])?;
			let layer = state.ensure_layer(layer);
			state.doc.layers[layer].speed = Speed::scalar(speed);
		}
		Action::LayerPriority => {
			state.prio = args[0] as usize;
			state.ensure_layer(state.prio);
		}
		Action::LayerColor => {
			let layer = args[0] as usize;
			let (r, g, b) = decode_color(&args[1..6])?;
			let layer = state.ensure_layer(layer);
			state.doc.layers[layer].color = Color::new(r, g, b);
		}
		Action::BbTopLeft | Action::BbBotRight => {
			let x = decode_number(&args[0..5])?;
			let y = decode_number(&args[5..10])?;
			state.extend_doc_bbox((x, y), (x, y));
		}
		Action::LayTopLeft | Action::LayBotRight => {
			let layer = args[0] as usize;
			let x = decode_number(&args[1..6])?;
			let y = decode_number(&args[6..11])?;
			state.extend_layer_bbox(layer, (x, y), (x, y));
		}
		Action::Feeding => {
			// Diagnostic-only: the feeding distance pair is not part of the document model.
			let _ = decode_number(&args[0..5])?;
			let _ = decode_number(&args[5..10])?;
		}
		Action::LaserOffset => {
			let x = decode_number(&args[0..5])?;
			let y = decode_number(&args[5..10])?;
			let idx = state.ensure_laser(literal.unwrap_or(2), None);
			state.doc.lasers[idx].offset = (x, y);
		}
		Action::DirectMoveZ => unreachable!("handled in dispatch before reaching mutate"),
		Action::Skip => {}
	}
	Ok(())
}

fn decode_rel_pair(state: &DecodeState, action: Action, args: &[u8]) -> Result<(f64, f64), CodecError> {
	let _ = state;
	match action {
		Action::MoveRel | Action::CutRel => {
			let dx = rel_delta(&args[0..2])?;
			let dy = rel_delta(&args[2..4])?;
			Ok((dx, dy))
		}
		Action::MoveHoriz | Action::CutHoriz => Ok((rel_delta(&args[0..2])?, 0.0)),
		Action::MoveVert | Action::CutVert => Ok((0.0, rel_delta(&args[0..2])?)),
		_ => unreachable!("decode_rel_pair called with a non-relative action"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::encoder::{encode, EncodeOptions};

	#[test]
	fn decode_rejects_unknown_opcode_by_default() {
		let err = decode(&[0x00], DecodeOptions::default()).unwrap_err();
		assert_eq!(err, CodecError::UnknownOpcode(0x00));
	}

	#[test]
	fn lenient_mode_skips_unknown_opcode_and_continues() {
		let mut stream = vec![0x00];
		stream.push(0xeb); // Finish, a zero-arg leaf, to prove decoding continued.
		let options = DecodeOptions { on_unknown_opcode: UnknownOpcodePolicy::Lenient };
		let result = decode(&stream, options).unwrap();
		assert_eq!(result.anomalies.len(), 1);
		assert_eq!(result.trace.len(), 1);
		assert_eq!(result.trace[0].name, "Finish");
	}

	#[test]
	fn direct_move_z_is_decoded_onto_the_trace_not_materialized_as_geometry() {
		let mut stream = vec![0xd9, 0x02, 0x00];
		stream.extend_from_slice(&crate::primitives::encode_number(12.5).unwrap());

		let result = decode(&stream, DecodeOptions::default()).unwrap();

		assert_eq!(result.trace.len(), 1);
		assert_eq!(result.trace[0].name, "Direct_Move_Z_rel");
		assert_eq!(result.trace[0].value, Some(12.5));
		assert!(result.document.layers.is_empty(), "a Z move alone should not start a path");
	}

	#[test]
	fn s6_round_trip_two_layers() {
		let mut doc = Document::new();
		let mut layer0 = Layer::new(Speed::scalar(300.0), vec![10.0, 60.0], Color::new(255, 0, 0));
		layer0.add_path(vec![(0.0, 0.0), (5.0, 0.0), (2.5, 4.0), (0.0, 0.0)]);
		layer0.add_path(vec![(10.0, 10.0), (12.0, 10.0), (11.0, 12.0), (10.0, 10.0)]);
		doc.add_layer(layer0);

		let mut layer1 = Layer::new(Speed::scalar(500.0), vec![20.0, 80.0], Color::new(0, 255, 0));
		layer1.add_path(vec![(0.0, 0.0), (50.0, 0.0), (50.0, 50.0), (0.0, 50.0), (0.0, 0.0)]);
		doc.add_layer(layer1);
		doc.recompute_bbox();

		let scrambled = encode(&doc, EncodeOptions::default()).unwrap();
		let unscrambled = crate::scramble::unscramble_bytes(&scrambled);
		let result = decode(&unscrambled, DecodeOptions::default()).unwrap();

		assert_eq!(result.document.layers.len(), 2);
		assert_eq!(result.document.layers[0].paths.len(), 2);
		assert_eq!(result.document.layers[1].paths.len(), 1);
		assert_eq!(result.document.layers[1].paths[0].len(), 5);
	}
}
