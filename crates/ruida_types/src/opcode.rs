//! The two-level opcode dispatch table: primary byte -> leaf command or
//! 256-entry sub-table, each leaf carrying a decoder action tag, a fixed
//! argument length, and a diagnostic argument-shape string.
//!
//! Built once from a declarative list (grounded directly in
//! `ruidaparser.py`'s `rd_decoder_table`) into a flat, statically verified
//! `[Entry; 256]`, giving O(1) dispatch with no risk of opcode collisions
//! going unnoticed.

use std::sync::OnceLock;

/// The decoder action a [`Leaf`] dispatches to. Variants that mutate the
/// evolving `Document` have a dedicated handler in [`crate::decoder`];
/// everything else is [`Action::Skip`], which only advances the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
	/// Begin a new path at an absolute `(x, y)`.
	MoveAbs,
	/// Begin a new path at current position + relative `(dx, dy)`.
	MoveRel,
	/// Begin a new path at current position + relative `dx` (`dy = 0`).
	MoveHoriz,
	/// Begin a new path at current position + relative `dy` (`dx = 0`).
	MoveVert,
	/// Append an absolute `(x, y)` to the current path.
	CutAbs,
	/// Append current position + relative `(dx, dy)` to the current path.
	CutRel,
	/// Append current position + relative `dx` to the current path.
	CutHoriz,
	/// Append current position + relative `dy` to the current path.
	CutVert,
	/// Set a global laser's minimum power.
	LaserMinPow,
	/// Set a global laser's maximum power.
	LaserMaxPow,
	/// Set a per-layer laser's minimum power.
	LaserMinPowLay,
	/// Set a per-layer laser's maximum power.
	LaserMaxPowLay,
	/// Set a laser's cut-through power.
	CutThroughPow,
	/// Set a laser's pulse frequency.
	LaserFreq,
	/// Set a layer's speed.
	LayerSpeed,
	/// Set the current layer priority (which layer subsequent paths belong to).
	LayerPriority,
	/// Set a layer's preview color.
	LayerColor,
	/// Update the overall bounding box's top-left corner.
	BbTopLeft,
	/// Update the overall bounding box's bottom-right corner.
	BbBotRight,
	/// Update a layer-local bounding box's top-left corner.
	LayTopLeft,
	/// Update a layer-local bounding box's bottom-right corner.
	LayBotRight,
	/// Record the feeding distance pair.
	Feeding,
	/// Record a secondary laser's XY offset.
	LaserOffset,
	/// Decode the Z-axis direct-move argument and record it on the trace,
	/// without materializing it as path geometry.
	DirectMoveZ,
	/// No document mutation; only advance the cursor by `arg_len` bytes.
	Skip,
}

/// A single dispatch-table entry: the operation decoded from one primary
/// (and, for two-level entries, secondary) opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leaf {
	/// Diagnostic operation name, matching the naming used by the reference tooling.
	pub name: &'static str,
	/// The decoder action to dispatch to.
	pub action: Action,
	/// Fixed argument length in bytes, not including the opcode byte(s) themselves.
	pub arg_len: usize,
	/// Argument shape string, for diagnostics and generic skip-decoding.
	pub shape: &'static str,
	/// A literal parameter baked into the opcode itself (e.g. laser index 1..4).
	pub literal: Option<u8>,
}

const fn leaf(name: &'static str, action: Action, arg_len: usize, shape: &'static str) -> Leaf {
	Leaf { name, action, arg_len, shape, literal: None }
}

const fn leaf_lit(
	name: &'static str,
	action: Action,
	arg_len: usize,
	shape: &'static str,
	literal: u8,
) -> Leaf {
	Leaf { name, action, arg_len, shape, literal: Some(literal) }
}

/// One primary-opcode table entry: either a leaf command, or a pointer to a
/// 256-entry secondary table keyed by the next byte.
enum Entry {
	Empty,
	Leaf(Leaf),
	SubTable(Box<[Option<Leaf>; 256]>),
}

/// The full two-level dispatch table.
pub struct OpcodeTable {
	primary: Box<[Entry; 256]>,
}

impl OpcodeTable {
	/// Look up a leaf for `b0` alone (single-byte opcode).
	pub fn lookup1(&self, b0: u8) -> Option<Leaf> {
		match &self.primary[b0 as usize] {
			Entry::Leaf(l) => Some(*l),
			_ => None,
		}
	}

	/// Look up a leaf for the two-byte opcode `(b0, b1)`.
	pub fn lookup2(&self, b0: u8, b1: u8) -> Option<Leaf> {
		match &self.primary[b0 as usize] {
			Entry::SubTable(sub) => sub[b1 as usize],
			_ => None,
		}
	}

	/// `true` if `b0` expects a secondary opcode byte.
	pub fn has_subtable(&self, b0: u8) -> bool {
		matches!(&self.primary[b0 as usize], Entry::SubTable(_))
	}
}

fn build() -> OpcodeTable {
	let mut primary: Box<[Entry; 256]> = Box::new(std::array::from_fn(|_| Entry::Empty));

	// Motion (§4.C).
	primary[0x88] = Entry::Leaf(leaf("Mov_Abs", Action::MoveAbs, 10, ":abs, :abs"));
	primary[0x89] = Entry::Leaf(leaf("Mov_Rel", Action::MoveRel, 4, ":rel, :rel"));
	primary[0x8a] = Entry::Leaf(leaf("Mov_Horiz", Action::MoveHoriz, 2, ":rel"));
	primary[0x8b] = Entry::Leaf(leaf("Mov_Vert", Action::MoveVert, 2, ":rel"));
	primary[0xa8] = Entry::Leaf(leaf("Cut_Abs", Action::CutAbs, 10, ":abs, :abs"));
	primary[0xa9] = Entry::Leaf(leaf("Cut_Rel", Action::CutRel, 4, ":rel, :rel"));
	primary[0xaa] = Entry::Leaf(leaf("Cut_Horiz", Action::CutHoriz, 2, ":rel"));
	primary[0xab] = Entry::Leaf(leaf("Cut_Vert", Action::CutVert, 2, ":rel"));

	// Generic 2-byte control skips.
	for op in 0xc0u8..=0xc5 {
		primary[op as usize] = Entry::Leaf(leaf("Cn", Action::Skip, 2, ""));
	}
	primary[0xc7] = Entry::Leaf(leaf("C7", Action::Skip, 2, ""));
	primary[0xc8] = Entry::Leaf(leaf("C8", Action::Skip, 2, ""));

	// 0xC6: laser power parameters.
	let mut c6: Box<[Option<Leaf>; 256]> = Box::new([None; 256]);
	c6[0x01] = Some(leaf_lit("Laser_1_Min_Pow_C6_01", Action::LaserMinPow, 2, ":power", 1));
	c6[0x02] = Some(leaf_lit("Laser_1_Max_Pow_C6_02", Action::LaserMaxPow, 2, ":power", 1));
	c6[0x05] = Some(leaf_lit("Laser_3_Min_Pow_C6_05", Action::LaserMinPow, 2, ":power", 3));
	c6[0x06] = Some(leaf_lit("Laser_3_Max_Pow_C6_06", Action::LaserMaxPow, 2, ":power", 3));
	c6[0x07] = Some(leaf_lit("Laser_4_Min_Pow_C6_07", Action::LaserMinPow, 2, ":power", 4));
	c6[0x08] = Some(leaf_lit("Laser_4_Max_Pow_C6_08", Action::LaserMaxPow, 2, ":power", 4));
	c6[0x10] = Some(leaf("Dot_time", Action::Skip, 5, ":sec"));
	c6[0x12] = Some(leaf("Cut_Open_delay_12", Action::Skip, 5, ":ms"));
	c6[0x13] = Some(leaf("Cut_Close_delay_13", Action::Skip, 5, ":ms"));
	c6[0x15] = Some(leaf("Cut_Open_delay_15", Action::Skip, 5, ":ms"));
	c6[0x16] = Some(leaf("Cut_Close_delay_16", Action::Skip, 5, ":ms"));
	c6[0x21] = Some(leaf_lit("Laser_2_Min_Pow_C6_21", Action::LaserMinPow, 2, ":power", 2));
	c6[0x22] = Some(leaf_lit("Laser_2_Max_Pow_C6_22", Action::LaserMaxPow, 2, ":power", 2));
	c6[0x31] = Some(leaf_lit("Laser_1_Min_Pow_C6_31", Action::LaserMinPowLay, 3, ":layer, :power", 1));
	c6[0x32] = Some(leaf_lit("Laser_1_Max_Pow_C6_32", Action::LaserMaxPowLay, 3, ":layer, :power", 1));
	// 654XG only.
	c6[0x35] = Some(leaf_lit("Laser_3_Min_Pow_C6_35", Action::LaserMinPowLay, 3, ":layer, :power", 3));
	c6[0x36] = Some(leaf_lit("Laser_3_Max_Pow_C6_36", Action::LaserMaxPowLay, 3, ":layer, :power", 3));
	c6[0x37] = Some(leaf_lit("Laser_4_Min_Pow_C6_37", Action::LaserMinPowLay, 3, ":layer, :power", 4));
	c6[0x38] = Some(leaf_lit("Laser_4_Max_Pow_C6_38", Action::LaserMaxPowLay, 3, ":layer, :power", 4));
	c6[0x41] = Some(leaf_lit("Laser_2_Min_Pow_C6_41", Action::LaserMinPowLay, 3, ":layer, :power", 2));
	c6[0x42] = Some(leaf_lit("Laser_2_Max_Pow_C6_42", Action::LaserMaxPowLay, 3, ":layer, :power", 2));
	c6[0x50] = Some(leaf_lit("Cut_through_power1", Action::CutThroughPow, 2, ":power", 1));
	c6[0x51] = Some(leaf_lit("Cut_through_power2", Action::CutThroughPow, 2, ":power", 2));
	c6[0x55] = Some(leaf_lit("Cut_through_power3", Action::CutThroughPow, 2, ":power", 3));
	c6[0x56] = Some(leaf_lit("Cut_through_power4", Action::CutThroughPow, 2, ":power", 4));
	c6[0x60] = Some(leaf("Laser_Freq", Action::LaserFreq, 7, ":laser, 0x00, :freq"));
	primary[0xc6] = Entry::SubTable(c6);

	// 0xC9: speed.
	let mut c9: Box<[Option<Leaf>; 256]> = Box::new([None; 256]);
	c9[0x02] = Some(leaf("Speed_C9_02", Action::Skip, 5, ":speed"));
	c9[0x04] = Some(leaf("Layer_Speed", Action::LayerSpeed, 6, ":layer, :speed"));
	primary[0xc9] = Entry::SubTable(c9);

	// 0xCA: layer/blow/flags/color/priority/count.
	let mut ca: Box<[Option<Leaf>; 256]> = Box::new([None; 256]);
	ca[0x01] = Some(leaf("Flags_CA_01", Action::Skip, 1, "flags"));
	ca[0x02] = Some(leaf("Prio", Action::LayerPriority, 1, ":priority"));
	ca[0x03] = Some(leaf("CA_03", Action::Skip, 1, ""));
	ca[0x06] = Some(leaf("Layer_Color", Action::LayerColor, 6, ":layer, :color"));
	ca[0x10] = Some(leaf("CA_10", Action::Skip, 1, ""));
	ca[0x12] = Some(leaf("Blow_off", Action::Skip, 0, ""));
	ca[0x13] = Some(leaf("Blow_on", Action::Skip, 0, ""));
	ca[0x22] = Some(leaf("Layer_Count", Action::Skip, 1, ""));
	ca[0x41] = Some(leaf("Layer_CA_41", Action::Skip, 2, ":layer, -1"));
	primary[0xca] = Entry::SubTable(ca);

	primary[0xcc] = Entry::Leaf(leaf("ACK_response", Action::Skip, 0, ""));
	primary[0xd7] = Entry::Leaf(leaf("EOF", Action::Skip, 0, ""));

	// 0xD8: light.
	let mut d8: Box<[Option<Leaf>; 256]> = Box::new([None; 256]);
	d8[0x00] = Some(leaf("Light_RED", Action::Skip, 0, ""));
	d8[0x12] = Some(leaf("UploadFollows", Action::Skip, 0, ""));
	primary[0xd8] = Entry::SubTable(d8);

	// 0xD9: direct-drive X/Y/Z. Per the reference table all three carry a
	// 1+5-byte absolute argument (not a 2-byte relative one) despite the
	// "_rel" name. None of these are materialized as path geometry; the Z
	// entry additionally decodes its value onto the trace (the axis byte
	// is skipped, the trailing 5 bytes are the absolute-number field).
	let mut d9: Box<[Option<Leaf>; 256]> = Box::new([None; 256]);
	d9[0x00] = Some(leaf("Direct_Move_X_rel", Action::Skip, 6, ":mm"));
	d9[0x01] = Some(leaf("Direct_Move_Y_rel", Action::Skip, 6, ":mm"));
	d9[0x02] = Some(leaf("Direct_Move_Z_rel", Action::DirectMoveZ, 6, ":mm"));
	primary[0xd9] = Entry::SubTable(d9);

	// 0xDA: work interval / odometer.
	let mut da: Box<[Option<Leaf>; 256]> = Box::new([None; 256]);
	da[0x00] = Some(leaf("Work_Interval_query", Action::Skip, 2, ""));
	da[0x01] = Some(leaf("Work_Interval_resp1", Action::Skip, 7, ""));
	da[0x02] = Some(leaf("Work_Interval_resp2", Action::Skip, 12, ":meter, :meter"));
	primary[0xda] = Entry::SubTable(da);

	// 0xE6: misc.
	let mut e6: Box<[Option<Leaf>; 256]> = Box::new([None; 256]);
	e6[0x01] = Some(leaf("E6_01", Action::Skip, 0, ""));
	primary[0xe6] = Entry::SubTable(e6);

	// 0xE7: bounding boxes and layer geometry.
	let mut e7: Box<[Option<Leaf>; 256]> = Box::new([None; 256]);
	e7[0x00] = Some(leaf("Stop", Action::Skip, 0, ""));
	e7[0x01] = Some(leaf("SetFilename", Action::Skip, 0, ":string"));
	e7[0x03] = Some(leaf("Bounding_Box_Top_Left", Action::BbTopLeft, 10, ":abs, :abs"));
	e7[0x04] = Some(leaf("E7_04", Action::Skip, 14, ":abs, :abs"));
	e7[0x05] = Some(leaf("E7_05", Action::Skip, 1, ""));
	e7[0x06] = Some(leaf("Feeding", Action::Feeding, 10, ":abs, :abs"));
	e7[0x07] = Some(leaf("Bounding_Box_Bottom_Right", Action::BbBotRight, 10, ":abs, :abs"));
	e7[0x08] = Some(leaf("Bottom_Right_E7_08", Action::Skip, 14, ":abs, :abs"));
	e7[0x13] = Some(leaf("E7_13", Action::Skip, 10, ":abs, :abs"));
	e7[0x17] = Some(leaf("Bottom_Right_E7_17", Action::Skip, 10, ":abs, :abs"));
	e7[0x23] = Some(leaf("E7_23", Action::Skip, 10, ":abs, :abs"));
	e7[0x24] = Some(leaf("E7_24", Action::Skip, 1, ""));
	e7[0x50] = Some(leaf("Bounding_Box_Top_Left_50", Action::BbTopLeft, 10, ":abs, :abs"));
	e7[0x51] = Some(leaf("Bounding_Box_Bottom_Right_51", Action::BbBotRight, 10, ":abs, :abs"));
	e7[0x52] = Some(leaf("Layer_Top_Left_E7_52", Action::LayTopLeft, 11, ":layer, :abs, :abs"));
	e7[0x53] = Some(leaf("Layer_Bottom_Right_E7_53", Action::LayBotRight, 11, ":layer, :abs, :abs"));
	e7[0x54] = Some(leaf("Pen_Draw_Y", Action::Skip, 6, ":layer, :abs"));
	e7[0x55] = Some(leaf("Laser_Y_Offset", Action::Skip, 6, ":layer, :abs"));
	e7[0x60] = Some(leaf("E7_60", Action::Skip, 1, ""));
	e7[0x61] = Some(leaf("Layer_Top_Left_E7_61", Action::LayTopLeft, 11, ":layer, :abs, :abs"));
	e7[0x62] = Some(leaf("Layer_Bottom_Right_E7_62", Action::LayBotRight, 11, ":layer, :abs, :abs"));
	primary[0xe7] = Entry::SubTable(e7);

	// 0xE8: file-store.
	let mut e8: Box<[Option<Leaf>; 256]> = Box::new([None; 256]);
	e8[0x01] = Some(leaf("FileStore", Action::Skip, 2, "0x00, :number, :string"));
	e8[0x02] = Some(leaf("PrepFilename", Action::Skip, 0, ""));
	primary[0xe8] = Entry::SubTable(e8);

	primary[0xea] = Entry::Leaf(leaf("EA", Action::Skip, 1, ""));
	primary[0xeb] = Entry::Leaf(leaf("Finish", Action::Skip, 0, ""));
	primary[0xf0] = Entry::Leaf(leaf("Magic88", Action::Skip, 0, ""));

	// 0xF1: start/offset/feeding.
	let mut f1: Box<[Option<Leaf>; 256]> = Box::new([None; 256]);
	f1[0x00] = Some(leaf("Start0", Action::Skip, 1, ""));
	f1[0x01] = Some(leaf("Start1", Action::Skip, 1, ""));
	f1[0x02] = Some(leaf("Start2", Action::Skip, 1, ""));
	f1[0x03] = Some(leaf_lit("Laser2_Offset", Action::LaserOffset, 10, ":abs, :abs", 2));
	f1[0x04] = Some(leaf("Enable_Feeding", Action::Skip, 1, ":bool"));
	primary[0xf1] = Entry::SubTable(f1);

	// 0xF2: secondary bbox/params.
	let mut f2: Box<[Option<Leaf>; 256]> = Box::new([None; 256]);
	f2[0x00] = Some(leaf("F2_00", Action::Skip, 1, ""));
	f2[0x01] = Some(leaf("F2_01", Action::Skip, 1, ""));
	f2[0x02] = Some(leaf("F2_02", Action::Skip, 10, ""));
	f2[0x03] = Some(leaf("F2_03", Action::Skip, 10, ":abs, :abs"));
	f2[0x04] = Some(leaf("Bottom_Right_F2_04", Action::Skip, 10, ":abs, :abs"));
	f2[0x05] = Some(leaf("Bottom_Right_F2_05", Action::Skip, 14, "-4, :abs, :abs"));
	f2[0x06] = Some(leaf("F2_06", Action::Skip, 10, ":abs, :abs"));
	f2[0x07] = Some(leaf("F2_07", Action::Skip, 1, ""));
	primary[0xf2] = Entry::SubTable(f2);

	OpcodeTable { primary }
}

/// The shared, lazily-built opcode table.
pub fn table() -> &'static OpcodeTable {
	static TABLE: OnceLock<OpcodeTable> = OnceLock::new();
	TABLE.get_or_init(build)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn motion_opcodes_resolve() {
		let t = table();
		assert_eq!(t.lookup1(0x88).unwrap().action, Action::MoveAbs);
		assert_eq!(t.lookup1(0xab).unwrap().action, Action::CutVert);
	}

	#[test]
	fn two_level_opcodes_resolve() {
		let t = table();
		assert!(t.has_subtable(0xc6));
		assert_eq!(t.lookup2(0xc6, 0x31).unwrap().literal, Some(1));
		assert_eq!(t.lookup2(0xca, 0x02).unwrap().action, Action::LayerPriority);
	}

	#[test]
	fn z_move_uses_absolute_shaped_argument() {
		let t = table();
		let z = t.lookup2(0xd9, 0x02).unwrap();
		assert_eq!(z.arg_len, 6, "Z relative move should carry a 1+5 byte absolute-shaped argument");
		assert_eq!(z.action, Action::DirectMoveZ);
	}

	#[test]
	fn unknown_opcodes_have_no_entry() {
		let t = table();
		assert!(t.lookup1(0x00).is_none());
		assert!(t.lookup2(0xc6, 0xff).is_none());
	}
}
