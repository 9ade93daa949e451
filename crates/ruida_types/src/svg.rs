//! A minimal SVG sink for inspecting a decoded [`Document`].
//!
//! One `<path>` element per source path, stroke-colored from the owning
//! layer, with a `viewBox` derived from the document's bounding box. No
//! styling beyond stroke color and width, no animation, no embedded raster
//! preview — this exists for visual debugging, not for production output.
//! Grounded in `rd2svg.py`'s hand-assembled `svg.SVG`/`svg.Path` call, which
//! this crate reimplements by hand rather than pulling in a dependency for
//! a handful of XML tags.

use std::fmt::Write as _;

use crate::model::{BBox, Document, Point};

/// Stroke width, in the same user units as the document (millimetres).
const STROKE_WIDTH: f64 = 0.25;

/// Render `doc` as a standalone SVG document.
///
/// Coordinates are copied straight from the model (millimetres, 1 user
/// unit per millimetre); the `viewBox` is padded by a few percent so thin
/// strokes at the extreme edges are not clipped.
pub fn to_svg(doc: &Document) -> String {
	let bbox = doc.bbox.or_else(|| overall_bbox(doc)).unwrap_or(BBox::from_point((0.0, 0.0)));
	let (x0, y0, w, h) = view_box(bbox);

	let mut out = String::new();
	let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
	let _ = writeln!(
		out,
		r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}mm" height="{h}mm" viewBox="{x0} {y0} {w} {h}">"#,
	);

	for layer in &doc.layers {
		let stroke = format!("#{:02x}{:02x}{:02x}", layer.color.r, layer.color.g, layer.color.b);
		for path in &layer.paths {
			if let Some(d) = path_data(path) {
				let _ = writeln!(
					out,
					r#"  <path d="{d}" fill="none" stroke="{stroke}" stroke-width="{STROKE_WIDTH}"/>"#,
				);
			}
		}
	}

	out.push_str("</svg>\n");
	out
}

/// Build an SVG path `d` attribute (`M x,y L x,y ... Z` if closed) from a
/// polyline. `None` for an empty path.
fn path_data(path: &[Point]) -> Option<String> {
	let (first, rest) = path.split_first()?;
	let mut d = format!("M{},{}", first.0, first.1);
	for p in rest {
		let _ = write!(d, " L{},{}", p.0, p.1);
	}
	if path.len() > 1 && path.first() == path.last() {
		d.push_str(" Z");
	}
	Some(d)
}

fn overall_bbox(doc: &Document) -> Option<BBox> {
	doc.layers.iter().filter_map(|l| l.bbox).reduce(BBox::union)
}

/// Pad `bbox` by 2% on each side and return `(x, y, width, height)`.
fn view_box(bbox: BBox) -> (f64, f64, f64, f64) {
	let w = (bbox.max.0 - bbox.min.0).max(1.0);
	let h = (bbox.max.1 - bbox.min.1).max(1.0);
	let pad_x = w * 0.02;
	let pad_y = h * 0.02;
	(bbox.min.0 - pad_x, bbox.min.1 - pad_y, w + 2.0 * pad_x, h + 2.0 * pad_y)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{Color, Layer, Speed};

	#[test]
	fn renders_one_path_per_layer_path() {
		let mut doc = Document::new();
		let mut layer = Layer::new(Speed::scalar(100.0), vec![50.0, 80.0], Color::new(255, 0, 0));
		layer.add_path(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 0.0)]);
		doc.add_layer(layer);
		doc.recompute_bbox();

		let out = to_svg(&doc);
		assert!(out.contains("<svg"));
		assert!(out.contains("stroke=\"#ff0000\""));
		assert!(out.contains("M0,0 L10,0 L10,10 L0,0 Z"));
	}

	#[test]
	fn empty_document_still_renders_a_frame() {
		let doc = Document::new();
		let out = to_svg(&doc);
		assert!(out.starts_with("<?xml"));
		assert!(out.contains("<svg"));
		assert!(out.contains("</svg>"));
	}

	#[test]
	fn open_path_has_no_trailing_z() {
		let path = vec![(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)];
		let d = path_data(&path).unwrap();
		assert_eq!(d, "M0,0 L1,1 L2,0");
	}
}
