//! The in-memory job model: [`Document`], [`Layer`], and decoder-side
//! [`Laser`] state.

/// A point in millimetres.
pub type Point = (f64, f64);

/// An axis-aligned bounding box in millimetres, `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
	/// Top-left (minimum) corner.
	pub min: Point,
	/// Bottom-right (maximum) corner.
	pub max: Point,
}

impl BBox {
	/// A degenerate box around a single point.
	pub fn from_point(p: Point) -> Self {
		BBox { min: p, max: p }
	}

	/// Grow this box, if needed, to contain `p`.
	pub fn extend(&mut self, p: Point) {
		self.min.0 = self.min.0.min(p.0);
		self.min.1 = self.min.1.min(p.1);
		self.max.0 = self.max.0.max(p.0);
		self.max.1 = self.max.1.max(p.1);
	}

	/// Union two boxes.
	pub fn union(a: BBox, b: BBox) -> BBox {
		let mut out = a;
		out.extend(b.min);
		out.extend(b.max);
		out
	}

	/// Build a box from an iterator of points; `None` if empty.
	pub fn from_points<I: IntoIterator<Item = Point>>(points: I) -> Option<BBox> {
		let mut it = points.into_iter();
		let first = it.next()?;
		let mut bbox = BBox::from_point(first);
		for p in it {
			bbox.extend(p);
		}
		Some(bbox)
	}
}

/// Per-layer speed: either a single cut speed (travel implicitly `1000`
/// mm/s) or an explicit `(travel, cut)` pair, both in mm/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speed {
	/// Travel (non-cutting move) speed, mm/s.
	pub travel: f64,
	/// Cutting speed, mm/s.
	pub cut: f64,
}

impl Speed {
	/// Build a `Speed` from a single cut-speed scalar; travel defaults to 1000 mm/s.
	pub fn scalar(cut: f64) -> Self {
		Speed { travel: 1000.0, cut }
	}

	/// Build a `Speed` from an explicit `[travel, cut]` pair.
	pub fn pair(travel: f64, cut: f64) -> Self {
		Speed { travel, cut }
	}
}

/// An RGB preview color, `0..=255` per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
}

impl Color {
	/// Construct a color from components.
	pub const fn new(r: u8, g: u8, b: u8) -> Self {
		Color { r, g, b }
	}
}

impl Default for Color {
	fn default() -> Self {
		Color::new(0, 0, 0)
	}
}

/// A group of polyline paths sharing speed, power, color, and priority.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
	/// Ordered polylines belonging to this layer.
	pub paths: Vec<Vec<Point>>,
	/// Travel/cut speed.
	pub speed: Speed,
	/// 2 to 8 power percentages `[min1, max1, min2, max2, ...]`, normalized to 8.
	pub power: Vec<f64>,
	/// Preview color.
	pub color: Color,
	/// Layer-local bounding box, if known.
	pub bbox: Option<BBox>,
	/// Pulse frequency, kHz.
	pub freq: f64,
}

impl Layer {
	/// Default pulse frequency, kHz, matching the controller's default.
	pub const DEFAULT_FREQ_KHZ: f64 = 20.0;

	/// Construct an empty layer with the given speed and power, normalizing
	/// `power` up to 8 entries by repeating its final pair.
	pub fn new(speed: Speed, power: Vec<f64>, color: Color) -> Self {
		Layer { paths: Vec::new(), speed, power: normalize_power(power), color, bbox: None, freq: Self::DEFAULT_FREQ_KHZ }
	}

	/// Add a path (polyline) to this layer, updating its cached bbox.
	pub fn add_path(&mut self, path: Vec<Point>) {
		if let Some(bbox) = BBox::from_points(path.iter().copied()) {
			self.bbox = Some(match self.bbox {
				Some(existing) => BBox::union(existing, bbox),
				None => bbox,
			});
		}
		self.paths.push(path);
	}
}

/// Pad or truncate a power list to exactly 8 entries by repeating the last
/// pair, per the documented invariant (`len(power)` even, `<= 8`).
fn normalize_power(mut power: Vec<f64>) -> Vec<f64> {
	assert!(!power.is_empty() && power.len() % 2 == 0 && power.len() <= 8, "power list must be a non-empty, even-length sequence of at most 8 percentages");
	while power.len() < 8 {
		let last_pair_start = power.len() - 2;
		let (min, max) = (power[last_pair_start], power[last_pair_start + 1]);
		power.push(min);
		power.push(max);
	}
	power
}

/// Decoder-side laser state: global lasers and per-layer laser entries
/// coexist under the same representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Laser {
	/// Laser index, `1..=4`.
	pub n: u8,
	/// XY offset from the primary laser, millimetres.
	pub offset: Point,
	/// Pulse frequency, kHz, if set.
	pub freq: Option<f64>,
	/// Minimum power percentage, if set.
	pub min_pow: Option<f64>,
	/// Maximum power percentage, if set.
	pub max_pow: Option<f64>,
	/// The layer this entry is scoped to, or `None` for a global laser.
	pub layer: Option<usize>,
}

impl Laser {
	/// A fresh, unconfigured laser entry.
	pub fn new(n: u8, layer: Option<usize>) -> Self {
		Laser { n, offset: (0.0, 0.0), freq: None, min_pow: None, max_pow: None, layer }
	}
}

/// The top-level job representation: an ordered sequence of layers plus
/// overall bounding box and odometer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
	/// Layers, in wire order; index is the layer number.
	pub layers: Vec<Layer>,
	/// Overall bounding box, if known.
	pub bbox: Option<BBox>,
	/// Global and per-layer laser state observed/declared.
	pub lasers: Vec<Laser>,
	/// `(cut_distance_mm, travel_distance_mm)`.
	pub odometer: (f64, f64),
}

impl Document {
	/// An empty document.
	pub fn new() -> Self {
		Document::default()
	}

	/// Append a layer, returning its index (the layer number used on the wire).
	pub fn add_layer(&mut self, layer: Layer) -> usize {
		self.layers.push(layer);
		self.layers.len() - 1
	}

	/// Recompute `bbox` as the union of all layer bounding boxes.
	pub fn recompute_bbox(&mut self) {
		self.bbox = self.layers.iter().filter_map(|l| l.bbox).reduce(BBox::union);
	}

	/// Recompute `odometer` from path geometry: cut distance is the sum of
	/// the length of every path segment; travel distance is the sum of the
	/// "jump" from the end of one path to the start of the next, within and
	/// across layers, in emission order.
	pub fn recompute_odometer(&mut self) {
		let mut cut = 0.0;
		let mut travel = 0.0;
		let mut cursor: Option<Point> = None;
		for layer in &self.layers {
			for path in &layer.paths {
				if let Some(first) = path.first().copied() {
					if let Some(from) = cursor {
						travel += dist(from, first);
					}
					let mut prev = first;
					for &p in path.iter().skip(1) {
						cut += dist(prev, p);
						prev = p;
					}
					cursor = Some(prev);
				}
			}
		}
		self.odometer = (cut, travel);
	}
}

fn dist(a: Point, b: Point) -> f64 {
	let dx = b.0 - a.0;
	let dy = b.1 - a.1;
	(dx * dx + dy * dy).sqrt()
}
