use serde::Serialize;

/// Fraction of the icon size the label anchor sits beyond the icon anchor.
const LABEL_OFFSET_FRACTION: f32 = 0.75;

/// Rendered lines may exceed the wrap limit by this many characters before
/// the ellipsis truncation kicks in.
const TRUNCATE_TOLERANCE: usize = 1;

const ELLIPSIS: char = '\u{2026}';

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Static layout parameters for one wheel instance.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WheelLayout {
    pub center: Point,
    pub inner_radius: f32,
    pub outer_radius: f32,
    /// Angular separation between adjacent sectors, in degrees.
    pub gap_degrees: f32,
    pub icon_size: f32,
    pub max_label_len: usize,
}

impl Default for WheelLayout {
    fn default() -> Self {
        WheelLayout {
            center: Point { x: 250.0, y: 250.0 },
            inner_radius: 90.0,
            outer_radius: 210.0,
            gap_degrees: 2.0,
            icon_size: 42.0,
            max_label_len: 14,
        }
    }
}

impl WheelLayout {
    fn icon_radius(&self) -> f32 {
        (self.inner_radius + self.outer_radius) / 2.0
    }

    pub fn icon_anchor(&self, angle_degrees: f32) -> Point {
        anchor_point(self.center, self.icon_radius(), angle_degrees)
    }

    pub fn label_anchor(&self, angle_degrees: f32) -> Point {
        let radius = self.icon_radius() + self.icon_size * LABEL_OFFSET_FRACTION;
        anchor_point(self.center, radius, angle_degrees)
    }
}

/// Polar to Cartesian. Angles are degrees measured clockwise from twelve
/// o'clock, matching the screen coordinate system of the web surface.
pub fn anchor_point(center: Point, radius: f32, angle_degrees: f32) -> Point {
    let radians = angle_degrees.to_radians();
    Point {
        x: center.x + radius * radians.sin(),
        y: center.y - radius * radians.cos(),
    }
}

fn fmt_coord(value: f32) -> String {
    format!("{value:.3}")
}

fn fmt_point(point: Point) -> String {
    format!("{} {}", fmt_coord(point.x), fmt_coord(point.y))
}

/// Sweeps above half a turn need the SVG large-arc flag. Bounded sector
/// counts keep sweeps below that in practice, but the flag stays correct
/// for any input.
fn large_arc_flag(sweep_degrees: f32) -> u8 {
    if sweep_degrees > 180.0 {
        1
    } else {
        0
    }
}

/// Builds the closed ring-segment outline for one sector as an SVG path.
/// Both radial edges are tightened inward by half the layout gap so
/// adjacent sectors read as separate wedges.
pub fn sector_path(layout: &WheelLayout, start_degrees: f32, end_degrees: f32) -> String {
    let start = start_degrees + layout.gap_degrees / 2.0;
    let end = end_degrees - layout.gap_degrees / 2.0;
    let sweep = end - start;
    let large = large_arc_flag(sweep);

    let outer_start = anchor_point(layout.center, layout.outer_radius, start);
    let outer_end = anchor_point(layout.center, layout.outer_radius, end);
    let inner_end = anchor_point(layout.center, layout.inner_radius, end);
    let inner_start = anchor_point(layout.center, layout.inner_radius, start);

    // Outer arc runs clockwise, inner arc runs back counterclockwise.
    format!(
        "M {m} A {ro} {ro} 0 {large} 1 {oe} L {ie} A {ri} {ri} 0 {large} 0 {is} Z",
        m = fmt_point(outer_start),
        ro = fmt_coord(layout.outer_radius),
        oe = fmt_point(outer_end),
        ie = fmt_point(inner_end),
        ri = fmt_coord(layout.inner_radius),
        is = fmt_point(inner_start),
    )
}

/// Greedy word wrap. Words accumulate into a line while the line plus a
/// joining space fits `max_len`; a single word longer than the limit is
/// hard-split into `max_len` chunks. Deterministic for any input.
pub fn wrap_label(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        for chunk in split_long_word(word, max_len) {
            let needed = if current.is_empty() {
                chunk.chars().count()
            } else {
                current.chars().count() + 1 + chunk.chars().count()
            };
            if needed > max_len && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&chunk);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
        .into_iter()
        .map(|line| truncate_line(line, max_len))
        .collect()
}

fn split_long_word(word: &str, max_len: usize) -> Vec<String> {
    let count = word.chars().count();
    if count <= max_len {
        return vec![word.to_string()];
    }
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(max_len)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn truncate_line(line: String, max_len: usize) -> String {
    if line.chars().count() <= max_len + TRUNCATE_TOLERANCE {
        return line;
    }
    let mut out: String = line.chars().take(max_len.saturating_sub(1)).collect();
    out.push(ELLIPSIS);
    out
}
