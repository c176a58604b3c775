//! Pure wheel geometry: annular sector paths for slices and divider lines,
//! the text-path derived from a slice path, per-slice angle windows, and the
//! color math that picks a readable label color for a slice fill.
//!
//! Angles are in degrees throughout, increasing clockwise in SVG screen
//! space. Slice `i` of `n` occupies `[i * 360/n, (i+1) * 360/n)` in layout
//! order; the marker reads slices in descending index order as the wheel
//! rotation increases, which is handled by the animator, not here.

/// Input to [`annular_sector`].
#[derive(Clone, Copy, Debug)]
pub struct SectorSpec {
    pub center_x: f64,
    pub center_y: f64,
    pub start_degrees: f64,
    pub end_degrees: f64,
    pub inner_radius: f64,
    pub outer_radius: f64,
}

/// A computed annular sector: four corner points plus the arc flags needed to
/// emit an SVG path. Kept structured so the text path can be derived without
/// string surgery.
#[derive(Clone, Debug, PartialEq)]
pub struct SectorPath {
    pub outer_start: (f64, f64),
    pub outer_end: (f64, f64),
    pub inner_end: (f64, f64),
    pub inner_start: (f64, f64),
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub large_arc: bool,
    pub outer_sweep: bool,
    pub inner_sweep: bool,
}

fn polar(cx: f64, cy: f64, r: f64, degrees: f64) -> (f64, f64) {
    let rad = degrees.to_radians();
    (cx + r * rad.cos(), cy + r * rad.sin())
}

/// Compute the closed sector path for one slice (`divider = false`) or one
/// divider line (`divider = true`).
///
/// The outer corners sit on the outer radius, pulled inward from the raw
/// start/end angles by a quarter of the line width so adjacent slices show a
/// gutter; the inner corners are inset by the full line width to clear the
/// hub strokes. When the hub is thinner than the divider strokes
/// (`inner_radius <= line_width`) the sweep directions flip so the path does
/// not self-intersect.
pub fn annular_sector(spec: &SectorSpec, line_width: f64, divider: bool) -> SectorPath {
    let r1 = spec.inner_radius.max(0.0);
    let r2 = spec.outer_radius.max(0.0);
    let (cx, cy) = (spec.center_x, spec.center_y);

    let outer_start = polar(cx, cy, r2, spec.start_degrees + line_width / 4.0);
    let outer_end = polar(cx, cy, r2, spec.end_degrees - line_width / 4.0);
    let inner_end = polar(cx, cy, r1, spec.end_degrees - line_width);
    let inner_start = polar(cx, cy, r1, spec.start_degrees + line_width);

    let span = (spec.end_degrees.to_radians() - spec.start_degrees.to_radians())
        % std::f64::consts::TAU;
    let large_arc = span > std::f64::consts::PI;

    let thin_hub = line_width >= spec.inner_radius;
    let (outer_sweep, inner_sweep) = if divider && thin_hub {
        (false, true)
    } else if !divider && thin_hub {
        (true, true)
    } else {
        (true, false)
    };

    SectorPath {
        outer_start,
        outer_end,
        inner_end,
        inner_start,
        inner_radius: r1,
        outer_radius: r2,
        large_arc,
        outer_sweep,
        inner_sweep,
    }
}

impl SectorPath {
    /// SVG path data for the full closed sector.
    pub fn to_path_data(&self) -> String {
        format!(
            "M{},{} A{},{},0,{},{},{},{} L{},{} A{},{},0,{},{},{},{} z",
            self.outer_start.0,
            self.outer_start.1,
            self.outer_radius,
            self.outer_radius,
            self.large_arc as u8,
            self.outer_sweep as u8,
            self.outer_end.0,
            self.outer_end.1,
            self.inner_end.0,
            self.inner_end.1,
            self.inner_radius,
            self.inner_radius,
            self.large_arc as u8,
            self.inner_sweep as u8,
            self.inner_start.0,
            self.inner_start.1,
        )
    }

    /// Open path used to lay out the slice label: the outer edge of the
    /// sector only. With `follow_arc = false` the x-radius collapses to zero
    /// and the large-arc flag drops, which renders the segment as a straight
    /// chord so horizontal labels do not bend.
    pub fn text_path_data(&self, follow_arc: bool) -> String {
        let rx = if follow_arc { self.outer_radius } else { 0.0 };
        let large_arc = self.large_arc && follow_arc;
        format!(
            "M{},{} A{},{},0,{},{},{},{}",
            self.outer_start.0,
            self.outer_start.1,
            rx,
            self.outer_radius,
            large_arc as u8,
            self.outer_sweep as u8,
            self.outer_end.0,
            self.outer_end.1,
        )
    }
}

// --- Slice angle layout -------------------------------------------------------

/// Angular size of one slice.
pub fn degree_per_slice(slices: usize) -> f64 {
    360.0 / slices as f64
}

/// Wheel-rotation angle at which slice `index` begins passing the marker.
/// Rotation sweeps slices in descending index order, hence the `360 -` form.
pub fn degree_start(index: usize, slices: usize) -> f64 {
    360.0 - degree_per_slice(slices) * index as f64
}

/// Wheel-rotation angle at which slice `index` finishes passing the marker.
pub fn degree_end(index: usize, slices: usize) -> f64 {
    360.0 - (degree_per_slice(slices) * index as f64 + degree_per_slice(slices))
}

/// The angle window a finishing spin may land in for slice `index`. The
/// window is pulled `line_width + 2` degrees inside both edges so the final
/// rotation never stops exactly on a divider line.
pub fn slice_window(index: usize, slices: usize, line_width: f64) -> (f64, f64) {
    let margin = line_width + 2.0;
    (
        degree_start(index, slices) - margin,
        degree_end(index, slices) + margin,
    )
}

// --- Color parsing & contrast -------------------------------------------------

const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("white", [255, 255, 255]),
    ("black", [0, 0, 0]),
    ("red", [255, 0, 0]),
    ("green", [0, 128, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("orange", [255, 165, 0]),
    ("purple", [128, 0, 128]),
    ("pink", [255, 192, 203]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("cyan", [0, 255, 255]),
];

/// Parse a color spec (`#rgb`, `#rrggbb`, `rgb()/rgba()`, or a palette name)
/// into an RGB triple. Returns `None` for anything unparseable.
pub fn parse_color(color: &str) -> Option<[u8; 3]> {
    let c = color.trim().to_ascii_lowercase();
    if c.is_empty() {
        return None;
    }
    if let Some(&(_, rgb)) = NAMED_COLORS.iter().find(|(name, _)| *name == c) {
        return Some(rgb);
    }
    if let Some(rest) = c.strip_prefix("rgb") {
        let inner = rest
            .trim_start_matches('a')
            .trim()
            .strip_prefix('(')?
            .split(')')
            .next()?;
        let mut parts = inner.split(',').map(str::trim);
        let r = parts.next()?.parse::<u16>().ok()?;
        let g = parts.next()?.parse::<u16>().ok()?;
        let b = parts.next()?.parse::<u16>().ok()?;
        if r > 255 || g > 255 || b > 255 {
            return None;
        }
        return Some([r as u8, g as u8, b as u8]);
    }
    if let Some(hex) = c.strip_prefix('#') {
        let digits: Vec<u32> = hex.chars().map(|ch| ch.to_digit(16)).collect::<Option<_>>()?;
        match digits.len() {
            3 => {
                return Some([
                    (digits[0] * 17) as u8,
                    (digits[1] * 17) as u8,
                    (digits[2] * 17) as u8,
                ]);
            }
            n if n >= 6 => {
                return Some([
                    (digits[0] * 16 + digits[1]) as u8,
                    (digits[2] * 16 + digits[3]) as u8,
                    (digits[4] * 16 + digits[5]) as u8,
                ]);
            }
            _ => return None,
        }
    }
    None
}

/// Pick a readable label color for the given slice fill: light text on dark
/// fills, dark text otherwise. Unparseable fills get the dark default.
pub fn contrast_color(fill: &str) -> &'static str {
    match parse_color(fill) {
        Some([r, g, b]) => {
            let luma = (299.0 * r as f64 + 587.0 * g as f64 + 114.0 * b as f64) / 1000.0;
            if luma < 125.0 { "#fff" } else { "#333" }
        }
        None => "#333",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(a: (f64, f64), b: (f64, f64)) -> f64 {
        ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
    }

    fn spec(start: f64, end: f64, inner: f64, outer: f64) -> SectorSpec {
        SectorSpec {
            center_x: 100.0,
            center_y: 100.0,
            start_degrees: start,
            end_degrees: end,
            inner_radius: inner,
            outer_radius: outer,
        }
    }

    #[test]
    fn outer_corners_sit_on_the_outer_radius() {
        for span in [30.0, 90.0, 181.0, 350.0] {
            let p = annular_sector(&spec(0.0, span, 45.0, 95.5), 5.0, false);
            let c = (100.0, 100.0);
            assert!((dist(c, p.outer_start) - 95.5).abs() < 1e-9);
            assert!((dist(c, p.outer_end) - 95.5).abs() < 1e-9);
            assert!((dist(c, p.inner_start) - 45.0).abs() < 1e-9);
        }
    }

    #[test]
    fn large_arc_flag_follows_span() {
        assert!(!annular_sector(&spec(0.0, 180.0, 45.0, 95.0), 5.0, false).large_arc);
        assert!(annular_sector(&spec(0.0, 181.0, 45.0, 95.0), 5.0, false).large_arc);
        assert!(!annular_sector(&spec(0.0, 60.0, 45.0, 95.0), 5.0, false).large_arc);
        // Divider sectors span backwards; never a large arc.
        assert!(!annular_sector(&spec(120.2, 119.8, 45.0, 95.0), 5.0, true).large_arc);
    }

    #[test]
    fn thin_hub_flips_sweep_directions() {
        let normal = annular_sector(&spec(0.0, 90.0, 45.0, 95.0), 5.0, false);
        assert!(normal.outer_sweep && !normal.inner_sweep);

        let slice = annular_sector(&spec(0.0, 90.0, 3.0, 95.0), 5.0, false);
        assert!(slice.outer_sweep && slice.inner_sweep);

        let divider = annular_sector(&spec(90.2, 89.8, 3.0, 95.0), 5.0, true);
        assert!(!divider.outer_sweep && divider.inner_sweep);
    }

    #[test]
    fn negative_radii_clamp_to_zero() {
        let p = annular_sector(&spec(0.0, 90.0, -4.0, 95.0), 5.0, false);
        assert_eq!(p.inner_radius, 0.0);
    }

    #[test]
    fn text_path_is_the_outer_edge_only() {
        let p = annular_sector(&spec(0.0, 90.0, 45.0, 95.0), 5.0, false);
        let flat = p.text_path_data(false);
        assert!(flat.starts_with('M'));
        assert!(flat.contains("A0,"));
        assert!(!flat.contains('L'));
        let arc = p.text_path_data(true);
        assert!(arc.contains("A95,"));
    }

    #[test]
    fn flattened_text_path_drops_the_large_arc_flag() {
        // Two slices: a 200-degree span is a large arc when followed,
        // but the flattened chord must not keep the flag.
        let p = annular_sector(&spec(0.0, 200.0, 45.0, 95.0), 5.0, false);
        assert!(p.large_arc);
        assert!(p.text_path_data(true).contains(",1,"));
        assert!(p.text_path_data(false).contains("A0,95,0,0,"));
    }

    #[test]
    fn slice_windows_stay_inside_divider_margins() {
        // 4 slices, line width 5: margin is 7 degrees either side.
        let (start, end) = slice_window(0, 4, 5.0);
        assert_eq!(start, 353.0);
        assert_eq!(end, 277.0);
        assert_eq!(degree_start(1, 4), 270.0);
        assert_eq!(degree_end(3, 4), 0.0);
    }

    #[test]
    fn color_parsing_covers_all_forms() {
        assert_eq!(parse_color("#fff"), Some([255, 255, 255]));
        assert_eq!(parse_color("#3498db"), Some([52, 152, 219]));
        assert_eq!(parse_color("rgb(1, 2, 3)"), Some([1, 2, 3]));
        assert_eq!(parse_color("rgba(10,20,30,0.5)"), Some([10, 20, 30]));
        assert_eq!(parse_color("ORANGE"), Some([255, 165, 0]));
        assert_eq!(parse_color("blurple"), None);
        assert_eq!(parse_color("#12"), None);
    }

    #[test]
    fn contrast_picks_light_on_dark() {
        assert_eq!(contrast_color("#000000"), "#fff");
        assert_eq!(contrast_color("#ffffff"), "#333");
        assert_eq!(contrast_color("not-a-color"), "#333");
    }
}
