//! Presentation seam between the wheel core and whatever draws it.
//!
//! The core never touches a document: it produces [`SliceShape`] /
//! [`DividerShape`] scene data and drives a [`Renderer`] with rotation and
//! highlight updates. The browser implementation lives in the widget module;
//! tests use a recording stand-in.

use crate::config::{Item, WheelConfig};
use crate::geometry::{self, SectorSpec};

/// The wheel renders in a fixed 200x200 viewBox and scales with CSS; all
/// radii below are viewBox units.
pub const VIEWBOX: f64 = 200.0;
pub const CENTER: f64 = 100.0;

/// Marker arrow pointing down into the wheel from the top edge. Drawn in a
/// small local coordinate box and positioned by the widget.
pub const MARKER_PATH_DATA: &str = "M10,0 L20,12 A16,16,0,0,1,15,19 L10,28 L5,19 A16,16,0,0,1,0,12 z";

/// Half a viewBox unit of bleed keeps the outer stroke inside the viewBox.
pub fn outer_radius(cfg: &WheelConfig) -> f64 {
    CENTER + 0.5 - cfg.outer_line_width
}

/// Everything a backend needs to draw one slice.
#[derive(Clone, Debug, PartialEq)]
pub struct SliceShape {
    pub index: usize,
    pub path_data: String,
    pub text_path_data: String,
    pub fill: String,
    pub label: String,
    pub label_color: String,
    pub font_size: f64,
    pub text_offset: f64,
    pub image: Option<String>,
    /// Midpoint of the slice band; where an item image is centered.
    pub image_anchor: (f64, f64),
}

/// One divider line, drawn as a thin closed sector over a slice boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct DividerShape {
    pub index: usize,
    pub path_data: String,
}

/// Drawing surface the animator talks to. One frame is at most one rotation
/// update, one optional marker update, and one highlight change.
pub trait Renderer {
    fn render_slices(&mut self, slices: &[SliceShape]);
    fn render_dividers(&mut self, dividers: &[DividerShape]);
    /// Absolute wheel rotation in degrees, clockwise.
    fn set_wheel_rotation(&mut self, degrees: f64);
    /// Marker deflection in degrees; `0` is the rest position.
    fn set_marker_rotation(&mut self, degrees: f64);
    /// `None` clears any highlight.
    fn highlight_slice(&mut self, index: Option<usize>);
    /// Replace the label text and color of one already-rendered slice.
    fn render_slice_label(&mut self, index: usize, label: &str, color: &str);
}

fn sector_spec(cfg: &WheelConfig, start: f64, end: f64) -> SectorSpec {
    SectorSpec {
        center_x: CENTER,
        center_y: CENTER,
        start_degrees: start,
        end_degrees: end,
        inner_radius: cfg.center_width,
        outer_radius: outer_radius(cfg),
    }
}

/// Label color for one slice: the configured color, or a contrast-derived
/// one when the config says `"auto"`.
pub fn label_color(cfg: &WheelConfig, item: &Item) -> String {
    if cfg.text_color == "auto" {
        geometry::contrast_color(&item.color).to_string()
    } else {
        cfg.text_color.clone()
    }
}

/// Build the static slice scene for the configured items.
pub fn slice_shapes(cfg: &WheelConfig) -> Vec<SliceShape> {
    let per = geometry::degree_per_slice(cfg.slices());
    cfg.items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let spec = sector_spec(cfg, per * i as f64, per * (i + 1) as f64);
            let path = geometry::annular_sector(&spec, cfg.slice_line_width, false);
            let mid = (per * i as f64 + per / 2.0).to_radians();
            let band = (cfg.center_width + outer_radius(cfg)) / 2.0;
            SliceShape {
                index: i,
                path_data: path.to_path_data(),
                text_path_data: path.text_path_data(cfg.text_arc),
                fill: item.color.clone(),
                label: item.name.clone(),
                label_color: label_color(cfg, item),
                font_size: cfg.font_size,
                text_offset: cfg.text_offset,
                image: item.image.clone(),
                image_anchor: (CENTER + band * mid.cos(), CENTER + band * mid.sin()),
            }
        })
        .collect()
}

/// Build the divider scene: one thin backwards-spanning sector centered on
/// each slice boundary.
pub fn divider_shapes(cfg: &WheelConfig) -> Vec<DividerShape> {
    let per = geometry::degree_per_slice(cfg.slices());
    (0..cfg.slices())
        .map(|i| {
            let boundary = per * (i + 1) as f64;
            let spec = sector_spec(cfg, boundary + 0.2, boundary - 0.2);
            let path = geometry::annular_sector(&spec, cfg.slice_line_width, true);
            DividerShape { index: i, path_data: path.to_path_data() }
        })
        .collect()
}
