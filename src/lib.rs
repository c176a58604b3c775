//! Lucky Wheel core crate.
//!
//! A configurable prize wheel: annular-sector SVG geometry, a
//! scheduler-agnostic spin state machine with eased interpolation and
//! pause/resume, four winner-resolution modes (explicit value, selector
//! sequence, weighted random, bounded retry), nonce-verified remote result
//! sync, and a per-instance spin history.
//!
//! The core modules are plain Rust and test natively; everything that needs
//! a browser (SVG DOM, requestAnimationFrame, fetch) is confined to the
//! `widget` module and the remote transport, both compiled for wasm only.

use wasm_bindgen::prelude::*;

pub mod animator;
pub mod config;
pub mod easing;
pub mod geometry;
pub mod history;
pub(crate) mod log;
pub mod remote;
pub mod render;
pub mod resolver;
pub mod rng;
#[cfg(target_arch = "wasm32")]
pub mod widget;

pub use animator::{Tick, Wheel};
pub use config::{FetchOptions, Item, Selected, WheelConfig};
pub use history::HistoryEntry;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}
