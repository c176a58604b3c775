//! The spin state machine.
//!
//! A [`Wheel`] owns the validated config, the single mutable [`SpinState`],
//! the history log, and the host callbacks. It is scheduler-agnostic: the
//! host (the WASM widget, or a test loop) calls [`Wheel::tick`] with a
//! timestamp once per animation frame, and the wheel reports whether it is
//! still running. All state transitions happen inside that single call
//! chain, so no locking is involved.

use serde_json::Value;

use crate::config::{Item, WheelConfig};
use crate::easing::Easing;
use crate::geometry;
use crate::history::{HistoryEntry, HistoryTracker};
use crate::resolver;
use crate::rng::{self, UniformSource};

/// Marker deflection at the bounce peak, in degrees.
const MARKER_DEFLECTION: f64 = -38.0;
/// Unit count the per-slice progress percentages are computed in.
const PROGRESS_UNITS: f64 = 1600.0;

/// Host-supplied lifecycle callbacks. All optional, all synchronous.
#[derive(Default)]
pub struct Callbacks {
    /// Returning `false` vetoes the spin.
    pub before_spin: Option<Box<dyn FnMut(u32) -> bool>>,
    pub start: Option<Box<dyn FnMut(&Item, u32, f64)>>,
    pub step: Option<Box<dyn FnMut(&Item, f64, f64)>>,
    pub progress: Option<Box<dyn FnMut(f64, f64)>>,
    pub complete: Option<Box<dyn FnMut(&Item, u32, f64)>>,
    pub fail: Option<Box<dyn FnMut(Option<&Item>, u32, f64)>>,
}

/// Secondary marker-bounce animation: independently scheduled, fixed target
/// deflection, self-terminating.
#[derive(Clone, Copy, Debug)]
struct MarkerBounce {
    start_time: f64,
    duration: f64,
}

/// Mutable per-instance spin state. `in_progress` is the sole
/// mutual-exclusion guard: while true, every spin-start request is a no-op.
#[derive(Clone, Debug)]
pub struct SpinState {
    pub in_progress: bool,
    pub is_paused: bool,
    pub target_slice: Option<usize>,
    pub start_angle: f64,
    pub target_angle: f64,
    pub start_time: f64,
    pub elapsed_at_pause: f64,
    pub duration: f64,
    /// Display rotation, normalized mod 360 (sign-preserving for reverse).
    pub current_angle: f64,
    /// Spins started; the spin ordinal reported to callbacks.
    pub spin_count: u32,
    /// Spins that ran to completion.
    pub completed_count: u32,
    /// Deterministic-sequence cursor (advances on start and on retry).
    pub reset_count: u32,
    current_slice: usize,
    last_step: i64,
    marker: Option<MarkerBounce>,
}

impl SpinState {
    fn new(slices: usize) -> SpinState {
        SpinState {
            in_progress: false,
            is_paused: false,
            target_slice: None,
            start_angle: 0.0,
            target_angle: 0.0,
            start_time: 0.0,
            elapsed_at_pause: 0.0,
            duration: 0.0,
            current_angle: 0.0,
            spin_count: 0,
            completed_count: 0,
            reset_count: 0,
            current_slice: slices.saturating_sub(1),
            last_step: -1,
            marker: None,
        }
    }
}

/// Outcome of one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Nothing running; the scheduler can stop.
    Idle,
    Paused,
    Running,
    /// The spin just finished on this tick.
    Complete,
}

/// One prize wheel instance.
pub struct Wheel {
    config: WheelConfig,
    state: SpinState,
    history: HistoryTracker,
    callbacks: Callbacks,
    rand: UniformSource,
    last_result: Option<Item>,
    /// Epoch counter; bumped on cancel/reset so stale remote continuations
    /// can detect they have been superseded.
    generation: u64,
}

impl Wheel {
    pub fn new(config: WheelConfig) -> Wheel {
        let config = config.validated();
        let slices = config.slices();
        let history = HistoryTracker::new(config.history_capacity);
        Wheel {
            config,
            state: SpinState::new(slices),
            history,
            callbacks: Callbacks::default(),
            rand: rng::entropy_source(),
            last_result: None,
            generation: 0,
        }
    }

    /// Replace the uniform `[0, 1)` source (tests, host-driven determinism).
    pub fn with_random_source(mut self, rand: UniformSource) -> Wheel {
        self.rand = rand;
        self
    }

    pub fn config(&self) -> &WheelConfig {
        &self.config
    }

    pub fn state(&self) -> &SpinState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_result(&self) -> Option<&Item> {
        self.last_result.as_ref()
    }

    /// Slice the marker currently points at.
    pub fn current_slice(&self) -> usize {
        self.state.current_slice
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.all()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Post-construction reconfiguration, restricted to the allowlist
    /// (`easing`, `duration`, `rotates`, `max`).
    pub fn set_option(&mut self, key: &str, value: &Value) -> bool {
        self.config.set_option(key, value)
    }

    // --- Callback registration -------------------------------------------

    pub fn on_before_spin(&mut self, f: impl FnMut(u32) -> bool + 'static) {
        self.callbacks.before_spin = Some(Box::new(f));
    }

    pub fn on_start(&mut self, f: impl FnMut(&Item, u32, f64) + 'static) {
        self.callbacks.start = Some(Box::new(f));
    }

    pub fn on_step(&mut self, f: impl FnMut(&Item, f64, f64) + 'static) {
        self.callbacks.step = Some(Box::new(f));
    }

    pub fn on_progress(&mut self, f: impl FnMut(f64, f64) + 'static) {
        self.callbacks.progress = Some(Box::new(f));
    }

    pub fn on_complete(&mut self, f: impl FnMut(&Item, u32, f64) + 'static) {
        self.callbacks.complete = Some(Box::new(f));
    }

    pub fn on_fail(&mut self, f: impl FnMut(Option<&Item>, u32, f64) + 'static) {
        self.callbacks.fail = Some(Box::new(f));
    }

    // --- Spin entry points ------------------------------------------------

    /// Start a locally-resolved spin (explicit-index policy, selector
    /// sequence, or weighted random). Returns whether a spin started; a
    /// resolution miss or a vetoed/capped/busy request is a silent no-op.
    pub fn spin(&mut self, now: f64) -> bool {
        if self.state.in_progress || !self.veto_check() {
            return false;
        }
        if self.config.max != 0 && self.state.spin_count >= self.config.max {
            return false;
        }
        let slice = resolver::resolve_local(&self.config, &mut self.state.reset_count, &mut self.rand);
        match slice {
            Some(id) => {
                self.begin(id, now);
                true
            }
            None => false,
        }
    }

    /// Start a spin toward an explicitly dictated winner value (remote
    /// responses, programmatic winners). No spin starts when the value
    /// resolves to no slice.
    pub fn spin_to(&mut self, value: &Value, now: f64) -> bool {
        if self.state.in_progress || !self.veto_check() {
            return false;
        }
        match resolver::find_winner(&self.config.items, self.config.selector.as_deref(), value) {
            Some(id) => {
                self.begin(id, now);
                true
            }
            None => false,
        }
    }

    /// Remote envelopes may reconfigure the selector field and the
    /// deterministic target before the explicit resolve.
    pub fn reconfigure_selector(&mut self, selector: Option<String>, winner: &Value) {
        self.config.selector = selector;
        self.config.selected = crate::config::Selected::Sequence(vec![winner.clone()]);
    }

    /// Route a failed remote round-trip to the failure callback.
    pub fn fail(&mut self) {
        let (ordinal, angle) = (self.state.spin_count, self.state.current_angle);
        let last = self.last_result.clone();
        if let Some(cb) = self.callbacks.fail.as_mut() {
            cb(last.as_ref(), ordinal, angle);
        }
    }

    fn veto_check(&mut self) -> bool {
        let ordinal = self.state.spin_count;
        match self.callbacks.before_spin.as_mut() {
            Some(cb) => cb(ordinal),
            None => true,
        }
    }

    fn begin(&mut self, slice_id: usize, now: f64) {
        let result = self.config.items[slice_id].clone();
        self.last_result = Some(result.clone());

        if let Some(cb) = self.callbacks.start.as_mut() {
            cb(&result, self.state.spin_count, self.state.current_angle);
        }

        let slices = self.config.slices();
        let (win_start, win_end) =
            geometry::slice_window(slice_id, slices, self.config.slice_line_width);
        let landing = rng::ranged_int((self.rand)(), win_start, win_end) as f64;
        let rotates = self.config.spin_rotates((self.rand)());
        let direction = if self.config.reverse { -1.0 } else { 1.0 };

        self.state.in_progress = true;
        self.state.is_paused = false;
        self.state.target_slice = Some(slice_id);
        self.state.start_angle = self.state.current_angle;
        self.state.target_angle = direction * (360.0 * rotates as f64 + landing);
        self.state.duration = self.config.spin_duration((self.rand)()).max(1.0);
        self.state.start_time = now;
        self.state.elapsed_at_pause = 0.0;
        self.state.last_step = -1;
        self.state.marker = None;

        self.state.spin_count += 1;
        self.state.reset_count += 1;
    }

    // --- Animation loop ---------------------------------------------------

    /// Advance the animation to `now`. Fires progress every tick, step on
    /// each slice crossing, and complete exactly once when the eased
    /// interpolation reaches its target.
    pub fn tick(&mut self, now: f64) -> Tick {
        if !self.state.in_progress {
            return Tick::Idle;
        }
        if self.state.is_paused {
            return Tick::Paused;
        }

        let elapsed = (now - self.state.start_time).min(self.state.duration);
        let progress = elapsed / self.state.duration;
        let eased = self.config.easing_curve().eval(elapsed, self.state.duration);
        let angle =
            self.state.start_angle + (self.state.target_angle - self.state.start_angle) * eased;
        self.state.current_angle = angle % 360.0;

        let slices = self.config.slices();
        let per_slice = geometry::degree_per_slice(slices);
        let step = (angle / per_slice).floor() as i64;
        // Increasing rotation sweeps slices in descending index order.
        self.state.current_slice = slices - 1 - step.rem_euclid(slices as i64) as usize;

        let norm = angle.rem_euclid(360.0);
        let unit = PROGRESS_UNITS / slices as f64;
        let circle_percent = norm / 360.0 * 100.0;
        let slice_percent = ((self.state.current_slice as f64 + 1.0) * unit
            - (PROGRESS_UNITS - PROGRESS_UNITS / 360.0 * norm))
            / unit
            * 100.0;

        if let Some(cb) = self.callbacks.progress.as_mut() {
            cb(slice_percent, circle_percent);
        }

        if self.state.last_step != step {
            self.state.last_step = step;
            if self.config.marker_animation {
                self.state.marker = Some(MarkerBounce {
                    start_time: now,
                    duration: (self.config.duration / slices as f64 / 2.0).max(1.0),
                });
            }
            let current = self.config.items[self.state.current_slice].clone();
            if let Some(cb) = self.callbacks.step.as_mut() {
                cb(&current, slice_percent, circle_percent);
            }
        }

        if progress >= 1.0 {
            self.state.in_progress = false;
            self.state.completed_count += 1;
            if let Some(result) = self.last_result.clone() {
                self.history.add(result.clone(), now, self.state.spin_count);
                let (ordinal, angle) = (self.state.spin_count, self.state.current_angle);
                if let Some(cb) = self.callbacks.complete.as_mut() {
                    cb(&result, ordinal, angle);
                }
            }
            return Tick::Complete;
        }
        Tick::Running
    }

    /// Current marker deflection for the bounce animation, in degrees.
    /// Returns 0 once the bounce has run out.
    pub fn marker_angle(&mut self, now: f64) -> f64 {
        match self.state.marker {
            Some(m) => {
                let progress = ((now - m.start_time) / m.duration).min(1.0);
                if progress >= 1.0 {
                    self.state.marker = None;
                    return 0.0;
                }
                MARKER_DEFLECTION * Easing::MarkerBounce.eval(progress, 1.0)
            }
            None => 0.0,
        }
    }

    // --- Pause / resume / cancel -----------------------------------------

    /// Freeze wall-clock progress. Valid only while spinning and not already
    /// paused.
    pub fn pause(&mut self, now: f64) -> bool {
        if !self.state.in_progress || self.state.is_paused {
            return false;
        }
        self.state.elapsed_at_pause = now - self.state.start_time;
        self.state.is_paused = true;
        true
    }

    /// Resume a paused spin. The start time is re-baselined so the elapsed
    /// time continues from the value banked at pause; paused wall-clock
    /// never counts toward the duration.
    pub fn resume(&mut self, now: f64) -> bool {
        if !self.state.in_progress || !self.state.is_paused {
            return false;
        }
        self.state.start_time = now - self.state.elapsed_at_pause;
        self.state.is_paused = false;
        true
    }

    /// Cancel the running animation. Fires no callbacks and leaves the
    /// already-applied rotation in place.
    pub fn finish(&mut self) {
        self.state.in_progress = false;
        self.state.is_paused = false;
        self.state.marker = None;
        self.generation += 1;
    }

    /// Tear the instance back to its post-construction state.
    pub fn reset(&mut self) {
        self.finish();
        self.state = SpinState::new(self.config.slices());
        self.history.clear();
        self.last_result = None;
    }
}
