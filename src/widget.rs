//! Browser front-end: SVG construction, the animation-frame loop, and the
//! JS-facing API exported through wasm-bindgen.
//!
//! All wheel logic lives in [`crate::animator`]; this module only feeds it
//! timestamps, mirrors its state into the DOM, and bridges JS callbacks.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::Function;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element};

use crate::animator::{Tick, Wheel};
use crate::config::{Item, WheelConfig};
use crate::log;
use crate::remote::{self, Outcome};
use crate::render::{self, DividerShape, Renderer, SliceShape};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

thread_local! {
    // Distinguishes textPath ids when several wheels share a page.
    static NEXT_WIDGET_ID: Cell<u32> = const { Cell::new(0) };
}

fn now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

fn item_to_js(item: &Item) -> JsValue {
    serde_json::to_string(item)
        .ok()
        .and_then(|s| js_sys::JSON::parse(&s).ok())
        .unwrap_or(JsValue::NULL)
}

// --- SVG renderer -------------------------------------------------------------

struct SvgRenderer {
    document: Document,
    root: Element,
    wheel_group: Element,
    marker_group: Element,
    slice_paths: Vec<Element>,
    /// Per slice: the text element and its textPath child.
    labels: Vec<(Element, Element)>,
    widget_id: u32,
    highlighted: Option<usize>,
}

impl SvgRenderer {
    fn build(document: Document, container: &Element, cfg: &WheelConfig) -> Result<SvgRenderer, JsValue> {
        let widget_id = NEXT_WIDGET_ID.with(|c| {
            let id = c.get();
            c.set(id + 1);
            id
        });

        let el = |name: &str| document.create_element_ns(Some(SVG_NS), name);

        let root = el("svg")?;
        root.set_attribute("class", "lucky-wheel")?;
        root.set_attribute("viewBox", &format!("0 0 {} {}", render::VIEWBOX, render::VIEWBOX))?;
        root.set_attribute("width", &cfg.width.to_string())?;
        root.set_attribute("height", &cfg.width.to_string())?;

        let wheel_group = el("g")?;
        wheel_group.set_attribute("class", "lucky-wheel-slices")?;
        root.append_child(&wheel_group)?;

        let ring = el("circle")?;
        ring.set_attribute("cx", &render::CENTER.to_string())?;
        ring.set_attribute("cy", &render::CENTER.to_string())?;
        ring.set_attribute(
            "r",
            &(render::outer_radius(cfg) + cfg.outer_line_width / 2.0).to_string(),
        )?;
        ring.set_attribute("fill", "none")?;
        ring.set_attribute("stroke", &cfg.outer_line_color)?;
        ring.set_attribute("stroke-width", &cfg.outer_line_width.to_string())?;
        root.append_child(&ring)?;

        let hub = el("circle")?;
        hub.set_attribute("cx", &render::CENTER.to_string())?;
        hub.set_attribute("cy", &render::CENTER.to_string())?;
        hub.set_attribute("r", &cfg.center_width.to_string())?;
        hub.set_attribute("fill", &cfg.center_background)?;
        hub.set_attribute("stroke", &cfg.center_line_color)?;
        hub.set_attribute("stroke-width", &cfg.center_line_width.to_string())?;
        root.append_child(&hub)?;

        let marker_group = el("g")?;
        marker_group.set_attribute("class", "lucky-wheel-marker")?;
        let marker = el("path")?;
        marker.set_attribute("d", render::MARKER_PATH_DATA)?;
        marker.set_attribute("fill", &cfg.marker_color)?;
        marker_group.append_child(&marker)?;
        marker_group.set_attribute("transform", "translate(90,0)")?;
        root.append_child(&marker_group)?;

        container.append_child(&root)?;

        Ok(SvgRenderer {
            document,
            root,
            wheel_group,
            marker_group,
            slice_paths: Vec::new(),
            labels: Vec::new(),
            widget_id,
            highlighted: None,
        })
    }

    fn text_path_id(&self, index: usize) -> String {
        format!("lucky-wheel-{}-label-{}", self.widget_id, index)
    }

    fn remove(&self) {
        self.root.remove();
    }
}

impl Renderer for SvgRenderer {
    fn render_slices(&mut self, slices: &[SliceShape]) {
        for path in &self.slice_paths {
            path.remove();
        }
        for (text, _) in &self.labels {
            text.remove();
        }
        self.slice_paths.clear();
        self.labels.clear();
        let el = |name: &str| self.document.create_element_ns(Some(SVG_NS), name);
        for shape in slices {
            let Ok(path) = el("path") else { continue };
            path.set_attribute("d", &shape.path_data).ok();
            path.set_attribute("fill", &shape.fill).ok();
            self.wheel_group.append_child(&path).ok();
            self.slice_paths.push(path);

            if let Ok(guide) = el("path") {
                guide.set_attribute("id", &self.text_path_id(shape.index)).ok();
                guide.set_attribute("d", &shape.text_path_data).ok();
                guide.set_attribute("fill", "none").ok();
                self.wheel_group.append_child(&guide).ok();
            }
            if let Ok(text) = el("text") {
                text.set_attribute("font-size", &shape.font_size.to_string()).ok();
                text.set_attribute("fill", &shape.label_color).ok();
                text.set_attribute("dy", &shape.text_offset.to_string()).ok();
                if let Ok(text_path) = el("textPath") {
                    text_path
                        .set_attribute("href", &format!("#{}", self.text_path_id(shape.index)))
                        .ok();
                    text_path.set_attribute("startOffset", "50%").ok();
                    text_path.set_attribute("text-anchor", "middle").ok();
                    text_path.set_text_content(Some(&shape.label));
                    text.append_child(&text_path).ok();
                    self.labels.push((text.clone(), text_path));
                }
                self.wheel_group.append_child(&text).ok();
            }
            if let Some(href) = &shape.image {
                if let Ok(image) = el("image") {
                    image.set_attribute("href", href).ok();
                    image.set_attribute("width", "20").ok();
                    image.set_attribute("height", "20").ok();
                    image.set_attribute("x", &(shape.image_anchor.0 - 10.0).to_string()).ok();
                    image.set_attribute("y", &(shape.image_anchor.1 - 10.0).to_string()).ok();
                    self.wheel_group.append_child(&image).ok();
                }
            }
        }
    }

    fn render_dividers(&mut self, dividers: &[DividerShape]) {
        let el = |name: &str| self.document.create_element_ns(Some(SVG_NS), name);
        for shape in dividers {
            let Ok(path) = el("path") else { continue };
            path.set_attribute("d", &shape.path_data).ok();
            path.set_attribute("class", "lucky-wheel-divider").ok();
            self.wheel_group.append_child(&path).ok();
        }
    }

    fn set_wheel_rotation(&mut self, degrees: f64) {
        self.wheel_group
            .set_attribute(
                "transform",
                &format!("rotate({degrees},{},{})", render::CENTER, render::CENTER),
            )
            .ok();
    }

    fn set_marker_rotation(&mut self, degrees: f64) {
        // Pivot sits at the marker tip in its local 20x28 box.
        self.marker_group
            .set_attribute("transform", &format!("translate(90,0) rotate({degrees},10,6)"))
            .ok();
    }

    fn highlight_slice(&mut self, index: Option<usize>) {
        if let Some(old) = self.highlighted.take() {
            if let Some(path) = self.slice_paths.get(old) {
                path.remove_attribute("stroke").ok();
                path.remove_attribute("stroke-width").ok();
            }
        }
        if let Some(new) = index {
            if let Some(path) = self.slice_paths.get(new) {
                path.set_attribute("stroke", "#fff").ok();
                path.set_attribute("stroke-width", "2").ok();
                self.highlighted = Some(new);
            }
        }
    }

    fn render_slice_label(&mut self, index: usize, label: &str, color: &str) {
        if let Some((text, text_path)) = self.labels.get(index) {
            text.set_attribute("fill", color).ok();
            text_path.set_text_content(Some(label));
        }
    }
}

// --- Widget -------------------------------------------------------------------

struct Inner {
    wheel: Wheel,
    renderer: SvgRenderer,
    loop_running: bool,
    destroyed: bool,
}

impl Inner {
    fn apply_frame(&mut self, ts: f64) -> Tick {
        let outcome = self.wheel.tick(ts);
        self.renderer.set_wheel_rotation(self.wheel.state().current_angle);
        let marker = self.wheel.marker_angle(ts);
        self.renderer.set_marker_rotation(marker);
        if outcome == Tick::Complete {
            let landed = self.wheel.current_slice();
            self.renderer.highlight_slice(Some(landed));
        }
        outcome
    }
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn start_loop(inner: Rc<RefCell<Inner>>) {
    {
        let mut s = inner.borrow_mut();
        if s.loop_running {
            return;
        }
        s.loop_running = true;
    }
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        let keep_going = {
            let mut s = inner.borrow_mut();
            if s.destroyed {
                s.loop_running = false;
                false
            } else {
                // Paused unwinds the loop; resume() schedules a fresh one.
                matches!(s.apply_frame(ts), Tick::Running)
            }
        };
        if keep_going {
            if let Some(w) = web_sys::window() {
                let _ = w.request_animation_frame(f.borrow().as_ref().unwrap().as_ref().unchecked_ref());
            }
        } else {
            inner.borrow_mut().loop_running = false;
        }
    }) as Box<dyn FnMut(f64)>));
    if let Some(w) = web_sys::window() {
        let _ = w.request_animation_frame(g.borrow().as_ref().unwrap().as_ref().unchecked_ref());
    }
}

/// One wheel mounted into a container element.
#[wasm_bindgen]
pub struct LuckyWheel {
    inner: Rc<RefCell<Inner>>,
}

#[wasm_bindgen]
impl LuckyWheel {
    /// Mount a wheel into the first element matching `selector`. Fails when
    /// the document has no such element; an unparseable option bag falls back
    /// to defaults instead of failing.
    #[wasm_bindgen(constructor)]
    pub fn new(selector: &str, options: JsValue) -> Result<LuckyWheel, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
        let container = document
            .query_selector(selector)?
            .ok_or_else(|| JsValue::from_str(&format!("no element matches \"{selector}\"")))?;

        let config = if options.is_undefined() || options.is_null() {
            WheelConfig::default()
        } else {
            let json = js_sys::JSON::stringify(&options)
                .ok()
                .and_then(|s| s.as_string())
                .unwrap_or_default();
            WheelConfig::from_json(&json)
        };

        let mut renderer = SvgRenderer::build(document, &container, &config)?;
        renderer.render_slices(&render::slice_shapes(&config));
        renderer.render_dividers(&render::divider_shapes(&config));

        let wheel = Wheel::new(config);
        let inner = Inner { wheel, renderer, loop_running: false, destroyed: false };
        Ok(LuckyWheel { inner: Rc::new(RefCell::new(inner)) })
    }

    /// Start a spin. Remote-configured wheels ask the service for the winner
    /// first; everything else resolves locally. A busy, vetoed, capped, or
    /// unresolvable request is a no-op.
    pub fn start(&self) {
        let busy = {
            let s = self.inner.borrow();
            s.destroyed || s.wheel.state().in_progress
        };
        if busy {
            return;
        }
        let fetch = self.inner.borrow().wheel.config().fetch_options.clone();
        match fetch {
            Some(opts) => self.start_remote(opts),
            None => {
                let started = {
                    let mut s = self.inner.borrow_mut();
                    s.renderer.highlight_slice(None);
                    s.wheel.spin(now())
                };
                if started {
                    start_loop(self.inner.clone());
                }
            }
        }
    }

    fn start_remote(&self, opts: crate::config::FetchOptions) {
        let inner = self.inner.clone();
        let (request, generation) = {
            let s = inner.borrow();
            let last = if s.wheel.state().spin_count == 0 {
                None
            } else {
                s.wheel.last_result().cloned()
            };
            (remote::prepare_request(&opts, last.as_ref()), s.wheel.generation())
        };
        spawn_local(async move {
            let envelope = remote::fetch_envelope(&request).await;
            let started = {
                let mut s = inner.borrow_mut();
                // A finish/reset/destroy while the request was in flight
                // supersedes this response.
                if s.destroyed || s.wheel.generation() != generation {
                    return;
                }
                match envelope {
                    Err(err) => {
                        log::warn(&format!("wheel result request failed: {err:?}"));
                        s.wheel.fail();
                        false
                    }
                    Ok(env) => match remote::interpret(&env, request.nonce.as_deref()) {
                        Outcome::NonceMismatch => {
                            log::warn("wheel result rejected: nonce mismatch");
                            s.wheel.fail();
                            false
                        }
                        Outcome::Stop => false,
                        Outcome::Winner { value, selector } => {
                            if selector.is_some() {
                                s.wheel.reconfigure_selector(selector, &value);
                            }
                            s.renderer.highlight_slice(None);
                            let ok = s.wheel.spin_to(&value, now());
                            if !ok {
                                s.wheel.fail();
                            }
                            ok
                        }
                    },
                }
            };
            if started {
                start_loop(inner);
            }
        });
    }

    /// Spin toward an explicit winner value, bypassing any remote setup.
    #[wasm_bindgen(js_name = spinTo)]
    pub fn spin_to(&self, value: JsValue) -> bool {
        let Some(value) = js_sys::JSON::stringify(&value)
            .ok()
            .and_then(|s| s.as_string())
            .and_then(|s| serde_json::from_str(&s).ok())
        else {
            return false;
        };
        let started = {
            let mut s = self.inner.borrow_mut();
            if s.destroyed {
                return false;
            }
            s.renderer.highlight_slice(None);
            s.wheel.spin_to(&value, now())
        };
        if started {
            start_loop(self.inner.clone());
        }
        started
    }

    pub fn pause(&self) -> bool {
        self.inner.borrow_mut().wheel.pause(now())
    }

    pub fn resume(&self) -> bool {
        let resumed = self.inner.borrow_mut().wheel.resume(now());
        if resumed {
            start_loop(self.inner.clone());
        }
        resumed
    }

    /// Cancel the running animation in place. No completion fires.
    pub fn finish(&self) {
        self.inner.borrow_mut().wheel.finish();
    }

    /// Back to the post-construction state: no rotation, empty history.
    pub fn reset(&self) {
        let mut s = self.inner.borrow_mut();
        s.wheel.reset();
        s.renderer.highlight_slice(None);
        s.renderer.set_wheel_rotation(0.0);
        s.renderer.set_marker_rotation(0.0);
    }

    /// Unmount the widget. Every later call on this handle is a no-op.
    pub fn destroy(&self) {
        let mut s = self.inner.borrow_mut();
        s.destroyed = true;
        s.wheel.finish();
        s.renderer.remove();
    }

    #[wasm_bindgen(js_name = setOption)]
    pub fn set_option(&self, key: &str, value: JsValue) -> bool {
        let Some(value) = js_sys::JSON::stringify(&value)
            .ok()
            .and_then(|s| s.as_string())
            .and_then(|s| serde_json::from_str(&s).ok())
        else {
            return false;
        };
        self.inner.borrow_mut().wheel.set_option(key, &value)
    }

    /// Register a lifecycle callback. Events: `beforeSpin` (return `false`
    /// to veto), `start`, `step`, `progress`, `complete`, `fail`.
    pub fn on(&self, event: &str, callback: Function) -> bool {
        let mut s = self.inner.borrow_mut();
        match event {
            "beforeSpin" => s.wheel.on_before_spin(move |ordinal| {
                callback
                    .call1(&JsValue::NULL, &JsValue::from_f64(ordinal as f64))
                    .map(|v| v.is_truthy() || v.is_undefined())
                    .unwrap_or(true)
            }),
            "start" => s.wheel.on_start(move |item, ordinal, angle| {
                let _ = callback.call3(
                    &JsValue::NULL,
                    &item_to_js(item),
                    &JsValue::from_f64(ordinal as f64),
                    &JsValue::from_f64(angle),
                );
            }),
            "step" => s.wheel.on_step(move |item, slice_pct, circle_pct| {
                let _ = callback.call3(
                    &JsValue::NULL,
                    &item_to_js(item),
                    &JsValue::from_f64(slice_pct),
                    &JsValue::from_f64(circle_pct),
                );
            }),
            "progress" => s.wheel.on_progress(move |slice_pct, circle_pct| {
                let _ = callback.call2(
                    &JsValue::NULL,
                    &JsValue::from_f64(slice_pct),
                    &JsValue::from_f64(circle_pct),
                );
            }),
            "complete" => s.wheel.on_complete(move |item, ordinal, angle| {
                let _ = callback.call3(
                    &JsValue::NULL,
                    &item_to_js(item),
                    &JsValue::from_f64(ordinal as f64),
                    &JsValue::from_f64(angle),
                );
            }),
            "fail" => s.wheel.on_fail(move |item, ordinal, angle| {
                let last = item.map(item_to_js).unwrap_or(JsValue::NULL);
                let _ = callback.call3(
                    &JsValue::NULL,
                    &last,
                    &JsValue::from_f64(ordinal as f64),
                    &JsValue::from_f64(angle),
                );
            }),
            _ => return false,
        }
        true
    }

    /// Completed spins as an array of `{result, timestamp, ordinal}`.
    pub fn history(&self) -> JsValue {
        let entries: Vec<serde_json::Value> = self
            .inner
            .borrow()
            .wheel
            .history()
            .iter()
            .map(|e| {
                serde_json::json!({
                    "result": e.result,
                    "timestamp": e.timestamp,
                    "ordinal": e.ordinal,
                })
            })
            .collect();
        serde_json::to_string(&entries)
            .ok()
            .and_then(|s| js_sys::JSON::parse(&s).ok())
            .unwrap_or(JsValue::NULL)
    }

    /// Replace one slice's label text and color without rebuilding the wheel.
    #[wasm_bindgen(js_name = setSliceLabel)]
    pub fn set_slice_label(&self, index: usize, label: &str, color: &str) {
        self.inner.borrow_mut().renderer.render_slice_label(index, label, color);
    }

    #[wasm_bindgen(js_name = clearHistory)]
    pub fn clear_history(&self) {
        self.inner.borrow_mut().wheel.clear_history();
    }

    #[wasm_bindgen(js_name = currentSlice)]
    pub fn current_slice(&self) -> usize {
        self.inner.borrow().wheel.current_slice()
    }

    #[wasm_bindgen(js_name = spinCount)]
    pub fn spin_count(&self) -> u32 {
        self.inner.borrow().wheel.state().spin_count
    }

    #[wasm_bindgen(js_name = inProgress)]
    pub fn in_progress(&self) -> bool {
        self.inner.borrow().wheel.state().in_progress
    }
}
