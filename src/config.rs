//! Wheel configuration: the ordered item set and the typed option structure.
//!
//! Options arrive from the host as one JSON bag (library defaults overlaid
//! with caller-supplied values), deserialize into [`WheelConfig`], and are
//! validated once at construction. Out-of-range values clamp to the nearest
//! valid value with a console warning; construction never rejects a config.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::easing::Easing;
use crate::log;
use crate::rng;

/// One slice of the wheel. The item set is ordered; index order is the
/// angular layout order. Unknown JSON keys land in `fields` and are
/// addressable through the configured selector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Item {
    pub fn new(name: &str, color: &str) -> Item {
        Item {
            name: name.into(),
            color: color.into(),
            weight: None,
            image: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Item {
        self.weight = Some(weight);
        self
    }

    pub fn with_field(mut self, key: &str, value: Value) -> Item {
        self.fields.insert(key.into(), value);
        self
    }

    /// Sampling weight; unspecified or non-positive weights count as 1.
    pub fn sampling_weight(&self) -> f64 {
        match self.weight {
            Some(w) if w > 0.0 => w,
            _ => 1.0,
        }
    }

    /// Look up a selector field on this item. Built-in properties are
    /// addressable by name alongside the free-form fields.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(Value::String(self.name.clone())),
            "color" => Some(Value::String(self.color.clone())),
            "weight" => self.weight.map(|w| {
                serde_json::Number::from_f64(w).map(Value::Number).unwrap_or(Value::Null)
            }),
            "image" => self.image.clone().map(Value::String),
            _ => self.fields.get(name).cloned(),
        }
    }
}

/// The configured winner policy for non-remote spins.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Selected {
    /// `{ "selectedIndex": n }` — an explicit slice index.
    Explicit {
        #[serde(rename = "selectedIndex")]
        index: usize,
    },
    /// Ordered target values, consumed one per spin ordinal.
    Sequence(Vec<Value>),
    /// `false` — no configured winner.
    Flag(bool),
    /// A single index or selector value.
    Single(Value),
}

impl Default for Selected {
    fn default() -> Self {
        Selected::Flag(false)
    }
}

/// Remote result-synchronization options; presence switches the widget into
/// remote-dictated mode.
#[derive(Clone, Debug, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    pub url: String,
    pub method: String,
    /// Attach a single-use random token and require it echoed back.
    pub nonce: bool,
    /// Extra fields merged into every request.
    pub data: BTreeMap<String, Value>,
}

impl FetchOptions {
    pub fn is_post(&self) -> bool {
        self.method.eq_ignore_ascii_case("post")
    }
}

fn false_as_none<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    // `selector: false` disables selector resolution; only a string enables it.
    match Value::deserialize(d)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

const MAX_LINE_WIDTH: f64 = 10.0;

/// Validated wheel options. Immutable after construction apart from the
/// small allowlist accepted by [`WheelConfig::set_option`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WheelConfig {
    pub items: Vec<Item>,
    pub width: f64,
    pub font_size: f64,
    pub text_offset: f64,
    pub text_arc: bool,
    /// Label color; `"auto"` derives a contrasting color from the slice fill.
    pub text_color: String,
    /// Hub radius in viewBox units (the wheel renders in a 200x200 viewBox).
    pub center_width: f64,
    pub center_line_width: f64,
    pub center_line_color: String,
    pub center_background: String,
    pub slice_line_width: f64,
    pub slice_line_color: String,
    pub outer_line_width: f64,
    pub outer_line_color: String,
    pub marker_color: String,
    pub marker_animation: bool,
    pub easing: String,
    pub duration: f64,
    pub min_duration: f64,
    pub max_duration: f64,
    pub rotates: u32,
    pub min_rotates: u32,
    pub max_rotates: u32,
    /// Spin cap; 0 = unlimited.
    pub max: u32,
    #[serde(deserialize_with = "false_as_none")]
    pub selector: Option<String>,
    pub selected: Selected,
    pub random: bool,
    pub reverse: bool,
    pub fetch_options: Option<FetchOptions>,
    /// History bound; `None` keeps every spin.
    pub history_capacity: Option<usize>,
}

impl Default for WheelConfig {
    fn default() -> Self {
        WheelConfig {
            items: vec![Item::new("Win", "#3498db"), Item::new("Lose", "#ffc107")],
            width: 400.0,
            font_size: 14.0,
            text_offset: 8.0,
            text_arc: false,
            text_color: "#fff".into(),
            center_width: 45.0,
            center_line_width: 5.0,
            center_line_color: "#424242".into(),
            center_background: "#8e44ad".into(),
            slice_line_width: 5.0,
            slice_line_color: "#424242".into(),
            outer_line_width: 5.0,
            outer_line_color: "#424242".into(),
            marker_color: "#CC3333".into(),
            marker_animation: true,
            easing: "wheel".into(),
            duration: 8000.0,
            min_duration: 0.0,
            max_duration: 0.0,
            rotates: 8,
            min_rotates: 0,
            max_rotates: 0,
            max: 0,
            selector: None,
            selected: Selected::Flag(false),
            random: false,
            reverse: false,
            fetch_options: None,
            history_capacity: None,
        }
    }
}

impl WheelConfig {
    /// Parse a JSON option bag. Unknown keys are ignored; type errors fall
    /// back to the full default config with a warning, never an error.
    pub fn from_json(json: &str) -> WheelConfig {
        match serde_json::from_str::<WheelConfig>(json) {
            Ok(cfg) => cfg.validated(),
            Err(e) => {
                log::warn(&format!("invalid options, using defaults: {e}"));
                WheelConfig::default()
            }
        }
    }

    /// Clamp out-of-range values and normalize the easing key. Runs once at
    /// construction.
    pub fn validated(mut self) -> WheelConfig {
        if self.rotates < 1 {
            self.rotates = 1;
            log::warn("min number of rotates is 1");
        }
        for (name, width) in [
            ("slice_line_width", &mut self.slice_line_width),
            ("center_line_width", &mut self.center_line_width),
            ("outer_line_width", &mut self.outer_line_width),
        ] {
            if *width > MAX_LINE_WIDTH {
                *width = MAX_LINE_WIDTH;
                log::warn(&format!("max {name} is 10"));
            }
        }
        if Easing::from_key(&self.easing).is_none() {
            log::warn(&format!("unknown easing \"{}\", using default", self.easing));
            self.easing = "wheel".into();
        }
        self
    }

    pub fn slices(&self) -> usize {
        self.items.len()
    }

    pub fn easing_curve(&self) -> Easing {
        Easing::from_key(&self.easing).unwrap_or_default()
    }

    /// Duration for one spin: a uniform draw between the configured bounds
    /// when both are set, otherwise the fixed duration.
    pub fn spin_duration(&self, r: f64) -> f64 {
        if self.min_duration > 0.0 && self.max_duration > self.min_duration {
            rng::ranged_int(r, self.min_duration, self.max_duration) as f64
        } else {
            self.duration
        }
    }

    /// Rotation count for one spin, with the same bounds rule.
    pub fn spin_rotates(&self, r: f64) -> u32 {
        if self.min_rotates > 0 && self.max_rotates > self.min_rotates {
            rng::ranged_int(r, self.min_rotates as f64, self.max_rotates as f64) as u32
        } else {
            self.rotates
        }
    }

    /// Post-construction reconfiguration, restricted to the allowlisted keys.
    /// Returns whether the option was applied.
    pub fn set_option(&mut self, key: &str, value: &Value) -> bool {
        match (key, value) {
            ("easing", Value::String(s)) if Easing::from_key(s).is_some() => {
                self.easing = s.clone();
                true
            }
            ("duration", Value::Number(n)) => match n.as_f64() {
                Some(d) if d > 0.0 => {
                    self.duration = d;
                    true
                }
                _ => false,
            },
            ("rotates", Value::Number(n)) => match n.as_u64() {
                Some(r) if r >= 1 => {
                    self.rotates = r as u32;
                    true
                }
                _ => false,
            },
            ("max", Value::Number(n)) => match n.as_u64() {
                Some(m) => {
                    self.max = m as u32;
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn line_widths_clamp_to_ten() {
        let cfg = WheelConfig {
            slice_line_width: 22.0,
            outer_line_width: 11.0,
            ..WheelConfig::default()
        }
        .validated();
        assert_eq!(cfg.slice_line_width, 10.0);
        assert_eq!(cfg.outer_line_width, 10.0);
        assert_eq!(cfg.center_line_width, 5.0);
    }

    #[test]
    fn rotates_clamp_to_one() {
        let cfg = WheelConfig { rotates: 0, ..WheelConfig::default() }.validated();
        assert_eq!(cfg.rotates, 1);
    }

    #[test]
    fn unknown_easing_falls_back_to_default() {
        let cfg = WheelConfig { easing: "easeOutWobble".into(), ..WheelConfig::default() }
            .validated();
        assert_eq!(cfg.easing, "wheel");
        assert_eq!(cfg.easing_curve(), Easing::WheelOut);
    }

    #[test]
    fn option_bag_parses_selected_shapes() {
        let cfg = WheelConfig::from_json(
            r#"{"selected": {"selectedIndex": 2}, "selector": "prize"}"#,
        );
        assert_eq!(cfg.selected, Selected::Explicit { index: 2 });
        assert_eq!(cfg.selector.as_deref(), Some("prize"));

        let cfg = WheelConfig::from_json(r#"{"selected": ["a", "b"], "selector": false}"#);
        assert_eq!(cfg.selected, Selected::Sequence(vec![json!("a"), json!("b")]));
        assert_eq!(cfg.selector, None);

        let cfg = WheelConfig::from_json(r#"{"selected": 3}"#);
        assert_eq!(cfg.selected, Selected::Single(json!(3)));
    }

    #[test]
    fn camel_case_option_keys_map_onto_fields() {
        let cfg = WheelConfig::from_json(
            r#"{
                "centerWidth": 30,
                "sliceLineWidth": 4,
                "textColor": "auto",
                "historyCapacity": 5,
                "fetchOptions": {"url": "/spin", "method": "POST", "nonce": true}
            }"#,
        );
        assert_eq!(cfg.center_width, 30.0);
        assert_eq!(cfg.slice_line_width, 4.0);
        assert_eq!(cfg.text_color, "auto");
        assert_eq!(cfg.history_capacity, Some(5));
        let fetch = cfg.fetch_options.expect("fetch options parsed");
        assert!(fetch.nonce);
        assert!(fetch.is_post());
    }

    #[test]
    fn set_option_honors_the_allowlist_only() {
        let mut cfg = WheelConfig::default().validated();
        assert!(cfg.set_option("duration", &json!(2500)));
        assert_eq!(cfg.duration, 2500.0);
        assert!(cfg.set_option("easing", &json!("easeOutCubic")));
        assert!(!cfg.set_option("easing", &json!("nope")));
        assert!(!cfg.set_option("reverse", &json!(true)));
        assert!(!cfg.set_option("rotates", &json!(0)));
        assert!(cfg.set_option("max", &json!(5)));
        assert_eq!(cfg.max, 5);
    }

    #[test]
    fn variable_duration_draws_between_bounds() {
        let cfg = WheelConfig {
            min_duration: 1000.0,
            max_duration: 2000.0,
            ..WheelConfig::default()
        };
        assert_eq!(cfg.spin_duration(0.0), 1000.0);
        assert_eq!(cfg.spin_duration(0.999), 1999.0);
        // The inclusive upper bound needs a draw past 1000/1001.
        assert_eq!(cfg.spin_duration(0.9995), 2000.0);
        let fixed = WheelConfig::default();
        assert_eq!(fixed.spin_duration(0.5), 8000.0);
    }

    #[test]
    fn item_weight_defaults_and_field_lookup() {
        let item = Item::new("Gold", "#ff0")
            .with_field("prize", json!("jackpot"))
            .with_weight(-3.0);
        assert_eq!(item.sampling_weight(), 1.0);
        assert_eq!(item.field("prize"), Some(json!("jackpot")));
        assert_eq!(item.field("name"), Some(json!("Gold")));
        assert_eq!(item.field("missing"), None);
    }
}
