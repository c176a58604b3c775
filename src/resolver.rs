//! Winner resolution: maps configuration plus request context to the slice
//! index a spin must land on.
//!
//! Four modes, tried per call context:
//! 1. explicit value (remote-dictated or programmatic),
//! 2. selector-driven deterministic sequence,
//! 3. weighted random sampling,
//! 4. bounded retry when 2/3 miss.
//!
//! A `None` result is a resolution miss: the caller must not start a spin.

use serde_json::Value;

use crate::config::{Item, Selected, WheelConfig};

/// Equality used for selector matching: primitives only. Object- and
/// array-valued fields are never matchable.
fn primitive_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        _ => false,
    }
}

fn matchable(v: &Value) -> bool {
    matches!(v, Value::Number(_) | Value::String(_) | Value::Bool(_))
}

/// Per-index selector values for the configured selector field, skipping
/// items whose field is absent or not a primitive.
pub fn selector_values(items: &[Item], selector: &str) -> Vec<(usize, Value)> {
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            item.field(selector).filter(matchable).map(|v| (i, v))
        })
        .collect()
}

/// Explicit-value resolution (mode 1). With no selector configured a numeric
/// value is the slice index itself; anything else scans the items for the
/// first primitive selector-field match.
pub fn find_winner(items: &[Item], selector: Option<&str>, value: &Value) -> Option<usize> {
    if selector.is_none() {
        if let Value::Number(n) = value {
            let idx = n.as_f64()?;
            if idx.fract() != 0.0 || idx < 0.0 {
                return None;
            }
            let idx = idx as usize;
            return (idx < items.len()).then_some(idx);
        }
        return None;
    }
    let field = selector.unwrap_or_default();
    items.iter().position(|item| {
        item.field(field).filter(matchable).is_some_and(|v| primitive_eq(&v, value))
    })
}

/// Deterministic-sequence resolution (mode 2): pick the slice dictated by the
/// configured `selected` policy for the given spin ordinal.
pub fn selected_slice(
    items: &[Item],
    selector: Option<&str>,
    selected: &Selected,
    reset_count: u32,
) -> Option<usize> {
    let in_range = |idx: usize| (idx < items.len()).then_some(idx);
    match selected {
        Selected::Explicit { index } => in_range(*index),
        Selected::Sequence(values) => {
            let target = values.get(reset_count as usize)?;
            if let Some(field) = selector {
                selector_values(items, field)
                    .into_iter()
                    .find(|(_, v)| primitive_eq(v, target))
                    .map(|(i, _)| i)
            } else {
                in_range(target.as_u64()? as usize)
            }
        }
        Selected::Single(value) => match value {
            Value::Number(n) => in_range(n.as_u64()? as usize),
            Value::String(_) if selector.is_some() => find_winner(items, selector, value),
            _ => None,
        },
        Selected::Flag(_) => None,
    }
}

/// Weighted random sampling (mode 3): inverse-transform over the cumulative
/// weights. `r` is uniform in `[0, 1)`; item `i` wins with probability
/// `weight_i / total`. An empty item set has nothing to sample.
pub fn weighted_index(items: &[Item], r: f64) -> Option<usize> {
    let total: f64 = items.iter().map(Item::sampling_weight).sum();
    let mut remaining = r * total;
    for (i, item) in items.iter().enumerate() {
        remaining -= item.sampling_weight();
        if remaining <= 0.0 {
            return Some(i);
        }
    }
    items.len().checked_sub(1)
}

/// Local (non-remote) resolution with the bounded retry loop (mode 4). Each
/// miss advances `reset_count` and retries; once `reset_count` reaches the
/// slice count the sequence wraps when random fallback is allowed and fails
/// otherwise. Retries are capped at the slice count, and exhaustion is a
/// miss, not an error.
pub fn resolve_local(
    cfg: &WheelConfig,
    reset_count: &mut u32,
    rand: &mut dyn FnMut() -> f64,
) -> Option<usize> {
    let slices = cfg.slices();
    if slices == 0 {
        return None;
    }
    let has_policy = cfg.selector.is_some() || !matches!(cfg.selected, Selected::Flag(_));
    if !has_policy {
        if !cfg.random {
            return None;
        }
        return weighted_index(&cfg.items, rand());
    }
    for _ in 0..=slices {
        if slices as u32 <= *reset_count {
            if cfg.random {
                *reset_count = 0;
            } else {
                return None;
            }
        }
        let id =
            selected_slice(&cfg.items, cfg.selector.as_deref(), &cfg.selected, *reset_count);
        if let Some(id) = id {
            return Some(id);
        }
        *reset_count += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items() -> Vec<Item> {
        vec![
            Item::new("a", "#111").with_field("prize", json!("ten")),
            Item::new("b", "#222").with_field("prize", json!("twenty")),
            Item::new("c", "#333").with_field("prize", json!(["not", "matchable"])),
            Item::new("d", "#444").with_field("prize", json!("forty")),
        ]
    }

    #[test]
    fn explicit_numeric_value_is_an_index_without_selector() {
        let items = items();
        for v in 0..4i64 {
            assert_eq!(find_winner(&items, None, &json!(v)), Some(v as usize));
        }
        assert_eq!(find_winner(&items, None, &json!(4)), None);
        assert_eq!(find_winner(&items, None, &json!(-1)), None);
        assert_eq!(find_winner(&items, None, &json!(1.5)), None);
        assert_eq!(find_winner(&items, None, &json!("ten")), None);
    }

    #[test]
    fn explicit_value_scans_the_selector_field() {
        let items = items();
        assert_eq!(find_winner(&items, Some("prize"), &json!("twenty")), Some(1));
        assert_eq!(find_winner(&items, Some("prize"), &json!("missing")), None);
        // Array-valued fields are skipped, not matched.
        assert_eq!(find_winner(&items, Some("prize"), &json!(["not", "matchable"])), None);
    }

    #[test]
    fn selector_values_skip_non_primitives() {
        let vals = selector_values(&items(), "prize");
        assert_eq!(vals.len(), 3);
        assert!(vals.iter().all(|(i, _)| *i != 2));
    }

    #[test]
    fn sequence_consumes_one_target_per_ordinal() {
        let items = items();
        let seq = Selected::Sequence(vec![json!("forty"), json!("ten")]);
        assert_eq!(selected_slice(&items, Some("prize"), &seq, 0), Some(3));
        assert_eq!(selected_slice(&items, Some("prize"), &seq, 1), Some(0));
        assert_eq!(selected_slice(&items, Some("prize"), &seq, 2), None);
    }

    #[test]
    fn explicit_index_policy_is_range_checked() {
        let items = items();
        let ok = Selected::Explicit { index: 2 };
        let bad = Selected::Explicit { index: 9 };
        assert_eq!(selected_slice(&items, None, &ok, 0), Some(2));
        assert_eq!(selected_slice(&items, None, &bad, 0), None);
    }

    #[test]
    fn weighted_index_inverts_the_cumulative_distribution() {
        let items = vec![
            Item::new("a", "#111").with_weight(1.0),
            Item::new("b", "#222").with_weight(3.0),
        ];
        // total = 4: r*4 <= 1 lands on a, above lands on b.
        assert_eq!(weighted_index(&items, 0.0), Some(0));
        assert_eq!(weighted_index(&items, 0.24), Some(0));
        assert_eq!(weighted_index(&items, 0.26), Some(1));
        assert_eq!(weighted_index(&items, 0.999), Some(1));
    }

    #[test]
    fn empty_item_set_never_resolves() {
        assert_eq!(weighted_index(&[], 0.5), None);
        let cfg = WheelConfig { items: Vec::new(), random: true, ..WheelConfig::default() };
        let mut reset = 0;
        assert_eq!(resolve_local(&cfg, &mut reset, &mut || 0.5), None);
        // Same with a selector policy configured.
        let cfg = WheelConfig {
            items: Vec::new(),
            selector: Some("prize".into()),
            selected: Selected::Sequence(vec![json!("x")]),
            random: true,
            ..WheelConfig::default()
        };
        let mut reset = 0;
        assert_eq!(resolve_local(&cfg, &mut reset, &mut || 0.5), None);
    }

    #[test]
    fn resolve_local_is_bounded_when_nothing_matches() {
        let cfg = WheelConfig {
            items: items(),
            selector: Some("prize".into()),
            selected: Selected::Sequence(vec![json!("never")]),
            random: false,
            ..WheelConfig::default()
        };
        let mut reset = 0;
        let mut rand = || 0.5;
        assert_eq!(resolve_local(&cfg, &mut reset, &mut rand), None);
    }

    #[test]
    fn sequence_wraps_when_random_fallback_allowed() {
        let cfg = WheelConfig {
            items: items(),
            selector: Some("prize".into()),
            selected: Selected::Sequence(vec![json!("forty")]),
            random: true,
            ..WheelConfig::default()
        };
        // Four spins already consumed; the sequence starts over.
        let mut reset = 4;
        assert_eq!(resolve_local(&cfg, &mut reset, &mut || 0.5), Some(3));
        assert_eq!(reset, 0);

        // Without random fallback the exhausted sequence is a miss.
        let cfg = WheelConfig { random: false, ..cfg };
        let mut reset = 4;
        assert_eq!(resolve_local(&cfg, &mut reset, &mut || 0.5), None);
    }

    #[test]
    fn resolve_local_without_policy_requires_random() {
        let cfg = WheelConfig { items: items(), random: false, ..WheelConfig::default() };
        let mut reset = 0;
        assert_eq!(resolve_local(&cfg, &mut reset, &mut || 0.9), None);

        let cfg = WheelConfig { items: items(), random: true, ..cfg };
        assert_eq!(resolve_local(&cfg, &mut reset, &mut || 0.9), Some(3));
    }
}
