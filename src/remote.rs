//! Remote result synchronization.
//!
//! The protocol is one round-trip per spin: the widget sends the previous
//! result (or `false` on the very first spin) plus any configured custom
//! fields, optionally tagged with a single-use nonce, and the service
//! answers with a [`ResultEnvelope`] dictating the winner. Everything except
//! the actual fetch is pure and testable natively; the fetch itself lives
//! behind `wasm32` and resumes the pipeline on the browser event loop.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::{FetchOptions, Item};
use crate::rng;

/// Length of the random nonce token attached to verified requests.
pub const NONCE_LENGTH: usize = 8;

/// A request ready for the transport: resolved URL, method, optional JSON
/// body, and the nonce we expect echoed back.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedRequest {
    pub url: String,
    pub method: &'static str,
    pub body: Option<String>,
    pub nonce: Option<String>,
}

/// Build the request for one spin. Read-style (GET) requests carry the data
/// as a query string; write-style (POST) requests carry a JSON body.
pub fn prepare_request(opts: &FetchOptions, last_spin: Option<&Item>) -> PreparedRequest {
    let mut data = Map::new();
    for (k, v) in &opts.data {
        data.insert(k.clone(), v.clone());
    }
    let nonce = opts.nonce.then(|| rng::nonce_token(NONCE_LENGTH));
    if let Some(n) = &nonce {
        data.insert("nonce".into(), Value::String(n.clone()));
    }
    let last = match last_spin {
        Some(item) => serde_json::to_value(item).unwrap_or(Value::Bool(false)),
        None => Value::Bool(false),
    };
    data.insert("lastSpin".into(), last);

    if opts.is_post() {
        PreparedRequest {
            url: opts.url.clone(),
            method: "POST",
            body: Some(Value::Object(data).to_string()),
            nonce,
        }
    } else {
        PreparedRequest {
            url: format!("{}?{}", opts.url, query_string(&data)),
            method: "GET",
            body: None,
            nonce,
        }
    }
}

fn query_string(data: &Map<String, Value>) -> String {
    data.iter()
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{}={}", percent_encode(k), percent_encode(&value))
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// The service's response shape. Missing fields deserialize as `Null` so a
/// sparse or malformed envelope degrades into a protocol violation instead
/// of a parse panic.
#[derive(Clone, Debug, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ResultEnvelope {
    pub winner: Value,
    pub nonce: Value,
    pub selector: Option<String>,
    pub stop: Value,
}

pub fn parse_envelope(json: &str) -> Result<ResultEnvelope, serde_json::Error> {
    serde_json::from_str(json)
}

/// Interpretation of a received envelope.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The nonce came back missing, wrong-typed, or different: a tamper /
    /// replay signal. Routes to the failure path; no spin starts.
    NonceMismatch,
    /// Terminal signal from the remote side; no further spin is started.
    Stop,
    /// Spin toward this winner, optionally reconfiguring the selector first.
    Winner { value: Value, selector: Option<String> },
}

/// Decide what a response means. Nonce verification runs first: when a nonce
/// was sent, anything but the identical string in the response is a
/// violation.
pub fn interpret(envelope: &ResultEnvelope, expected_nonce: Option<&str>) -> Outcome {
    if let Some(expected) = expected_nonce {
        match &envelope.nonce {
            Value::String(echoed) if echoed == expected => {}
            _ => return Outcome::NonceMismatch,
        }
    }
    let stopped = matches!(&envelope.stop, Value::Bool(true))
        || matches!(&envelope.stop, Value::String(s) if s == "true");
    if stopped {
        return Outcome::Stop;
    }
    Outcome::Winner {
        value: envelope.winner.clone(),
        selector: envelope.selector.clone(),
    }
}

/// Browser transport: issue the request and parse the JSON response. The
/// call carries no timeout; a hung request simply never starts the spin, and
/// the caller guards against stale completions with the wheel's generation
/// counter.
#[cfg(target_arch = "wasm32")]
pub async fn fetch_envelope(req: &PreparedRequest) -> Result<ResultEnvelope, wasm_bindgen::JsValue> {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Headers, Request, RequestInit, Response};

    let init = RequestInit::new();
    init.set_method(req.method);
    let headers = Headers::new()?;
    headers.set("Content-Type", "application/json")?;
    init.set_headers(&headers);
    if let Some(body) = &req.body {
        init.set_body(&JsValue::from_str(body));
    }
    let request = Request::new_with_str_and_init(&req.url, &init)?;
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await?
        .dyn_into()?;
    let text = JsFuture::from(response.text()?)
        .await?
        .as_string()
        .ok_or_else(|| JsValue::from_str("non-text response body"))?;
    parse_envelope(&text).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn opts(method: &str, nonce: bool) -> FetchOptions {
        FetchOptions {
            url: "https://example.com/spin".into(),
            method: method.into(),
            nonce,
            data: [("table".to_string(), json!("vip 1"))].into_iter().collect(),
        }
    }

    #[test]
    fn first_spin_sends_last_spin_false() {
        let req = prepare_request(&opts("GET", false), None);
        assert_eq!(req.method, "GET");
        assert!(req.body.is_none());
        assert!(req.nonce.is_none());
        assert!(req.url.contains("lastSpin=false"));
        assert!(req.url.contains("table=vip%201"));
    }

    #[test]
    fn post_requests_carry_a_json_body() {
        let item = Item::new("Gold", "#ff0");
        let req = prepare_request(&opts("post", true), Some(&item));
        assert_eq!(req.method, "POST");
        assert_eq!(req.url, "https://example.com/spin");
        let nonce = req.nonce.clone().expect("nonce requested");
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["nonce"], json!(nonce));
        assert_eq!(body["lastSpin"]["name"], json!("Gold"));
        assert_eq!(body["table"], json!("vip 1"));
    }

    #[test]
    fn nonce_mismatch_is_a_protocol_violation() {
        let env = parse_envelope(r#"{"winner": 2, "nonce": "xyz"}"#).unwrap();
        assert_eq!(interpret(&env, Some("abc")), Outcome::NonceMismatch);
    }

    #[test]
    fn missing_or_wrong_typed_nonce_also_fails() {
        let env = parse_envelope(r#"{"winner": 2}"#).unwrap();
        assert_eq!(interpret(&env, Some("abc")), Outcome::NonceMismatch);
        let env = parse_envelope(r#"{"winner": 2, "nonce": 42}"#).unwrap();
        assert_eq!(interpret(&env, Some("abc")), Outcome::NonceMismatch);
    }

    #[test]
    fn matching_nonce_yields_the_winner() {
        let env = parse_envelope(r#"{"winner": "gold", "nonce": "abc", "selector": "prize"}"#)
            .unwrap();
        assert_eq!(
            interpret(&env, Some("abc")),
            Outcome::Winner { value: json!("gold"), selector: Some("prize".into()) }
        );
    }

    #[test]
    fn no_nonce_requested_skips_verification() {
        let env = parse_envelope(r#"{"winner": 1}"#).unwrap();
        assert_eq!(interpret(&env, None), Outcome::Winner { value: json!(1), selector: None });
    }

    #[test]
    fn stop_is_terminal_for_bool_and_string_forms() {
        for raw in [r#"{"winner": 1, "stop": true}"#, r#"{"winner": 1, "stop": "true"}"#] {
            let env = parse_envelope(raw).unwrap();
            assert_eq!(interpret(&env, None), Outcome::Stop);
        }
        let env = parse_envelope(r#"{"winner": 1, "stop": false}"#).unwrap();
        assert!(matches!(interpret(&env, None), Outcome::Winner { .. }));
    }

    #[test]
    fn malformed_json_is_an_error_not_a_panic() {
        assert!(parse_envelope("not json").is_err());
        assert!(parse_envelope(r#"{"winner""#).is_err());
    }
}
