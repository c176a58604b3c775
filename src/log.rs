//! Console-backed logging shim. Configuration problems are warnings, never
//! errors (the widget clamps and keeps going), so `warn` is all we need.

#[cfg(target_arch = "wasm32")]
pub fn warn(msg: &str) {
    web_sys::console::warn_1(&msg.into());
}

#[cfg(not(target_arch = "wasm32"))]
pub fn warn(msg: &str) {
    eprintln!("lucky-wheel: {msg}");
}
