//! Randomness seam. The wheel never owns a generator: it draws from a
//! `UniformSource`, a closure yielding uniform floats in `[0, 1)`. The
//! default source pulls entropy through `getrandom` (browser crypto under
//! wasm), and tests install deterministic sources instead.

/// Uniform `[0, 1)` supplier installed into a wheel.
pub type UniformSource = Box<dyn FnMut() -> f64>;

/// Default entropy-backed source.
pub fn entropy_source() -> UniformSource {
    Box::new(uniform)
}

/// One uniform draw in `[0, 1)` from system entropy. Falls back to 0.0 if
/// entropy is unavailable rather than failing the spin.
pub fn uniform() -> f64 {
    let mut buf = [0u8; 8];
    if getrandom::getrandom(&mut buf).is_err() {
        return 0.0;
    }
    // 53 random mantissa bits, the exact precision of an f64 in [0, 1).
    (u64::from_le_bytes(buf) >> 11) as f64 / (1u64 << 53) as f64
}

/// Integer draw in `[lo, hi]` from a uniform value. The bounds may arrive in
/// either order (slice windows run high-to-low on the wheel).
pub fn ranged_int(r: f64, lo: f64, hi: f64) -> i64 {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    (r * (hi - lo + 1.0) + lo).floor() as i64
}

const NONCE_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Opaque single-use token attached to remote requests for tamper detection.
pub fn nonce_token(len: usize) -> String {
    (0..len)
        .map(|_| NONCE_CHARS[(uniform() * NONCE_CHARS.len() as f64) as usize % NONCE_CHARS.len()] as char)
        .collect()
}
