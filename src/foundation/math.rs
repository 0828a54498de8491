const MICROS_PER_SEC: f64 = 1_000_000.0;

/// Seconds to whole microseconds, rounded to nearest. Negative inputs clamp to zero.
pub(crate) fn secs_to_micros(secs: f64) -> u64 {
    (secs * MICROS_PER_SEC).round().max(0.0) as u64
}

pub(crate) fn micros_to_secs(us: u64) -> f64 {
    us as f64 / MICROS_PER_SEC
}

/// Store a blended channel value the way a clamped byte array does: clamp, then round half to
/// even.
pub(crate) fn clamp_round_u8(v: f64) -> u8 {
    v.clamp(0.0, 255.0).round_ties_even() as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
