//! Time-gain compensation of raw sensor signals
//!
//! A signal is the concatenation of `N` sensor traces, each `S` samples long.
//! Later samples are attenuated more strongly, so sample `y` of every trace is
//! amplified by `γ(y) = 100 + 0.05 · y · √y`.

use ndarray::{ArrayView1, Zip};

use crate::io::LoadError;
use crate::types::{Intensity, Vector};

/// Samples per sensor trace for the 60x60 model
pub const SAMPLES_60X60: usize = 794;
/// Samples per sensor trace for the 30x30 model
pub const SAMPLES_30X30: usize = 436;
/// Number of sensors contributing to each signal
pub const SENSORS: usize = 64;

/// Trace length of the built-in models, by model key
pub fn samples_per_sensor(model_key: &str) -> Option<usize> {
    match model_key {
        "60x60" => Some(SAMPLES_60X60),
        "30x30" => Some(SAMPLES_30X30),
        _       => None,
    }
}

/// `γ(y)` for `y` in `0..samples_per_sensor`
pub fn profile(samples_per_sensor: usize) -> Vector {
    Vector::from_shape_fn(samples_per_sensor, |y| {
        let y = y as Intensity;
        100.0 + 0.05 * y * y.sqrt()
    })
}

/// Apply the gain profile to every sensor trace in `signal`.
pub fn apply(signal: ArrayView1<Intensity>, samples_per_sensor: usize) -> Result<Vector, LoadError> {
    let len = signal.len();
    if samples_per_sensor == 0 || len == 0 || len % samples_per_sensor != 0 {
        return Err(LoadError::GainLength { len, samples_per_sensor })
    }
    let gamma = profile(samples_per_sensor);
    let mut out = signal.to_owned();
    for trace in out.exact_chunks_mut(samples_per_sensor) {
        Zip::from(trace).and(&gamma).for_each(|s, &g| *s *= g);
    }
    Ok(out)
}
