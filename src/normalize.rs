//! z-score normalization of models and signals, and its inverses

use ndarray::{Array, Dimension};
use log::warn;

use crate::types::{Intensity, Vector, EPS_STD};

/// Mean and sample standard deviation of the data that were normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub mean: Intensity,
    pub std : Intensity,
}

impl Stats {

    pub fn of<D: Dimension>(a: &Array<Intensity, D>) -> Self {
        let n = a.len();
        if n == 0 { return Self { mean: 0.0, std: 0.0 } }
        let mean = a.sum() / n as Intensity;
        // Sample standard deviation; undefined (so treated as 0) for a single element
        let std = if n < 2 { 0.0 } else {
            let ss = a.fold(0.0, |acc, &x| { let d = x - mean; acc + d * d });
            (ss / (n - 1) as Intensity).sqrt()
        };
        Self { mean, std }
    }

    /// Whether the data were divided by `std` when normalized
    pub fn is_scaled(&self) -> bool { self.std > EPS_STD }

    /// The factor by which the normalized data must be multiplied to undo the
    /// rescaling: `std`, or 1 when no rescaling took place.
    pub fn scale(&self) -> Intensity {
        if self.is_scaled() { self.std } else { 1.0 }
    }

    /// Undo `normalize`: `x * std + mean`
    pub fn invert<D: Dimension>(&self, normalized: &Array<Intensity, D>) -> Array<Intensity, D> {
        let scale = self.scale();
        normalized.mapv(|x| x * scale + self.mean)
    }
}

/// Centre `a` on its mean and, unless its standard deviation is negligible,
/// divide by the standard deviation.
pub fn normalize<D: Dimension>(a: &Array<Intensity, D>) -> (Array<Intensity, D>, Stats) {
    let stats = Stats::of(a);
    let Stats { mean, std } = stats;
    let normalized = if stats.is_scaled() {
        a.mapv(|x| (x - mean) / std)
    } else {
        warn!("Standard deviation {std:e} too small: data centred but not rescaled");
        a.mapv(|x| x - mean)
    };
    (normalized, stats)
}

/// Map a solution of the normalized system back to the scale of the original
/// system: `f * (g_std / H_std)`, left untouched if `H` was not rescaled.
pub fn denormalize(mut f: Vector, model: Stats, signal: Stats) -> Vector {
    if model.is_scaled() {
        let factor = signal.std / model.std;
        f.mapv_inplace(|x| x * factor);
    }
    f
}
