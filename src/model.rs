//! Normalized sensing matrices, and the read-only store which holds them

use std::collections::HashMap;

use log::info;

#[cfg(not(feature = "serial"))]
use rayon::prelude::*;

use crate::error::{ReconstructionError, Result};
use crate::normalize::{normalize, Stats};
use crate::types::Matrix;

/// A sensing matrix `H`, prepared once for any number of reconstructions.
#[derive(Debug, Clone)]
pub struct NormalizedModel {
    /// `(H - mean) / std`, or just `H - mean` when `std` is negligible
    pub h : Matrix,
    /// Transpose of `h`, stored in its own standard-layout buffer
    pub ht: Matrix,
    /// Statistics of the original, un-normalized `H`
    pub stats: Stats,
}

impl NormalizedModel {

    pub fn new(raw: &Matrix) -> Self {
        let (h, stats) = normalize(raw);
        let ht = h.t().as_standard_layout().into_owned();
        Self { h, ht, stats }
    }

    /// Number of measurements (signal length) this model expects
    pub fn rows(&self) -> usize { self.h.nrows() }

    /// Number of unknowns (image pixels) this model reconstructs
    pub fn cols(&self) -> usize { self.h.ncols() }
}

/// All available models, keyed by identifier (e.g. `"60x60"`).
///
/// Filled once at start-up; afterwards only shared references are handed out,
/// so any number of reconstructions may read it concurrently.
#[derive(Debug, Default)]
pub struct ModelStore {
    models: HashMap<String, NormalizedModel>,
}

impl ModelStore {

    pub fn new() -> Self { Self::default() }

    /// Normalize `raw` and store it under `key`, replacing any previous model
    /// with the same key.
    pub fn insert(&mut self, key: impl Into<String>, raw: &Matrix) -> &NormalizedModel {
        let key = key.into();
        let model = NormalizedModel::new(raw);
        log_model(&key, &model);
        self.models.insert(key.clone(), model);
        &self.models[&key]
    }

    /// Build a store from raw matrices, normalizing them in parallel.
    pub fn from_raw(raw: Vec<(String, Matrix)>) -> Self {
        #[cfg    (feature = "serial") ] let iter = raw.into_iter();
        #[cfg(not(feature = "serial"))] let iter = raw.into_par_iter();
        let models = iter
            .map(|(key, h)| {
                let model = NormalizedModel::new(&h);
                log_model(&key, &model);
                (key, model)
            })
            .collect();
        Self { models }
    }

    pub fn get(&self, key: &str) -> Result<&NormalizedModel> {
        self.models.get(key)
            .ok_or_else(|| ReconstructionError::ModelNotFound { key: key.into() })
    }

    pub fn contains(&self, key: &str) -> bool { self.models.contains_key(key) }

    /// Model identifiers, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<_> = self.models.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len     (&self) -> usize { self.models.len() }
    pub fn is_empty(&self) -> bool  { self.models.is_empty() }
}

fn log_model(key: &str, model: &NormalizedModel) {
    let Stats { mean, std } = model.stats;
    info!("Model `{key}` normalized: {}x{}, mean={mean:.4}, std={std:.4}",
          model.rows(), model.cols());
}
