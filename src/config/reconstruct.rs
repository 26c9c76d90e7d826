//! Configuration file parser for reconstruction runs

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[cfg(not(feature = "serial"))]
use rayon::prelude::*;

use crate::io::{self, LoadError};
use crate::model::ModelStore;
use crate::types::Matrix;

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Config {

    /// Maximum number of rayon threads
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Where reconstructed images are written
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Where binary copies of CSV models are kept
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    #[serde(default, rename = "model")]
    pub models: Vec<Model>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Model {

    /// Identifier used in requests, e.g. `"60x60"`
    pub key: String,

    /// `.csv` or `.npy` file containing the sensing matrix
    pub path: PathBuf,

    /// Length of each sensor trace, if signals for this model need gain compensation
    #[serde(default)]
    pub samples_per_sensor: Option<usize>,
}

fn default_threads() -> usize { 4 }

#[derive(Error, Debug)]
pub enum ConfigError {

    #[error("couldn't read config file {path:?}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error(transparent)]
    Parse(#[from] toml::de::Error),

    #[error("model `{0}` is declared more than once")]
    DuplicateModel(String),
}

impl Config {

    pub fn model(&self, key: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.key == key)
    }

    /// Interpret relative paths as relative to `base`
    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| if p.is_relative() { *p = base.join(&*p) };
        for model in &mut self.models { resolve(&mut model.path) }
        if let Some(dir) = &mut self.output_dir { resolve(dir) }
        if let Some(dir) = &mut self.cache_dir  { resolve(dir) }
    }

    fn check_unique_keys(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for Model { key, .. } in &self.models {
            if !seen.insert(key) { return Err(ConfigError::DuplicateModel(key.clone())) }
        }
        Ok(())
    }

    /// Read every configured model from disk and normalize it.
    pub fn load_models(&self) -> Result<ModelStore, LoadError> {
        #[cfg    (feature = "serial") ] let iter = self.models.    iter();
        #[cfg(not(feature = "serial"))] let iter = self.models.par_iter();
        let raw = iter
            .map(|Model { key, path, .. }| -> Result<(String, Matrix), LoadError> {
                let matrix = match &self.cache_dir {
                    Some(cache) => io::load_matrix_cached(path, cache)?,
                    None        => io::load_matrix(path)?,
                };
                Ok((key.clone(), matrix))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ModelStore::from_raw(raw))
    }
}

pub fn parse_config(text: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(text)?;
    config.check_unique_keys()?;
    Ok(config)
}

/// Relative paths in the file are taken relative to the file's directory.
pub fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.into(), source })?;
    let mut config = parse_config(&text)?;
    config.resolve_paths(path.parent().unwrap_or_else(|| Path::new("")));
    Ok(config)
}
