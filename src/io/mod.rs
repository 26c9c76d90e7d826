//! Reading sensing matrices and measured signals from disk

pub mod csv;
pub mod json;
pub mod npy;
pub mod raw;

use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

use crate::types::{Matrix, Vector};

#[derive(Error, Debug)]
pub enum LoadError {

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] ::csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    ReadNpy(#[from] ndarray_npy::ReadNpyError),

    #[error(transparent)]
    WriteNpy(#[from] ndarray_npy::WriteNpyError),

    #[error("row {row}, field {field}: `{text}` is not a number")]
    NotANumber { row: usize, field: usize, text: String },

    #[error("row {row} has {found} fields, previous rows have {expected}")]
    Ragged { row: usize, expected: usize, found: usize },

    #[error("expected a 2-dimensional array, found {ndim} dimensions")]
    NotAMatrix { ndim: usize },

    #[error("no data")]
    Empty,

    #[error("{len} bytes is not a whole number of 32-bit floats")]
    RawLength { len: usize },

    #[error("signal of length {len} is not a whole number of sensors with {samples_per_sensor} samples each")]
    GainLength { len: usize, samples_per_sensor: usize },

    #[error("don't know how to read {0:?}")]
    UnsupportedFormat(PathBuf),
}

pub type Result<T> = std::result::Result<T, LoadError>;

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Load a sensing matrix: `.csv` or `.npy`
pub fn load_matrix(path: &Path) -> Result<Matrix> {
    match extension(path).as_str() {
        "csv" => csv::read_matrix(path),
        "npy" => npy::read_matrix(path),
        _     => Err(LoadError::UnsupportedFormat(path.into())),
    }
}

/// Load a sensing matrix, keeping a `.npy` copy of CSV sources in `cache_dir`.
///
/// Parsing large CSV matrices dominates start-up time; subsequent runs read the
/// binary copy instead.
pub fn load_matrix_cached(path: &Path, cache_dir: &Path) -> Result<Matrix> {
    if extension(path) != "csv" { return load_matrix(path) }
    let stem = path.file_stem().ok_or_else(|| LoadError::UnsupportedFormat(path.into()))?;
    let cached = cache_dir.join(format!("{}.npy", stem.to_string_lossy()));
    if cached.exists() {
        info!("Reading cached matrix {cached:?}");
        return npy::read_matrix(&cached)
    }
    info!("Converting {path:?} to {cached:?}");
    let matrix = csv::read_matrix(path)?;
    std::fs::create_dir_all(cache_dir)?;
    npy::write_matrix(&matrix, &cached)?;
    Ok(matrix)
}

/// Load a measured signal: `.csv`, `.npy`, `.json` or raw little-endian
/// 32-bit floats (`.raw`, `.bin`)
pub fn load_signal(path: &Path) -> Result<Vector> {
    match extension(path).as_str() {
        "csv"         => csv::read_vector(path),
        "npy"         => npy::read_vector(path),
        "json"        => json::read_signal(path),
        "raw" | "bin" => raw::read_signal(path),
        _             => Err(LoadError::UnsupportedFormat(path.into())),
    }
}
