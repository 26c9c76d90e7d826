//! NumPy `.npy` arrays, stored as either 64- or 32-bit floats

use std::path::Path;

use ndarray::{ArrayD, Ix2};
use ndarray_npy::{read_npy, write_npy};

use super::{LoadError, Result};
use crate::types::{Intensity, Matrix, Vector};

fn read_any(path: &Path) -> Result<ArrayD<Intensity>> {
    match read_npy::<_, ArrayD<f64>>(path) {
        Ok(a) => Ok(a),
        Err(e) => read_npy::<_, ArrayD<f32>>(path)
            .map(|a| a.mapv(f64::from))
            .map_err(|_| e.into()),
    }
}

pub fn read_matrix(path: &Path) -> Result<Matrix> {
    let a = read_any(path)?;
    let ndim = a.ndim();
    let m = a.into_dimensionality::<Ix2>().map_err(|_| LoadError::NotAMatrix { ndim })?;
    if m.is_empty() { return Err(LoadError::Empty) }
    Ok(m)
}

/// Arrays of any dimensionality are flattened in logical (row-major) order.
pub fn read_vector(path: &Path) -> Result<Vector> {
    let a = read_any(path)?;
    if a.is_empty() { return Err(LoadError::Empty) }
    Ok(a.iter().copied().collect())
}

pub fn write_matrix(matrix: &Matrix, path: &Path) -> Result<()> {
    Ok(write_npy(path, matrix)?)
}
