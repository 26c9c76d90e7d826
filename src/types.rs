use ndarray::{Array1, Array2};

pub type Intensity = f64;
pub type Pixel     = u8;

pub type Matrix = Array2<Intensity>;
pub type Vector = Array1<Intensity>;

/// Flat index into a solution vector
pub type Index1 = usize;
/// `[row, column]` index into a rendered grid
pub type Index2 = [usize; 2];

/// Below this a standard deviation is treated as zero: the data are centred
/// but not rescaled.
pub const EPS_STD: Intensity = 1e-12;

/// Hard cap on the number of CGNE / CGNR iterations.
pub const MAX_ITERATIONS: usize = 10;

/// Convergence threshold on the residual norm, and on its change between
/// successive iterations.
pub const TOLERANCE: Intensity = 1e-4;

/// Squared norms below this stop the solver before they are divided by.
pub const EPS_SMALL: Intensity = 1e-20;

/// Largest value a rendered pixel can take.
pub const MAX_PIXEL: Intensity = 255.0;
