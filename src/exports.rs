pub use crate::types::{Intensity, Pixel, Matrix, Vector, Index1, Index2};
pub use crate::error::{ReconstructionError, Result};
pub use crate::model::{ModelStore, NormalizedModel};
pub use crate::solver::{Algorithm, Solution, Stop};
pub use crate::image::Grid;
pub use crate::reconstruct::{reconstruct, reconstruct_batch, ReconstructionResult, Request};
pub use crate::resources::{ResourceSampler, ResourceUsage};
