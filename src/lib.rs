mod exports;
pub use exports::*;

pub mod types;
pub mod error;
pub mod normalize;
pub mod model;
pub mod solver;
pub mod image;
pub mod reconstruct;
pub mod resources;
pub mod gain;
pub mod io;
pub mod config;
pub mod utils;
