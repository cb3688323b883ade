//! Core contracts shared by the surveyforge crates.
//!
//! Defines the error kinds surfaced to callers, the validated correlation
//! matrix used by the latent sampler, and the generated table model.

pub mod error;
pub mod matrix;
pub mod table;

pub use error::{Error, Result};
pub use matrix::{CorrelationMatrix, PSD_TOLERANCE, SymmetricEigen, symmetric_eigen};
pub use table::{CellValue, Column, GeneratedTable};
