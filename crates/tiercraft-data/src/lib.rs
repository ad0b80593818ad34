//! Data-driven setup for the scheduler: recipes and the tier schedule are
//! read from RON, TOML, or JSON files and resolved into core types.

pub mod loader;
pub mod schema;

use std::path::PathBuf;

pub use loader::{DataLoadError, ProductionData, load_production_data};

/// The bundled tech2x -> tech4x -> tech8x data set.
pub fn default_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join("tech")
}
