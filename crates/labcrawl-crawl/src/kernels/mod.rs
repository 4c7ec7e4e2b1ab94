//! Built-in kernels.

mod manifest;
mod summary;

pub use manifest::{DEFAULT_MANIFEST_NAME, Manifest, ManifestKernel, ManifestRecord};
pub use summary::{LevelStats, LevelSummary, SummaryReport};
