//! Output generation for a finished run.
//!
//! # Submodules
//!
//! - [`tabular`]: writes the aggregated items of a run to a CSV snapshot
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── collected_2025-05-06_090000.csv
//! └── collected_2025-05-06_180000.csv
//! ```

pub mod tabular;
