//! `casematrix-compare`: multi-run test case comparison engine.
//!
//! Pure engine crate: receives field-resolved rows, returns an immutable
//! comparison report. No CLI or IO dependencies.

pub mod algebra;
pub mod cancel;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod matrix;
pub mod model;
pub mod report;

pub use cancel::{CancelReason, CancelToken};
pub use config::{CompareConfig, CompareOptions, MinorRule};
pub use engine::{compare_loaded, run, run_with_cancel};
pub use error::CompareError;
pub use model::{
    Category, CombinationKey, ComparisonReport, Dataset, FieldMap, JoinKey, RawDataset, RawRow,
    TestRecord,
};
