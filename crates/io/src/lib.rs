// Loading of test-run exports and export of comparison reports

pub mod csv;
pub mod error;
pub mod fields;
pub mod json;
pub mod xlsx;

pub use error::IoError;
