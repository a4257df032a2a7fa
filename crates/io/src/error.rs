use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoError {
    /// File could not be opened or read.
    Read { path: PathBuf, message: String },
    /// Header row could not be parsed.
    Csv { path: PathBuf, message: String },
    /// Workbook construction or save failed.
    Xlsx(String),
    /// Two sheets map to the same name after sanitizing and truncation.
    SheetNameCollision { sheet: String, first: String, second: String },
    /// Serialization or write of JSON output failed.
    Json(String),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoError::Read { path, message } => write!(f, "cannot read {}: {message}", path.display()),
            IoError::Csv { path, message } => write!(f, "{}: CSV error: {message}", path.display()),
            IoError::Xlsx(msg) => write!(f, "XLSX export failed: {msg}"),
            IoError::SheetNameCollision { sheet, first, second } => write!(
                f,
                "sheet name '{sheet}' used by both '{first}' and '{second}'"
            ),
            IoError::Json(msg) => write!(f, "JSON output failed: {msg}"),
        }
    }
}

impl std::error::Error for IoError {}

impl From<rust_xlsxwriter::XlsxError> for IoError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        IoError::Xlsx(e.to_string())
    }
}
