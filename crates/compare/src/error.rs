use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompareError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (duplicate label, missing regex, etc.).
    ConfigValidation(String),
    /// Fewer than two datasets were supplied.
    TooFewDatasets(usize),
    /// A dataset label is empty. Carries the 0-based input position.
    EmptyLabel(usize),
    /// Two datasets share a label.
    DuplicateLabel(String),
    /// A required field could not be resolved for a dataset.
    MissingField { dataset: String, field: String },
    /// Minor-detection regex does not compile.
    InvalidPattern(String),
}

impl CompareError {
    /// True for the schema family: input shape problems detected before any
    /// computation starts.
    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            Self::TooFewDatasets(_)
                | Self::EmptyLabel(_)
                | Self::DuplicateLabel(_)
                | Self::MissingField { .. }
        )
    }
}

impl fmt::Display for CompareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::TooFewDatasets(found) => {
                write!(f, "at least two datasets required (got {found})")
            }
            Self::EmptyLabel(position) => {
                write!(f, "dataset #{} has an empty label", position + 1)
            }
            Self::DuplicateLabel(label) => write!(f, "duplicate dataset label '{label}'"),
            Self::MissingField { dataset, field } => {
                write!(f, "dataset '{dataset}': required field '{field}' not found")
            }
            Self::InvalidPattern(msg) => write!(f, "invalid minor pattern: {msg}"),
        }
    }
}

impl std::error::Error for CompareError {}
