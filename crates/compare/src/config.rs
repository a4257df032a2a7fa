use std::collections::HashSet;
use std::time::Duration;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::error::CompareError;
use crate::model::{CanonicalField, Category, JoinKey};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// A `.compare.toml` run file: which exports to compare and how.
#[derive(Debug, Clone, Deserialize)]
pub struct CompareConfig {
    pub name: String,
    #[serde(default)]
    pub join_key: JoinKey,
    /// Join key for the Minor category only. Falls back to `join_key`.
    #[serde(default)]
    pub minor_join_key: Option<JoinKey>,
    #[serde(default)]
    pub minor: MinorConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    pub datasets: Vec<DatasetConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub label: String,
    /// CSV path, relative to the config file.
    pub file: String,
}

// ---------------------------------------------------------------------------
// Minor detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MinorConfig {
    #[serde(default)]
    pub pattern: MinorPattern,
    /// Only read when `pattern = "custom"`. Blank is the same as absent.
    #[serde(default)]
    pub regex: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinorPattern {
    #[default]
    Minor,
    MinorOrBypass,
    Custom,
}

/// Resolved rule for detecting minor issues in a record's comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MinorRule {
    /// Whole word `minor`, any case.
    #[default]
    Minor,
    /// Whole word `minor` or `bypass`, any case.
    MinorOrBypass,
    /// Caller-supplied regex, compiled case-insensitive.
    Custom(String),
}

impl MinorRule {
    pub fn pattern(&self) -> &str {
        match self {
            Self::Minor => r"\bminor\b",
            Self::MinorOrBypass => r"\b(?:minor|bypass)\b",
            Self::Custom(p) => p,
        }
    }

    pub fn compile(&self) -> Result<Regex, CompareError> {
        RegexBuilder::new(self.pattern())
            .case_insensitive(true)
            .build()
            .map_err(|e| CompareError::InvalidPattern(e.to_string()))
    }
}

impl std::fmt::Display for MinorRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.pattern())
    }
}

// ---------------------------------------------------------------------------
// Limits + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default)]
    pub deadline_ms: Option<u64>,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            deadline_ms: None,
            parallel: default_parallel(),
        }
    }
}

fn default_parallel() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub xlsx: Option<String>,
    #[serde(default)]
    pub json: Option<String>,
}

// ---------------------------------------------------------------------------
// Engine options
// ---------------------------------------------------------------------------

/// Everything the engine needs besides the data itself.
#[derive(Debug, Clone)]
pub struct CompareOptions {
    pub join_key: JoinKey,
    pub minor_join_key: Option<JoinKey>,
    pub minor: MinorRule,
    pub deadline: Option<Duration>,
    /// Compute the three categories on scoped threads.
    pub parallel: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            join_key: JoinKey::CaseId,
            minor_join_key: None,
            minor: MinorRule::Minor,
            deadline: None,
            parallel: true,
        }
    }
}

impl CompareOptions {
    pub fn key_for(&self, category: Category) -> JoinKey {
        match category {
            Category::Minor => self.minor_join_key.unwrap_or(self.join_key),
            _ => self.join_key,
        }
    }

    /// Fields that must resolve on every dataset before loading starts.
    pub fn required_fields(&self) -> Vec<CanonicalField> {
        let mut fields = vec![CanonicalField::CaseId, CanonicalField::Status];
        if Category::ALL.iter().any(|&c| self.key_for(c) == JoinKey::Title) {
            fields.push(CanonicalField::Title);
        }
        fields
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl CompareConfig {
    pub fn from_toml(input: &str) -> Result<Self, CompareError> {
        let config: CompareConfig =
            toml::from_str(input).map_err(|e| CompareError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CompareError> {
        if self.datasets.len() < 2 {
            return Err(CompareError::ConfigValidation(format!(
                "at least two datasets required, found {}",
                self.datasets.len()
            )));
        }

        let mut seen = HashSet::new();
        for (i, ds) in self.datasets.iter().enumerate() {
            if ds.label.trim().is_empty() {
                return Err(CompareError::ConfigValidation(format!(
                    "dataset #{} has an empty label",
                    i + 1
                )));
            }
            if !seen.insert(ds.label.as_str()) {
                return Err(CompareError::ConfigValidation(format!(
                    "duplicate dataset label '{}'",
                    ds.label
                )));
            }
            if ds.file.trim().is_empty() {
                return Err(CompareError::ConfigValidation(format!(
                    "dataset '{}': file is empty",
                    ds.label
                )));
            }
        }

        // A blank `regex = ""` counts as unset.
        let regex = self.minor.regex.as_deref().filter(|r| !r.trim().is_empty());
        match (self.minor.pattern, regex) {
            (MinorPattern::Custom, None) => {
                return Err(CompareError::ConfigValidation(
                    "minor.pattern = \"custom\" requires minor.regex".into(),
                ));
            }
            (MinorPattern::Minor | MinorPattern::MinorOrBypass, Some(_)) => {
                return Err(CompareError::ConfigValidation(
                    "minor.regex is only read when minor.pattern = \"custom\"".into(),
                ));
            }
            _ => {}
        }
        self.minor_rule().compile()?;

        Ok(())
    }

    pub fn minor_rule(&self) -> MinorRule {
        match self.minor.pattern {
            MinorPattern::Minor => MinorRule::Minor,
            MinorPattern::MinorOrBypass => MinorRule::MinorOrBypass,
            MinorPattern::Custom => MinorRule::Custom(self.minor.regex.clone().unwrap_or_default()),
        }
    }

    pub fn options(&self) -> CompareOptions {
        CompareOptions {
            join_key: self.join_key,
            minor_join_key: self.minor_join_key,
            minor: self.minor_rule(),
            deadline: self.limits.deadline_ms.map(Duration::from_millis),
            parallel: self.limits.parallel,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
