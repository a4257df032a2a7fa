use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::cancel::CancelReason;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Semantic role of a column after header resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalField {
    TestId,
    CaseId,
    Title,
    Status,
    Comment,
    Plan,
    TestedBy,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 7] = [
        Self::TestId,
        Self::Title,
        Self::CaseId,
        Self::Comment,
        Self::Plan,
        Self::Status,
        Self::TestedBy,
    ];

    /// Column header used in record listings.
    pub fn header(&self) -> &'static str {
        match self {
            Self::TestId => "ID",
            Self::CaseId => "Case ID",
            Self::Title => "Title",
            Self::Status => "Status",
            Self::Comment => "Comment",
            Self::Plan => "Plan",
            Self::TestedBy => "Tested By",
        }
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.header())
    }
}

/// Column positions for each resolved canonical field of one dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    columns: HashMap<CanonicalField, usize>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: CanonicalField, column: usize) -> Self {
        self.insert(field, column);
        self
    }

    pub fn insert(&mut self, field: CanonicalField, column: usize) {
        self.columns.insert(field, column);
    }

    pub fn get(&self, field: CanonicalField) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.columns.contains_key(&field)
    }
}

/// One raw input row. `Malformed` carries the upstream parser's reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRow {
    Cells(Vec<String>),
    Malformed(String),
}

impl RawRow {
    pub fn cells<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Cells(cells.into_iter().map(Into::into).collect())
    }
}

/// A labeled, field-resolved input table as handed over by the loader layer.
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub label: String,
    pub fields: FieldMap,
    pub rows: Vec<RawRow>,
}

impl RawDataset {
    pub fn new(label: impl Into<String>, fields: FieldMap, rows: Vec<RawRow>) -> Self {
        Self {
            label: label.into(),
            fields,
            rows,
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Plan value used when the source has no plan column or an empty cell.
pub const NO_PLAN: &str = "No Plan";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRecord {
    /// 1-based data row in the source (header excluded).
    pub row: usize,
    pub test_id: Option<String>,
    pub case_id: String,
    pub title: String,
    pub status: String,
    pub comment: String,
    pub plan: String,
    pub tested_by: Option<String>,
}

impl TestRecord {
    /// Value of a canonical field, as displayed in listings.
    pub fn field(&self, field: CanonicalField) -> &str {
        match field {
            CanonicalField::TestId => self.test_id.as_deref().unwrap_or(""),
            CanonicalField::CaseId => &self.case_id,
            CanonicalField::Title => &self.title,
            CanonicalField::Status => &self.status,
            CanonicalField::Comment => &self.comment,
            CanonicalField::Plan => &self.plan,
            CanonicalField::TestedBy => self.tested_by.as_deref().unwrap_or(""),
        }
    }
}

/// A row the loader could not turn into a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub dataset: String,
    pub row: usize,
    pub reason: String,
}

/// A loaded dataset. Never mutated after loading.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub label: String,
    pub records: Vec<TestRecord>,
    pub skipped: Vec<SkippedRow>,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Failed,
    Passed,
    Minor,
}

impl Category {
    pub const ALL: [Category; 3] = [Self::Failed, Self::Passed, Self::Minor];

    pub fn index(&self) -> usize {
        match self {
            Self::Failed => 0,
            Self::Passed => 1,
            Self::Minor => 2,
        }
    }

    /// Capitalized name, used for sheet and column titles.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Failed => "Failed",
            Self::Passed => "Passed",
            Self::Minor => "Minor",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed => write!(f, "failed"),
            Self::Passed => write!(f, "passed"),
            Self::Minor => write!(f, "minor"),
        }
    }
}

/// Which record field identifies a case across datasets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKey {
    #[default]
    CaseId,
    Title,
}

impl JoinKey {
    pub fn key_of<'a>(&self, record: &'a TestRecord) -> &'a str {
        match self {
            Self::CaseId => &record.case_id,
            Self::Title => &record.title,
        }
    }

    pub fn field(&self) -> CanonicalField {
        match self {
            Self::CaseId => CanonicalField::CaseId,
            Self::Title => CanonicalField::Title,
        }
    }
}

impl std::fmt::Display for JoinKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CaseId => write!(f, "case_id"),
            Self::Title => write!(f, "title"),
        }
    }
}

/// Records of one dataset falling into one category.
#[derive(Debug, Clone, Default)]
pub struct Bucket {
    /// Indices into `Dataset::records`, in source order. Duplicated keys keep
    /// every row.
    pub records: Vec<usize>,
    /// Distinct join keys of those records.
    pub keys: HashSet<String>,
}

impl Bucket {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

/// Per-category buckets of one dataset. Every category is always present,
/// possibly empty.
#[derive(Debug, Clone)]
pub struct DatasetBuckets {
    pub label: String,
    buckets: [Bucket; 3],
}

impl DatasetBuckets {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            buckets: Default::default(),
        }
    }

    pub fn bucket(&self, category: Category) -> &Bucket {
        &self.buckets[category.index()]
    }

    pub fn bucket_mut(&mut self, category: Category) -> &mut Bucket {
        &mut self.buckets[category.index()]
    }

    pub fn keys(&self, category: Category) -> &HashSet<String> {
        &self.bucket(category).keys
    }
}

// ---------------------------------------------------------------------------
// Combinations
// ---------------------------------------------------------------------------

/// A non-empty subset of datasets, stored as ascending input indices.
///
/// Ordering is by size first, then lexicographic on indices, which is the
/// canonical output order of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CombinationKey(Vec<usize>);

impl CombinationKey {
    /// Build a key from dataset indices. Order and duplicates are normalized.
    pub fn new(indices: impl IntoIterator<Item = usize>) -> Self {
        let mut indices: Vec<usize> = indices.into_iter().collect();
        indices.sort_unstable();
        indices.dedup();
        Self(indices)
    }

    pub fn single(index: usize) -> Self {
        Self(vec![index])
    }

    /// The combination of all `n` datasets.
    pub fn all(n: usize) -> Self {
        Self((0..n).collect())
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.binary_search(&index).is_ok()
    }

    /// Dataset whose rows are used to materialize this combination's records.
    pub fn representative(&self) -> Option<usize> {
        self.0.first().copied()
    }

    pub fn labels(&self, labels: &[String]) -> Vec<String> {
        self.0
            .iter()
            .filter_map(|&i| labels.get(i).cloned())
            .collect()
    }

    /// Display name: `{label}_only`, `all_files`, or labels joined by `_and_`.
    pub fn name(&self, labels: &[String]) -> String {
        let parts = self.labels(labels);
        if parts.len() == 1 {
            format!("{}_only", parts[0])
        } else if self.0.len() == labels.len() {
            "all_files".to_string()
        } else {
            parts.join("_and_")
        }
    }
}

impl Ord for CombinationKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for CombinationKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinationEntry {
    pub category: Category,
    pub key: CombinationKey,
    pub labels: Vec<String>,
    pub name: String,
    pub records: Vec<TestRecord>,
}

/// All non-empty combination entries, ordered by category then key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ComparisonResult {
    entries: Vec<CombinationEntry>,
}

impl ComparisonResult {
    pub fn from_entries(mut entries: Vec<CombinationEntry>) -> Self {
        entries.retain(|e| !e.records.is_empty());
        entries.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.key.cmp(&b.key)));
        Self { entries }
    }

    pub fn entries(&self) -> &[CombinationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn for_category(&self, category: Category) -> impl Iterator<Item = &CombinationEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    pub fn get(&self, category: Category, key: &CombinationKey) -> Option<&CombinationEntry> {
        self.entries
            .iter()
            .find(|e| e.category == category && &e.key == key)
    }

    /// Records for a combination; empty when the combination produced nothing.
    pub fn records(&self, category: Category, key: &CombinationKey) -> &[TestRecord] {
        self.get(category, key)
            .map(|e| e.records.as_slice())
            .unwrap_or(&[])
    }

    /// Records in `category` found only in dataset `index`.
    pub fn exclusive_to(&self, category: Category, index: usize) -> &[TestRecord] {
        self.records(category, &CombinationKey::single(index))
    }
}

// ---------------------------------------------------------------------------
// Similarity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Overlap {
    pub intersection: usize,
    pub union: usize,
    pub jaccard: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityEntry {
    pub left: usize,
    pub right: usize,
    pub left_label: String,
    pub right_label: String,
    pub failed: Overlap,
    pub passed: Overlap,
    pub minor: Overlap,
}

impl SimilarityEntry {
    pub fn overlap(&self, category: Category) -> &Overlap {
        match category {
            Category::Failed => &self.failed,
            Category::Passed => &self.passed,
            Category::Minor => &self.minor,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub label: String,
    pub total: usize,
    pub failed: usize,
    pub passed: usize,
    pub minor: usize,
    pub skipped_rows: usize,
}

impl DatasetSummary {
    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::Failed => self.failed,
            Category::Passed => self.passed,
            Category::Minor => self.minor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryCount {
    pub category: Category,
    pub name: String,
    pub labels: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub datasets: Vec<DatasetSummary>,
    pub entries: Vec<EntryCount>,
    pub skipped_rows: usize,
}

/// All records of one category in one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryListing {
    pub dataset: String,
    pub category: Category,
    pub records: Vec<TestRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportMeta {
    pub engine_version: String,
    pub join_key: JoinKey,
    pub minor_join_key: JoinKey,
    pub minor_pattern: String,
    pub datasets: Vec<String>,
}

/// Immutable output of one comparison run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub meta: ReportMeta,
    pub summary: ReportSummary,
    pub comparisons: ComparisonResult,
    pub matrix: Vec<SimilarityEntry>,
    pub listings: Vec<CategoryListing>,
    pub skipped: Vec<SkippedRow>,
    /// False when the run was cancelled and `comparisons` is partial.
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled: Option<CancelReason>,
}

impl ComparisonReport {
    pub fn labels(&self) -> &[String] {
        &self.meta.datasets
    }

    pub fn listing(&self, dataset: &str, category: Category) -> &[TestRecord] {
        self.listings
            .iter()
            .find(|l| l.dataset == dataset && l.category == category)
            .map(|l| l.records.as_slice())
            .unwrap_or(&[])
    }
}
