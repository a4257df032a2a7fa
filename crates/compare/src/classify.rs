use regex::Regex;

use crate::config::CompareOptions;
use crate::error::CompareError;
use crate::model::{Category, Dataset, DatasetBuckets, JoinKey, TestRecord};

/// Partitions records into Passed / Failed / Minor buckets.
///
/// Passed and Failed come from the status (case-insensitive exact match),
/// Minor from the comment (configured regex). A record may be in Minor and
/// in one of the other two at the same time.
#[derive(Debug, Clone)]
pub struct Classifier {
    minor: Regex,
    keys: [JoinKey; 3],
}

impl Classifier {
    pub fn new(options: &CompareOptions) -> Result<Self, CompareError> {
        Ok(Self {
            minor: options.minor.compile()?,
            keys: Category::ALL.map(|c| options.key_for(c)),
        })
    }

    pub fn is_passed(status: &str) -> bool {
        status.to_lowercase() == "passed"
    }

    pub fn is_failed(status: &str) -> bool {
        status.to_lowercase() == "failed"
    }

    pub fn is_minor(&self, comment: &str) -> bool {
        self.minor.is_match(comment)
    }

    pub fn matches(&self, category: Category, record: &TestRecord) -> bool {
        match category {
            Category::Passed => Self::is_passed(&record.status),
            Category::Failed => Self::is_failed(&record.status),
            Category::Minor => self.is_minor(&record.comment),
        }
    }

    pub fn key_for(&self, category: Category) -> JoinKey {
        self.keys[category.index()]
    }

    /// Bucket every record by category. A record whose join key for a
    /// category is blank cannot be matched across datasets and stays out of
    /// that category only.
    pub fn classify(&self, dataset: &Dataset) -> DatasetBuckets {
        let mut buckets = DatasetBuckets::new(dataset.label.clone());
        let mut unkeyed = 0usize;
        for (idx, record) in dataset.records.iter().enumerate() {
            for category in Category::ALL {
                if !self.matches(category, record) {
                    continue;
                }
                let key = self.key_for(category).key_of(record);
                if key.trim().is_empty() {
                    unkeyed += 1;
                    continue;
                }
                let bucket = buckets.bucket_mut(category);
                bucket.records.push(idx);
                bucket.keys.insert(key.to_string());
            }
        }
        if unkeyed > 0 {
            log::warn!(
                "dataset '{}': {unkeyed} categorized record(s) have a blank join key",
                dataset.label
            );
        }
        log::debug!(
            "dataset '{}': {} failed, {} passed, {} minor",
            dataset.label,
            buckets.bucket(Category::Failed).len(),
            buckets.bucket(Category::Passed).len(),
            buckets.bucket(Category::Minor).len(),
        );
        buckets
    }

    pub fn classify_all(&self, datasets: &[Dataset]) -> Vec<DatasetBuckets> {
        datasets.iter().map(|ds| self.classify(ds)).collect()
    }
}
