use crate::cancel::CancelReason;
use crate::model::{
    CategoryListing, Category, ComparisonReport, ComparisonResult, Dataset, DatasetBuckets,
    DatasetSummary, EntryCount, ReportMeta, ReportSummary, SimilarityEntry, SkippedRow,
};

/// Per-dataset category counts (rows, duplicates included).
pub fn dataset_summaries(datasets: &[Dataset], buckets: &[DatasetBuckets]) -> Vec<DatasetSummary> {
    datasets
        .iter()
        .zip(buckets)
        .map(|(ds, b)| DatasetSummary {
            label: ds.label.clone(),
            total: ds.records.len(),
            failed: b.bucket(Category::Failed).len(),
            passed: b.bucket(Category::Passed).len(),
            minor: b.bucket(Category::Minor).len(),
            skipped_rows: ds.skipped.len(),
        })
        .collect()
}

pub fn entry_counts(comparisons: &ComparisonResult) -> Vec<EntryCount> {
    comparisons
        .entries()
        .iter()
        .map(|e| EntryCount {
            category: e.category,
            name: e.name.clone(),
            labels: e.labels.clone(),
            count: e.records.len(),
        })
        .collect()
}

/// Full category listings, per dataset in input order, Failed/Passed/Minor.
pub fn listings(datasets: &[Dataset], buckets: &[DatasetBuckets]) -> Vec<CategoryListing> {
    let mut out = Vec::with_capacity(datasets.len() * Category::ALL.len());
    for (ds, b) in datasets.iter().zip(buckets) {
        for category in Category::ALL {
            out.push(CategoryListing {
                dataset: ds.label.clone(),
                category,
                records: b
                    .bucket(category)
                    .records
                    .iter()
                    .filter_map(|&i| ds.records.get(i))
                    .cloned()
                    .collect(),
            });
        }
    }
    out
}

/// Assemble the immutable report from the finished (or cancelled) stages.
pub fn summarize(
    meta: ReportMeta,
    datasets: &[Dataset],
    buckets: &[DatasetBuckets],
    comparisons: ComparisonResult,
    matrix: Vec<SimilarityEntry>,
    cancelled: Option<CancelReason>,
) -> ComparisonReport {
    let skipped: Vec<SkippedRow> = datasets
        .iter()
        .flat_map(|ds| ds.skipped.iter().cloned())
        .collect();

    let summary = ReportSummary {
        datasets: dataset_summaries(datasets, buckets),
        entries: entry_counts(&comparisons),
        skipped_rows: skipped.len(),
    };

    ComparisonReport {
        meta,
        summary,
        listings: listings(datasets, buckets),
        comparisons,
        matrix,
        skipped,
        complete: cancelled.is_none(),
        cancelled,
    }
}
