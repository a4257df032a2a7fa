use crate::algebra;
use crate::cancel::{CancelToken, Cancellation};
use crate::classify::Classifier;
use crate::config::CompareOptions;
use crate::error::CompareError;
use crate::loader::load_all;
use crate::matrix::build_matrix;
use crate::model::{Category, ComparisonReport, Dataset, RawDataset, ReportMeta};
use crate::report::summarize;

/// Run a comparison with no cancellation other than `options.deadline`.
pub fn run(options: &CompareOptions, inputs: &[RawDataset]) -> Result<ComparisonReport, CompareError> {
    run_with_cancel(options, inputs, &CancelToken::new())
}

/// Load, classify and compare. Schema problems fail the whole run; a fired
/// token or deadline yields a report with `complete = false`.
pub fn run_with_cancel(
    options: &CompareOptions,
    inputs: &[RawDataset],
    token: &CancelToken,
) -> Result<ComparisonReport, CompareError> {
    let datasets = load_all(inputs, &options.required_fields())?;
    compare_loaded(options, &datasets, token)
}

/// Compare datasets that are already loaded.
pub fn compare_loaded(
    options: &CompareOptions,
    datasets: &[Dataset],
    token: &CancelToken,
) -> Result<ComparisonReport, CompareError> {
    crate::loader::check_labels(datasets.iter().map(|d| d.label.as_str()))?;

    let cancel = Cancellation::start(token.clone(), options.deadline);
    let classifier = Classifier::new(options)?;
    let buckets = classifier.classify_all(datasets);

    log::info!(
        "comparing {} datasets by {} (minor by {})",
        datasets.len(),
        options.join_key,
        options.key_for(Category::Minor)
    );

    let comparison = algebra::compare(datasets, &buckets, options, &cancel);
    let matrix = build_matrix(&buckets);

    match comparison.cancelled {
        Some(reason) => log::warn!(
            "comparison stopped early ({reason}); {} entries kept",
            comparison.result.len()
        ),
        None => log::info!("{} combination entries", comparison.result.len()),
    }

    let meta = ReportMeta {
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        join_key: options.join_key,
        minor_join_key: options.key_for(Category::Minor),
        minor_pattern: options.minor.pattern().to_string(),
        datasets: datasets.iter().map(|d| d.label.clone()).collect(),
    };

    Ok(summarize(
        meta,
        datasets,
        &buckets,
        comparison.result,
        matrix,
        comparison.cancelled,
    ))
}
