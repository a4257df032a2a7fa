//! Combinatorial set algebra across datasets.
//!
//! For a category C and a combination S of datasets, the exclusive set is
//! `∩ C(D) for D in S  −  ∪ C(D') for D' not in S`. Every key in the union
//! of C belongs to exactly one such set: the combination of all datasets
//! that contain it. The engine therefore indexes each key by its membership
//! and only materializes combinations that are non-empty, instead of
//! testing all 2^N subsets. Output order is the canonical
//! [`CombinationKey`] order (size, then input order).

use std::collections::{BTreeMap, HashMap, HashSet};
use std::thread;

use crate::cancel::{CancelReason, Cancellation};
use crate::config::CompareOptions;
use crate::model::{
    Category, CombinationEntry, CombinationKey, ComparisonResult, Dataset, DatasetBuckets,
    JoinKey, TestRecord,
};

/// Keys visited between cancellation checks while indexing memberships.
const CHECK_INTERVAL: usize = 1024;

/// Result of comparing one category.
#[derive(Debug, Clone)]
pub struct CategoryComparison {
    pub category: Category,
    pub entries: Vec<CombinationEntry>,
    pub cancelled: Option<CancelReason>,
}

/// Result of comparing all categories.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub result: ComparisonResult,
    pub cancelled: Option<CancelReason>,
}

/// Group every key of `category` by the exact set of datasets containing it.
pub fn memberships<'a>(
    buckets: &'a [DatasetBuckets],
    category: Category,
    cancel: &Cancellation,
) -> Result<BTreeMap<CombinationKey, HashSet<&'a str>>, CancelReason> {
    let mut seen_in: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut visited = 0usize;

    for (i, b) in buckets.iter().enumerate() {
        for key in b.keys(category) {
            seen_in.entry(key.as_str()).or_default().push(i);
            visited += 1;
            if visited % CHECK_INTERVAL == 0 {
                if let Some(reason) = cancel.check() {
                    return Err(reason);
                }
            }
        }
    }

    let mut groups: BTreeMap<CombinationKey, HashSet<&str>> = BTreeMap::new();
    for (key, members) in seen_in {
        groups
            .entry(CombinationKey::new(members))
            .or_default()
            .insert(key);
    }
    Ok(groups)
}

/// `∩ sets[i] for i in combo − ∪ sets[j] for j not in combo`, evaluated
/// literally. Reference definition of an exclusive set.
pub fn exclusive_keys<'a>(sets: &[&'a HashSet<String>], combo: &CombinationKey) -> HashSet<&'a str> {
    let Some(first) = combo.representative() else {
        return HashSet::new();
    };
    let Some(base) = sets.get(first) else {
        return HashSet::new();
    };

    base.iter()
        .filter(|key| {
            sets.iter().enumerate().all(|(j, set)| {
                let inside = combo.contains(j);
                set.contains(key.as_str()) == inside
            })
        })
        .map(String::as_str)
        .collect()
}

/// Compute all non-empty exclusive combinations for one category.
///
/// Records are taken from the combination's representative dataset (first
/// in input order), keeping that dataset's row order and duplicates.
pub fn compare_category(
    datasets: &[Dataset],
    buckets: &[DatasetBuckets],
    category: Category,
    join: JoinKey,
    cancel: &Cancellation,
) -> CategoryComparison {
    let labels: Vec<String> = datasets.iter().map(|d| d.label.clone()).collect();

    let groups = match memberships(buckets, category, cancel) {
        Ok(groups) => groups,
        Err(reason) => {
            log::warn!("{category}: {reason} while indexing memberships");
            return CategoryComparison {
                category,
                entries: Vec::new(),
                cancelled: Some(reason),
            };
        }
    };

    let mut entries = Vec::with_capacity(groups.len());
    for (key, members) in groups {
        if let Some(reason) = cancel.check() {
            log::warn!(
                "{category}: {reason} after {} of the combination entries",
                entries.len()
            );
            return CategoryComparison {
                category,
                entries,
                cancelled: Some(reason),
            };
        }

        let Some(rep) = key.representative() else {
            continue;
        };
        let (Some(dataset), Some(bucket)) = (datasets.get(rep), buckets.get(rep)) else {
            continue;
        };

        let records: Vec<TestRecord> = bucket
            .bucket(category)
            .records
            .iter()
            .filter_map(|&i| dataset.records.get(i))
            .filter(|r| members.contains(join.key_of(r)))
            .cloned()
            .collect();

        if records.is_empty() {
            continue;
        }

        entries.push(CombinationEntry {
            category,
            labels: key.labels(&labels),
            name: key.name(&labels),
            key,
            records,
        });
    }

    log::debug!("{category}: {} combination entries", entries.len());
    CategoryComparison {
        category,
        entries,
        cancelled: None,
    }
}

/// Compare every category, on scoped threads when `options.parallel`.
pub fn compare(
    datasets: &[Dataset],
    buckets: &[DatasetBuckets],
    options: &CompareOptions,
    cancel: &Cancellation,
) -> Comparison {
    let outcomes: Vec<CategoryComparison> = if options.parallel {
        thread::scope(|scope| {
            let handles: Vec<_> = Category::ALL
                .iter()
                .map(|&category| {
                    let join = options.key_for(category);
                    scope.spawn(move || compare_category(datasets, buckets, category, join, cancel))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        })
    } else {
        Category::ALL
            .iter()
            .map(|&category| {
                compare_category(datasets, buckets, category, options.key_for(category), cancel)
            })
            .collect()
    };

    let cancelled = outcomes.iter().find_map(|o| o.cancelled);
    let entries = outcomes.into_iter().flat_map(|o| o.entries).collect();

    Comparison {
        result: ComparisonResult::from_entries(entries),
        cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::classify::Classifier;
    use crate::model::NO_PLAN;

    fn rec(case_id: &str, status: &str) -> TestRecord {
        TestRecord {
            row: 0,
            test_id: None,
            case_id: case_id.into(),
            title: format!("title {case_id}"),
            status: status.into(),
            comment: String::new(),
            plan: NO_PLAN.into(),
            tested_by: None,
        }
    }

    fn ds(label: &str, rows: &[(&str, &str)]) -> Dataset {
        Dataset {
            label: label.into(),
            records: rows.iter().map(|(c, s)| rec(c, s)).collect(),
            skipped: vec![],
        }
    }

    fn classify(datasets: &[Dataset]) -> Vec<DatasetBuckets> {
        Classifier::new(&CompareOptions::default())
            .unwrap()
            .classify_all(datasets)
    }

    fn case_ids(records: &[TestRecord]) -> Vec<&str> {
        records.iter().map(|r| r.case_id.as_str()).collect()
    }

    #[test]
    fn three_way_failed_partition() {
        let datasets = vec![
            ds("A", &[("T9", "failed"), ("T1", "failed"), ("T5", "failed")]),
            ds("B", &[("T9", "failed"), ("T5", "failed"), ("T2", "failed")]),
            ds("C", &[("T9", "passed"), ("T5", "failed")]),
        ];
        let buckets = classify(&datasets);
        let out = compare_category(&datasets, &buckets, Category::Failed, JoinKey::CaseId, &Cancellation::none());

        let keys: Vec<&[usize]> = out.entries.iter().map(|e| e.key.indices()).collect();
        assert_eq!(keys, vec![&[0][..], &[1], &[0, 1], &[0, 1, 2]]);
        assert_eq!(case_ids(&out.entries[0].records), vec!["T1"]);
        assert_eq!(case_ids(&out.entries[1].records), vec!["T2"]);
        assert_eq!(case_ids(&out.entries[2].records), vec!["T9"]);
        assert_eq!(out.entries[2].name, "A_and_B");
        assert_eq!(case_ids(&out.entries[3].records), vec!["T5"]);
        assert_eq!(out.entries[3].name, "all_files");
        assert!(out.cancelled.is_none());
    }

    #[test]
    fn records_come_from_first_dataset_with_duplicates() {
        let mut a = ds("A", &[("T1", "failed"), ("T1", "failed")]);
        a.records[1].comment = "second run".into();
        let b = ds("B", &[("T1", "failed")]);
        let datasets = vec![a, b];
        let buckets = classify(&datasets);
        let out = compare_category(&datasets, &buckets, Category::Failed, JoinKey::CaseId, &Cancellation::none());
        assert_eq!(out.entries.len(), 1);
        assert_eq!(out.entries[0].records.len(), 2);
        assert_eq!(out.entries[0].records[1].comment, "second run");
    }

    #[test]
    fn exclusive_keys_literal_definition() {
        let a: HashSet<String> = ["1", "2", "3"].iter().map(|s| s.to_string()).collect();
        let b: HashSet<String> = ["2", "3", "4"].iter().map(|s| s.to_string()).collect();
        let c: HashSet<String> = ["3"].iter().map(|s| s.to_string()).collect();
        let sets = [&a, &b, &c];

        let only_a = exclusive_keys(&sets, &CombinationKey::single(0));
        assert_eq!(only_a, HashSet::from(["1"]));
        let ab = exclusive_keys(&sets, &CombinationKey::new([0, 1]));
        assert_eq!(ab, HashSet::from(["2"]));
        let all = exclusive_keys(&sets, &CombinationKey::all(3));
        assert_eq!(all, HashSet::from(["3"]));
        assert!(exclusive_keys(&sets, &CombinationKey::new([1, 2])).is_empty());
    }

    #[test]
    fn memberships_match_literal_definition() {
        let datasets = vec![
            ds("A", &[("1", "passed"), ("2", "passed"), ("3", "passed")]),
            ds("B", &[("2", "passed"), ("3", "passed"), ("4", "passed")]),
            ds("C", &[("3", "passed"), ("5", "passed")]),
        ];
        let buckets = classify(&datasets);
        let groups = memberships(&buckets, Category::Passed, &Cancellation::none()).unwrap();
        let sets: Vec<&HashSet<String>> = buckets.iter().map(|b| b.keys(Category::Passed)).collect();
        for (key, members) in &groups {
            assert_eq!(members, &exclusive_keys(&sets, key), "combination {key:?}");
        }
        assert_eq!(groups.len(), 5);
    }

    #[test]
    fn cancelled_token_yields_partial_result() {
        let datasets = vec![ds("A", &[("1", "failed")]), ds("B", &[("1", "failed")])];
        let buckets = classify(&datasets);
        let token = CancelToken::new();
        token.cancel();
        let cancel = Cancellation::start(token, None);
        let out = compare(&datasets, &buckets, &CompareOptions::default(), &cancel);
        assert_eq!(out.cancelled, Some(CancelReason::Token));
        assert!(out.result.is_empty());
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let datasets = vec![
            ds("A", &[("1", "failed"), ("2", "passed"), ("3", "passed")]),
            ds("B", &[("1", "failed"), ("2", "failed"), ("3", "passed")]),
            ds("C", &[("1", "passed"), ("4", "failed")]),
        ];
        let buckets = classify(&datasets);
        let seq = CompareOptions { parallel: false, ..CompareOptions::default() };
        let par = CompareOptions { parallel: true, ..CompareOptions::default() };
        let a = compare(&datasets, &buckets, &seq, &Cancellation::none());
        let b = compare(&datasets, &buckets, &par, &Cancellation::none());
        assert_eq!(a.result, b.result);
    }
}
