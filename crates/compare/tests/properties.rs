// Property-based tests for the combination algebra and similarity matrix.
// CI: 128 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::{HashMap, HashSet};

use casematrix_compare::algebra::exclusive_keys;
use casematrix_compare::model::{CanonicalField, CombinationKey};
use casematrix_compare::{run, Category, CompareOptions, FieldMap, RawDataset, RawRow};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_128() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(128),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn arb_status() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => Just("Passed".to_string()),
        3 => Just("failed".to_string()),
        1 => Just("Blocked".to_string()),
    ]
}

fn arb_comment() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => Just(String::new()),
        1 => Just("minor UI nit".to_string()),
        1 => Just("Minority".to_string()),
    ]
}

/// One dataset: rows over a small case universe so overlaps are common.
fn arb_rows() -> impl Strategy<Value = Vec<(u8, String, String)>> {
    prop::collection::vec((0u8..12, arb_status(), arb_comment()), 0..20)
}

fn arb_inputs() -> impl Strategy<Value = Vec<RawDataset>> {
    prop::collection::vec(arb_rows(), 2..6).prop_map(|datasets| {
        let fields = FieldMap::new()
            .with(CanonicalField::CaseId, 0)
            .with(CanonicalField::Status, 1)
            .with(CanonicalField::Comment, 2);
        datasets
            .into_iter()
            .enumerate()
            .map(|(i, rows)| {
                let rows = rows
                    .into_iter()
                    .map(|(case, status, comment)| RawRow::cells([format!("C{case}"), status, comment]))
                    .collect();
                RawDataset::new(format!("run{i}"), fields.clone(), rows)
            })
            .collect()
    })
}

fn key_sets(report: &casematrix_compare::ComparisonReport, category: Category) -> Vec<HashSet<String>> {
    report
        .labels()
        .iter()
        .map(|label| {
            report
                .listing(label, category)
                .iter()
                .map(|r| r.case_id.clone())
                .collect()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_128())]

    /// Exclusive sets partition the union: each key in exactly one entry,
    /// and that entry is the key's membership set.
    #[test]
    fn exclusive_sets_partition_the_union(inputs in arb_inputs()) {
        let report = run(&CompareOptions::default(), &inputs).unwrap();
        prop_assert!(report.complete);

        for category in Category::ALL {
            let sets = key_sets(&report, category);
            let union: HashSet<&String> = sets.iter().flatten().collect();

            let mut owner: HashMap<String, CombinationKey> = HashMap::new();
            for entry in report.comparisons.for_category(category) {
                prop_assert!(!entry.records.is_empty());
                let refs: Vec<&HashSet<String>> = sets.iter().collect();
                let expected = exclusive_keys(&refs, &entry.key);
                let distinct: HashSet<&str> = entry.records.iter().map(|r| r.case_id.as_str()).collect();
                prop_assert_eq!(&distinct, &expected);
                for key in distinct {
                    if let Some(prev) = owner.insert(key.to_string(), entry.key.clone()) {
                        prop_assert_eq!(&prev, &entry.key);
                    }
                }
            }
            prop_assert_eq!(owner.len(), union.len());
        }
    }

    /// Jaccard scores stay in [0, 1]; 1 exactly for equal non-empty sets,
    /// 0 exactly for disjoint or empty sets.
    #[test]
    fn jaccard_bounds(inputs in arb_inputs()) {
        let report = run(&CompareOptions::default(), &inputs).unwrap();
        let n = inputs.len();
        prop_assert_eq!(report.matrix.len(), n * (n - 1) / 2);

        for category in Category::ALL {
            let sets = key_sets(&report, category);
            for entry in &report.matrix {
                prop_assert!(entry.left < entry.right);
                let o = entry.overlap(category);
                prop_assert!((0.0..=1.0).contains(&o.jaccard));

                let (a, b) = (&sets[entry.left], &sets[entry.right]);
                prop_assert_eq!(o.jaccard == 1.0, a == b && !a.is_empty());
                prop_assert_eq!(o.jaccard == 0.0, a.is_disjoint(b));
            }
        }
    }

    /// Sequential and threaded runs produce the same report.
    #[test]
    fn parallel_matches_sequential(inputs in arb_inputs()) {
        let seq = CompareOptions { parallel: false, ..CompareOptions::default() };
        let a = run(&seq, &inputs).unwrap();
        let b = run(&CompareOptions::default(), &inputs).unwrap();
        prop_assert_eq!(a, b);
    }
}
