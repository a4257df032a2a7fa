use std::collections::HashSet;

use crate::error::CompareError;
use crate::model::{CanonicalField, Dataset, RawDataset, RawRow, SkippedRow, TestRecord, NO_PLAN};

/// Check the labeled inputs as a whole: at least two, labels non-empty and
/// distinct.
pub fn check_labels<'a, I>(labels: I) -> Result<(), CompareError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut count = 0;
    for (position, label) in labels.into_iter().enumerate() {
        if label.trim().is_empty() {
            return Err(CompareError::EmptyLabel(position));
        }
        if !seen.insert(label) {
            return Err(CompareError::DuplicateLabel(label.to_string()));
        }
        count += 1;
    }
    if count < 2 {
        return Err(CompareError::TooFewDatasets(count));
    }
    Ok(())
}

/// Verify that every required field resolved for this dataset.
pub fn check_fields(raw: &RawDataset, required: &[CanonicalField]) -> Result<(), CompareError> {
    for &field in required {
        if !raw.fields.contains(field) {
            return Err(CompareError::MissingField {
                dataset: raw.label.clone(),
                field: field.header().to_string(),
            });
        }
    }
    Ok(())
}

/// Validate all inputs, then turn each into a typed [`Dataset`].
///
/// Schema problems on any dataset abort before a single row is read.
/// Malformed rows are skipped and recorded on the dataset.
pub fn load_all(
    raws: &[RawDataset],
    required: &[CanonicalField],
) -> Result<Vec<Dataset>, CompareError> {
    check_labels(raws.iter().map(|r| r.label.as_str()))?;
    for raw in raws {
        check_fields(raw, required)?;
    }
    Ok(raws.iter().map(|raw| load_rows(raw, required)).collect())
}

/// Load one dataset. Fails only on unresolved required fields.
pub fn load_dataset(raw: &RawDataset, required: &[CanonicalField]) -> Result<Dataset, CompareError> {
    check_fields(raw, required)?;
    Ok(load_rows(raw, required))
}

fn load_rows(raw: &RawDataset, required: &[CanonicalField]) -> Dataset {
    let mut records = Vec::with_capacity(raw.rows.len());
    let mut skipped = Vec::new();

    for (i, row) in raw.rows.iter().enumerate() {
        let row_no = i + 1;
        let parsed = match row {
            RawRow::Malformed(reason) => Err(reason.clone()),
            RawRow::Cells(cells) => parse_row(raw, cells, row_no, required),
        };
        match parsed {
            Ok(record) => records.push(record),
            Err(reason) => skipped.push(SkippedRow {
                dataset: raw.label.clone(),
                row: row_no,
                reason,
            }),
        }
    }

    if skipped.is_empty() {
        log::debug!("dataset '{}': loaded {} records", raw.label, records.len());
    } else {
        log::warn!(
            "dataset '{}': loaded {} records, skipped {} malformed row(s)",
            raw.label,
            records.len(),
            skipped.len()
        );
    }

    Dataset {
        label: raw.label.clone(),
        records,
        skipped,
    }
}

fn parse_row(
    raw: &RawDataset,
    cells: &[String],
    row: usize,
    required: &[CanonicalField],
) -> Result<TestRecord, String> {
    let cell = |field: CanonicalField| -> Option<&str> {
        raw.fields
            .get(field)
            .and_then(|idx| cells.get(idx))
            .map(String::as_str)
    };

    // Blank values are kept; the classifier leaves a record out of any
    // category whose join key it lacks.
    if let Some(&field) = required.iter().find(|&&f| cell(f).is_none()) {
        return Err(format!(
            "row has {} cell(s), no value for '{}'",
            cells.len(),
            field.header()
        ));
    }

    let non_empty = |field: CanonicalField| -> Option<String> {
        cell(field).filter(|v| !v.trim().is_empty()).map(str::to_string)
    };

    Ok(TestRecord {
        row,
        test_id: non_empty(CanonicalField::TestId),
        case_id: cell(CanonicalField::CaseId).unwrap_or_default().to_string(),
        title: cell(CanonicalField::Title).unwrap_or_default().to_string(),
        status: cell(CanonicalField::Status).unwrap_or_default().to_string(),
        comment: cell(CanonicalField::Comment).unwrap_or_default().to_string(),
        plan: non_empty(CanonicalField::Plan).unwrap_or_else(|| NO_PLAN.to_string()),
        tested_by: non_empty(CanonicalField::TestedBy),
    })
}
