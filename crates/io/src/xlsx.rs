// Excel export of a comparison report (xlsx only)
//
// Presentation snapshot: raw data per dataset, category listings, one sheet
// per exclusive combination, and the pairwise similarity matrix.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use casematrix_compare::model::{CanonicalField, Category, ComparisonReport, Dataset, TestRecord};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::error::IoError;

/// Excel's sheet name length limit, in characters.
pub const MAX_SHEET_NAME: usize = 31;
/// Characters kept before the ellipsis when a name is too long.
const TRUNCATED_PREFIX: usize = 28;
const ELLIPSIS: &str = "...";
const FORBIDDEN: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

pub const MATRIX_SHEET: &str = "Comparison_Matrix";
const MATRIX_HEADERS: [&str; 8] = [
    "File 1",
    "File 2",
    "Failed Overlap",
    "Failed Jaccard",
    "Passed Overlap",
    "Passed Jaccard",
    "Minor Overlap",
    "Minor Jaccard",
];

/// Export statistics
#[derive(Debug, Default, Clone)]
pub struct ExportResult {
    /// Number of sheets written
    pub sheets_exported: usize,
    /// Data rows written across all sheets (headers excluded)
    pub rows_exported: usize,
    /// (full name, sheet name) for every sheet written under a different
    /// name, whether sanitized, truncated or both
    pub renamed_sheets: Vec<(String, String)>,
    /// Time taken to build and save the workbook
    pub export_duration_ms: u128,
}

/// Excel-safe sheet name: forbidden characters and edge apostrophes become
/// `_`; names over 31 characters keep the first 28 plus `...`.
pub fn sheet_name(raw: &str) -> String {
    let last = raw.chars().count().saturating_sub(1);
    let cleaned: String = raw
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if FORBIDDEN.contains(&c) || (c == '\'' && (i == 0 || i == last)) {
                '_'
            } else {
                c
            }
        })
        .collect();

    if cleaned.chars().count() <= MAX_SHEET_NAME {
        return cleaned;
    }
    let mut short: String = cleaned.chars().take(TRUNCATED_PREFIX).collect();
    short.push_str(ELLIPSIS);
    short
}

enum SheetBody<'a> {
    Records(&'a [TestRecord]),
    Matrix,
}

struct PlannedSheet<'a> {
    full_name: String,
    name: String,
    body: SheetBody<'a>,
}

/// Lay out every sheet in export order and reject name collisions, which
/// Excel compares case-insensitively.
fn plan_sheets<'a>(
    report: &'a ComparisonReport,
    datasets: &'a [Dataset],
) -> Result<Vec<PlannedSheet<'a>>, IoError> {
    let mut sources: Vec<(String, SheetBody<'a>)> = Vec::new();

    for ds in datasets {
        sources.push((format!("All_Data_{}", ds.label), SheetBody::Records(&ds.records)));
    }
    for ds in datasets {
        for category in Category::ALL {
            sources.push((
                format!("All_{}_{}", category.title(), ds.label),
                SheetBody::Records(report.listing(&ds.label, category)),
            ));
        }
    }
    for entry in report.comparisons.entries() {
        sources.push((
            format!("{}_in_{}", entry.category.title(), entry.name),
            SheetBody::Records(&entry.records),
        ));
    }
    sources.push((MATRIX_SHEET.to_string(), SheetBody::Matrix));

    let mut taken: HashMap<String, String> = HashMap::new();
    let mut planned = Vec::with_capacity(sources.len());
    for (full_name, body) in sources {
        let name = sheet_name(&full_name);
        if let Some(first) = taken.insert(name.to_lowercase(), full_name.clone()) {
            return Err(IoError::SheetNameCollision {
                sheet: name,
                first,
                second: full_name,
            });
        }
        planned.push(PlannedSheet { full_name, name, body });
    }
    Ok(planned)
}

/// Export a comparison report to XLSX.
///
/// `datasets` supplies the raw `All_Data_*` sheets and must be the datasets
/// the report was computed from.
pub fn export(
    report: &ComparisonReport,
    datasets: &[Dataset],
    path: &Path,
) -> Result<ExportResult, IoError> {
    let start_time = Instant::now();
    let mut result = ExportResult::default();

    let planned = plan_sheets(report, datasets)?;
    let header = Format::new().set_bold();
    let mut workbook = Workbook::new();

    for sheet in &planned {
        if sheet.name != sheet.full_name {
            result
                .renamed_sheets
                .push((sheet.full_name.clone(), sheet.name.clone()));
        }

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        let rows = match &sheet.body {
            SheetBody::Records(records) => write_records(worksheet, records, &header)?,
            SheetBody::Matrix => write_matrix(worksheet, report, &header)?,
        };
        result.rows_exported += rows;
        result.sheets_exported += 1;
    }

    workbook.save(path)?;

    result.export_duration_ms = start_time.elapsed().as_millis();
    log::info!(
        "wrote {} sheets ({} rows) to {}",
        result.sheets_exported,
        result.rows_exported,
        path.display()
    );
    for (full, short) in &result.renamed_sheets {
        log::debug!("sheet '{full}' written as '{short}'");
    }
    Ok(result)
}

fn write_header(worksheet: &mut Worksheet, headers: &[&str], format: &Format) -> Result<(), XlsxError> {
    for (col, title) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, format)?;
    }
    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_records(
    worksheet: &mut Worksheet,
    records: &[TestRecord],
    header: &Format,
) -> Result<usize, XlsxError> {
    let titles: Vec<&str> = CanonicalField::ALL.iter().map(|f| f.header()).collect();
    write_header(worksheet, &titles, header)?;

    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        for (col, field) in CanonicalField::ALL.iter().enumerate() {
            let value = record.field(*field);
            if !value.is_empty() {
                worksheet.write_string(row, col as u16, value)?;
            }
        }
    }
    Ok(records.len())
}

fn write_matrix(
    worksheet: &mut Worksheet,
    report: &ComparisonReport,
    header: &Format,
) -> Result<usize, XlsxError> {
    write_header(worksheet, &MATRIX_HEADERS, header)?;

    for (i, entry) in report.matrix.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, entry.left_label.as_str())?;
        worksheet.write_string(row, 1, entry.right_label.as_str())?;
        for (k, category) in Category::ALL.iter().enumerate() {
            let overlap = entry.overlap(*category);
            let col = 2 + (k as u16) * 2;
            worksheet.write_number(row, col, overlap.intersection as f64)?;
            worksheet.write_number(row, col + 1, overlap.jaccard)?;
        }
    }
    Ok(report.matrix.len())
}
