// CSV/TSV loading of test-run exports

use std::io::Read;
use std::path::Path;

use casematrix_compare::model::{RawDataset, RawRow};

use crate::error::IoError;
use crate::fields::resolve_headers;

/// A parsed table: header row plus data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Load one export as a labeled, field-resolved dataset.
pub fn load_raw_dataset(path: &Path, label: &str) -> Result<RawDataset, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    let table = read_table(&content, delimiter).map_err(|message| IoError::Csv {
        path: path.to_path_buf(),
        message,
    })?;
    let fields = resolve_headers(&table.headers);
    log::debug!(
        "{}: {} columns, {} rows, delimiter {:?}",
        path.display(),
        table.headers.len(),
        table.rows.len(),
        delimiter as char
    );
    Ok(RawDataset::new(label, fields, table.rows))
}

/// Parse delimited text. The first record is the header row; a failure there
/// is an error, a failure on any later record becomes a malformed row.
pub fn read_table(content: &str, delimiter: u8) -> Result<Table, String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let headers = match records.next() {
        None => Vec::new(),
        Some(Ok(record)) => record.iter().map(str::to_string).collect(),
        Some(Err(e)) => return Err(format!("header row: {e}")),
    };

    let rows = records
        .map(|result| match result {
            Ok(record) => RawRow::cells(record.iter()),
            Err(e) => RawRow::Malformed(e.to_string()),
        })
        .collect();

    Ok(Table { headers, rows })
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| field_count(line, delim))
            .collect();

        let Some(&target) = counts.first() else {
            break;
        };
        if target <= 1 {
            continue;
        }

        // More columns breaks ties
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok())
        .map(|r| r.len())
        .unwrap_or(1)
}

/// Read file and convert to UTF-8 if needed (Excel exports are often Windows-1252).
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let read_err = |e: std::io::Error| IoError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let mut file = std::fs::File::open(path).map_err(read_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(read_err)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            log::debug!("{}: not UTF-8, decoding as Windows-1252", path.display());
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}
