//! `casematrix run | compare | validate`

use std::path::{Path, PathBuf};

use serde::Serialize;

use casematrix_compare::loader::load_all;
use casematrix_compare::{
    compare_loaded, CancelToken, CompareConfig, CompareOptions, ComparisonReport, RawDataset,
};
use casematrix_io::{csv, json, xlsx};

use crate::exit_codes::{EXIT_INCOMPLETE, EXIT_IO};
use crate::CliError;

/// JSON document written by `--json` / `--output`.
#[derive(Serialize)]
struct RunOutput<'a> {
    generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    report: &'a ComparisonReport,
}

/// Where results go.
#[derive(Debug, Default)]
struct Outputs {
    json_stdout: bool,
    json_file: Option<PathBuf>,
    xlsx: Option<PathBuf>,
}

pub fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    xlsx_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = read_config(&config_path)?;

    // Resolve file paths relative to config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let raws = config
        .datasets
        .iter()
        .map(|ds| csv::load_raw_dataset(&base_dir.join(&ds.file), &ds.label))
        .collect::<Result<Vec<_>, _>>()?;

    let outputs = Outputs {
        json_stdout: json_output,
        json_file: output_file.or_else(|| config.output.json.as_ref().map(|p| base_dir.join(p))),
        xlsx: xlsx_file.or_else(|| config.output.xlsx.as_ref().map(|p| base_dir.join(p))),
    };

    execute(Some(config.name.as_str()), &config.options(), &raws, &outputs)
}

pub fn cmd_compare(
    files: Vec<PathBuf>,
    labels: Vec<String>,
    options: CompareOptions,
    json_output: bool,
    output_file: Option<PathBuf>,
    xlsx_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let labels = resolve_labels(&files, labels)?;

    let raws = files
        .iter()
        .zip(&labels)
        .map(|(path, label)| csv::load_raw_dataset(path, label))
        .collect::<Result<Vec<_>, _>>()?;

    let outputs = Outputs {
        json_stdout: json_output,
        json_file: output_file,
        xlsx: xlsx_file,
    };

    execute(None, &options, &raws, &outputs)
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    let options = config.options();
    eprintln!(
        "{}: ok ({} datasets, join by {}, minor pattern {})",
        config.name,
        config.datasets.len(),
        options.join_key,
        options.minor
    );
    for ds in &config.datasets {
        eprintln!("  {} <- {}", ds.label, ds.file);
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<CompareConfig, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        CliError::new(EXIT_IO, format!("cannot read config {}: {e}", path.display()))
    })?;
    Ok(CompareConfig::from_toml(&text)?)
}

/// Explicit labels must match the file count; otherwise use file stems.
fn resolve_labels(files: &[PathBuf], labels: Vec<String>) -> Result<Vec<String>, CliError> {
    if labels.is_empty() {
        return Ok(files.iter().map(|f| label_from_path(f)).collect());
    }
    if labels.len() != files.len() {
        return Err(CliError::usage(format!(
            "{} label(s) for {} file(s)",
            labels.len(),
            files.len()
        ))
        .with_hint("pass --label once per file, or omit it to use file names"));
    }
    Ok(labels)
}

fn label_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn execute(
    name: Option<&str>,
    options: &CompareOptions,
    raws: &[RawDataset],
    outputs: &Outputs,
) -> Result<(), CliError> {
    let datasets = load_all(raws, &options.required_fields())?;
    log::debug!(
        "loaded {} datasets, {} records",
        datasets.len(),
        datasets.iter().map(|d| d.records.len()).sum::<usize>()
    );
    let report = compare_loaded(options, &datasets, &CancelToken::new())?;

    let envelope = RunOutput {
        generated_at: chrono::Utc::now().to_rfc3339(),
        name,
        report: &report,
    };

    if let Some(ref path) = outputs.json_file {
        json::export(&envelope, path)?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(ref path) = outputs.xlsx {
        let result = xlsx::export(&report, &datasets, path)?;
        eprintln!("wrote {} ({} sheets)", path.display(), result.sheets_exported);
        for (full, name) in &result.renamed_sheets {
            eprintln!("  sheet '{full}' written as '{name}'");
        }
    }

    if outputs.json_stdout {
        println!("{}", json::to_string(&envelope)?);
    }

    print_summary(&report);

    if let Some(reason) = report.cancelled {
        return Err(CliError::new(
            EXIT_INCOMPLETE,
            format!("comparison incomplete: {reason}"),
        )
        .with_hint("outputs hold partial results; raise the deadline to finish"));
    }
    Ok(())
}

/// Human summary to stderr
fn print_summary(report: &ComparisonReport) {
    let s = &report.summary;
    eprintln!(
        "compared {} datasets by {} (minor by {}, pattern {}): {} combination entries",
        s.datasets.len(),
        report.meta.join_key,
        report.meta.minor_join_key,
        report.meta.minor_pattern,
        s.entries.len(),
    );
    for ds in &s.datasets {
        let skipped = match ds.skipped_rows {
            0 => String::new(),
            n => format!(", {n} skipped row(s)"),
        };
        eprintln!(
            "  {}: {} records, {} failed, {} passed, {} minor{skipped}",
            ds.label, ds.total, ds.failed, ds.passed, ds.minor,
        );
    }
    for entry in &s.entries {
        eprintln!("  {:<7} {:<30} {}", entry.category.to_string(), entry.name, entry.count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_default_to_file_stems() {
        let files = vec![PathBuf::from("runs/nightly.csv"), PathBuf::from("rc1.csv")];
        assert_eq!(resolve_labels(&files, vec![]).unwrap(), vec!["nightly", "rc1"]);
    }

    #[test]
    fn label_count_must_match() {
        let files = vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")];
        let err = resolve_labels(&files, vec!["only".into()]).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
        assert!(err.hint.is_some());
    }
}
