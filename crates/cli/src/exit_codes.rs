//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad args, label/file count mismatch)    |
//! | 3    | Schema error (too few datasets, bad labels, missing column) |
//! | 4    | I/O error (read, write, sheet name collision)        |
//! | 5    | Incomplete: cancelled or deadline exceeded           |
//! | 6    | Invalid config or minor pattern                      |

use casematrix_compare::CompareError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// A dataset failed schema checks before any comparison ran.
pub const EXIT_SCHEMA: u8 = 3;

/// Reading inputs or writing outputs failed.
pub const EXIT_IO: u8 = 4;

/// Report was written but is partial (`complete = false`).
pub const EXIT_INCOMPLETE: u8 = 5;

/// Config file or minor regex rejected.
pub const EXIT_INVALID_CONFIG: u8 = 6;

/// Map an engine error to its exit code.
pub fn compare_exit_code(err: &CompareError) -> u8 {
    match err {
        e if e.is_schema() => EXIT_SCHEMA,
        CompareError::ConfigParse(_)
        | CompareError::ConfigValidation(_)
        | CompareError::InvalidPattern(_) => EXIT_INVALID_CONFIG,
        _ => EXIT_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_SCHEMA,
            EXIT_IO,
            EXIT_INCOMPLETE,
            EXIT_INVALID_CONFIG,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn engine_errors_map_to_codes() {
        assert_eq!(compare_exit_code(&CompareError::TooFewDatasets(1)), EXIT_SCHEMA);
        assert_eq!(
            compare_exit_code(&CompareError::MissingField { dataset: "a".into(), field: "Status".into() }),
            EXIT_SCHEMA
        );
        assert_eq!(compare_exit_code(&CompareError::InvalidPattern("x".into())), EXIT_INVALID_CONFIG);
        assert_eq!(compare_exit_code(&CompareError::ConfigParse("x".into())), EXIT_INVALID_CONFIG);
    }
}
