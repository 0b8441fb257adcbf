//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | CLI usage error (bad args)                           |
//! | 3    | Config could not be parsed or failed validation      |
//! | 4    | Runtime failure (unreadable input, malformed record) |
//! | 5    | `run --strict` left primary records unmatched        |

use rosterjoin_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config file is not valid TOML or violates a validation rule.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Input files unreadable, malformed records, unwritable outputs.
pub const EXIT_RUNTIME: u8 = 4;

/// `--strict` run where at least one primary record was dropped.
pub const EXIT_UNMATCHED: u8 = 5;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::MissingColumn { .. }
        | ReconError::MalformedRecord { .. }
        | ReconError::FieldParse { .. }
        | ReconError::Io(_) => EXIT_RUNTIME,
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
            EXIT_INVALID_CONFIG,
            EXIT_RUNTIME,
            EXIT_UNMATCHED,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn engine_errors_map_by_kind() {
        let err = ReconError::ConfigValidation("bad".into());
        assert_eq!(recon_exit_code(&err), EXIT_INVALID_CONFIG);
        let err = ReconError::MalformedRecord {
            dataset: "primary".into(),
            row: 1,
            field: "team".into(),
        };
        assert_eq!(recon_exit_code(&err), EXIT_RUNTIME);
    }
}
