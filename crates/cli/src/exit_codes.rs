//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract. Scripts rely on them.
//!
//! | Code | Meaning                                                          |
//! |------|------------------------------------------------------------------|
//! | 0    | Success                                                          |
//! | 1    | General error (unspecified, export/IO failure)                   |
//! | 2    | CLI usage error (bad args, unknown `--label` file)               |
//! | 3    | Decode failure: every file failed, or any file with `--strict`   |
//! | 4    | Invalid manifest or settings file                                |
//! | 5    | No entries to show and `--fail-empty` was given                  |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant below
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, conflicting options.
pub const EXIT_USAGE: u8 = 2;

/// No file in the batch could be decoded, or `--strict` and at least one failed.
pub const EXIT_DECODE: u8 = 3;

/// Manifest TOML or settings JSON failed to parse or validate.
pub const EXIT_CONFIG: u8 = 4;

/// The visible result set is empty and `--fail-empty` was requested.
pub const EXIT_NO_RESULTS: u8 = 5;
