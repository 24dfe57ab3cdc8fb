//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                            |
//! |------|----------------------------------------------------|
//! | 0    | Success                                            |
//! | 1    | General error (unspecified)                        |
//! | 2    | CLI usage error (bad args, unknown column)         |
//! | 3    | Workbook could not be loaded (read, fetch, decode) |
//! | 4    | Report export failed                               |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown column names.
pub const EXIT_USAGE: u8 = 2;

/// The workbook could not be read, fetched or decoded.
pub const EXIT_LOAD: u8 = 3;

/// The export surface failed to write the report.
pub const EXIT_EXPORT: u8 = 4;
