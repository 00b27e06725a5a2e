//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success                                                  |
//! | 1    | General error (unspecified)                              |
//! | 2    | Usage error (bad args, missing database path)            |
//! | 3    | Run finished with unresolved findings under `--strict`   |
//! | 4    | Invalid run config                                       |
//! | 5    | Runtime error (unreadable input, missing season)         |
//! | 6    | Store error (SQLite failure, malformed reference rows)   |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// `--strict` run left unknown team names or multiply-matched groups behind.
/// Games that could be reconciled were still persisted.
pub const EXIT_UNRESOLVED: u8 = 3;

/// Config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 4;

/// Input could not be read or the engine rejected the batch.
pub const EXIT_RUNTIME: u8 = 5;

/// Database could not be opened, read or written.
pub const EXIT_STORE: u8 = 6;
