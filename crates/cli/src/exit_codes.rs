//! CLI Exit Code Registry
//!
//! Single source of truth for `patchwork` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 1    | General error (unspecified)                               |
//! | 2    | Usage error (bad arguments; clap exits with 2 itself)     |
//! | 3    | Invalid config (parse, validation, missing/reserved cols) |
//! | 4    | Runtime failure (I/O, CSV parse, output write)            |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use patchwork_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
#[allow(dead_code)]
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options. Raised by clap itself.
#[allow(dead_code)]
pub const EXIT_USAGE: u8 = 2;

/// Config file or matching options are invalid, or name columns the data lacks.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Runtime failure (cannot read inputs, malformed CSV, cannot write outputs).
pub const EXIT_RUNTIME: u8 = 4;

/// Exit code for an engine error.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    if err.is_config() {
        EXIT_INVALID_CONFIG
    } else {
        EXIT_RUNTIME
    }
}
