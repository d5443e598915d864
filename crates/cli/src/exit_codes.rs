//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success (skipped groups/contacts included) |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, unknown source) |
//! | 3       | Universal        | File IO error                            |
//! | 60-69   | extract          | Source adapter failures                  |
//! | 70-79   | merge            | Reconciliation codes                     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use rostermerge_core::ExtractError;

// =============================================================================
// Universal (0-3)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options, unknown source.
pub const EXIT_USAGE: u8 = 2;

/// IO error - cannot read input or write output.
pub const EXIT_IO: u8 = 3;

// =============================================================================
// Extract (60-69)
// =============================================================================

/// Groups could not be listed after all retries. No contact file written.
pub const EXIT_EXTRACT_CONNECT: u8 = 60;

/// Source rejected the session or request (auth, 4xx, unreadable snapshot).
pub const EXIT_EXTRACT_PERMANENT: u8 = 61;

// =============================================================================
// Merge (70-79)
// =============================================================================

/// Merge config failed to parse or validate.
pub const EXIT_MERGE_INVALID_CONFIG: u8 = 70;

/// Merge could not read a source file or write its outputs.
pub const EXIT_MERGE_RUNTIME: u8 = 71;

/// Map an extraction failure to its exit code.
pub fn extract_exit_code(err: &ExtractError) -> u8 {
    match err {
        ExtractError::Persist(_) => EXIT_IO,
        e if e.is_permanent() => EXIT_EXTRACT_PERMANENT,
        ExtractError::Connect { .. } => EXIT_EXTRACT_CONNECT,
        ExtractError::Aborted { .. } => EXIT_EXTRACT_PERMANENT,
    }
}
