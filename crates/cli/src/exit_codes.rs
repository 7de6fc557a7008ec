//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, bad format)   |
//! | 3-9     | input/output     | Files, sheets, settings                  |
//! | 10-19   | recon            | Reconciliation outcome codes             |
//! | 20-29   | serve            | HTTP service start-up                    |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unsupported file extension.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Input/output (3-9)
// =============================================================================

/// Input file missing or unreadable, output file not writable.
pub const EXIT_IO: u8 = 3;

/// Input is not a usable sheet (corrupt workbook, no header found).
pub const EXIT_INVALID_FILE: u8 = 4;

/// Settings file fails to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 5;

// =============================================================================
// Recon (10-19)
// =============================================================================

/// At least one report row is not `OK` (only with `--fail-on-divergence`).
pub const EXIT_RECON_DIVERGENT: u8 = 10;

// =============================================================================
// Serve (20-29)
// =============================================================================

/// Listener cannot bind, CORS origin invalid, or the server loop failed.
pub const EXIT_SERVE: u8 = 20;
