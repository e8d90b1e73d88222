//! Unified error types for the sensor node.
//!
//! Every variant is `Copy` so errors can be handed from the config store to
//! the command handlers and the event sink without allocation.  Nothing here
//! is fatal: each error path leaves the node running on a previously valid
//! configuration.

use core::fmt;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A configuration record field violates its range.  Recovered locally by
/// substituting the factory default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    BusAddressOutOfRange(u8),
    BuzzerProfileOutOfRange(u8),
    LedProfileOutOfRange(u8),
    /// The stored bytes could not be decoded at all.
    Undecodable,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusAddressOutOfRange(v) => write!(f, "node id {v} outside 2-127"),
            Self::BuzzerProfileOutOfRange(v) => write!(f, "buzzer profile {v} outside 0-3"),
            Self::LedProfileOutOfRange(v) => write!(f, "LED profile {v} outside 0-3"),
            Self::Undecodable => write!(f, "record undecodable"),
        }
    }
}

impl core::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// Flash / store
// ---------------------------------------------------------------------------

/// Low-level failure reported by a [`FlashPort`](crate::app::ports::FlashPort).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashError {
    EraseFailed,
    ProgramFailed,
    /// Offset lies outside the reserved page or is not word aligned.
    OutOfBounds,
}

impl core::error::Error for FlashError {}

impl fmt::Display for FlashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EraseFailed => write!(f, "page erase failed"),
            Self::ProgramFailed => write!(f, "word program failed"),
            Self::OutOfBounds => write!(f, "offset out of bounds"),
        }
    }
}

/// `ConfigStore::store` failed.  The persisted copy may be erased or
/// partially programmed; the in-memory configuration is untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    Erase(FlashError),
    Program { offset: usize, cause: FlashError },
    /// The record could not be serialised into program words.
    Encode,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Erase(e) => write!(f, "erase: {e}"),
            Self::Program { offset, cause } => write!(f, "program at +{offset:#x}: {cause}"),
            Self::Encode => write!(f, "record encoding failed"),
        }
    }
}

impl core::error::Error for StoreError {}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    UnknownCommand,
    /// Wrong number of arguments.
    WrongArity,
    /// Argument is not a number.
    InvalidValue,
    OutOfRange,
    Store(StoreError),
    /// The console output could not be written.
    Output,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::WrongArity => write!(f, "wrong number of arguments"),
            Self::InvalidValue => write!(f, "invalid value"),
            Self::OutOfRange => write!(f, "value out of range"),
            Self::Store(e) => write!(f, "store failed: {e}"),
            Self::Output => write!(f, "console write failed"),
        }
    }
}

impl From<StoreError> for CommandError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<fmt::Error> for CommandError {
    fn from(_: fmt::Error) -> Self {
        Self::Output
    }
}

impl core::error::Error for CommandError {}
