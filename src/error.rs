//! Error types for the driver.
//!
//! A degenerate triangle is deliberately not a variant here: it is silent
//! control flow inside triangle setup (a `None` return), never surfaced to
//! a caller.

use thiserror::Error;

/// Errors a caller of `rixgl` can observe.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// A display-list append failed because the backing buffer is full.
    /// The caller should flush the list to the bus and retry.
    #[error("display list out of memory")]
    OutOfDisplayListMemory,

    /// A `RenderObj` declared a draw mode this driver does not support.
    #[error("unsupported primitive draw mode: {mode}")]
    InvalidPrimitive { mode: u8 },
}
