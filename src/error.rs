//! Crate-wide error type
//!
//! Individual subsystems surface their own narrower error enums (see
//! [`crate::wire::DecodeError`], [`crate::hal::RadioError`]); this top-level
//! type exists for callers who just need "did `MeshCore` construction or a
//! one-shot CLI operation succeed."

/// Top-level error for operations that don't belong to one subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The radio failed to initialize; fatal at startup.
    RadioInit,
    /// An operation was attempted in a state that doesn't support it.
    InvalidState,
    /// A supplied parameter was out of range.
    InvalidParam,
}

/// Result type for the mesh core.
pub type Result<T> = core::result::Result<T, Error>;
