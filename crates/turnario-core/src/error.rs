//! Error types for roster and session operations.

use thiserror::Error;
use turnario_store::StoreError;

use crate::grid::GridError;
use crate::name::NameError;

/// Errors from roster operations.
#[derive(Debug, Error)]
pub enum RosterError {
    /// The supplied name failed validation. Local, never contacts remote.
    #[error("invalid doctor name: {0}")]
    InvalidName(#[from] NameError),

    /// The name is already on the roster (case- and accent-insensitive).
    /// Local, never contacts remote.
    #[error("doctor already listed: {0}")]
    Duplicate(String),

    /// The name is not on the roster. Local, never contacts remote.
    #[error("doctor not in roster: {0}")]
    Unknown(String),

    /// The remote operation failed; the in-memory roster is unchanged.
    /// A `Conflict` means concurrent modification: reload and retry.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RosterError {
    /// True for failures caught before any network I/O.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RosterError::InvalidName(_) | RosterError::Duplicate(_) | RosterError::Unknown(_)
        )
    }
}

/// Errors from session command handlers.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Grid(#[from] GridError),

    /// A doctor was selected for planning that the roster does not know.
    #[error("cannot plan unknown doctor: {0}")]
    NotInRoster(String),

    /// A grid operation was requested before any doctors were selected.
    #[error("no schedule grid: no doctors selected")]
    NoGrid,
}
