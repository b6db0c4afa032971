//! Doctor roster and monthly schedule grid for turnario.
//!
//! This crate holds the application's domain logic:
//!
//! - **Roster**: the authoritative doctor list, persisted remotely with
//!   optimistic concurrency and a local read fallback
//! - **Grid**: the derived per-month day × doctor status table, with
//!   structural staleness tracking and edit merging
//! - **Session**: explicit per-session state plus the command handlers
//!   that wire UI events to roster and grid mutations
//! - **Export**: CSV rendering of the full grid

pub mod error;
pub mod export;
pub mod grid;
pub mod holiday;
pub mod name;
pub mod roster;
pub mod session;
pub mod status;

pub use error::{RosterError, SessionError};
pub use grid::{DayRow, GridError, GridTag, ScheduleGrid, days_in_month};
pub use holiday::{FixedHolidays, HolidayLookup, HolidayMap, NoHolidays};
pub use name::{DoctorName, NameError};
pub use roster::{DEFAULT_ROSTER_PATH, DoctorRoster, parse_roster_document};
pub use session::{Redraw, Session};
pub use status::AbsenceStatus;
