//! Session state and command handlers.
//!
//! One `Session` per user session, created at start and discarded at the
//! end; there is no ambient global state. UI events arrive as explicit
//! commands; each handler mutates the session and reports what must be
//! redrawn. The grid is derived state: whenever the (year, month, active
//! doctor set) selection changes it is regenerated from scratch, which
//! intentionally discards in-progress edits.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{RosterError, SessionError};
use crate::grid::{GridError, ScheduleGrid, days_in_month};
use crate::holiday::HolidayLookup;
use crate::name::DoctorName;
use crate::roster::DoctorRoster;
use crate::status::AbsenceStatus;

/// What a command changed, and therefore what the caller must redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Redraw {
    pub roster: bool,
    pub grid: bool,
}

impl Redraw {
    pub const NOTHING: Redraw = Redraw {
        roster: false,
        grid: false,
    };
    pub const ROSTER: Redraw = Redraw {
        roster: true,
        grid: false,
    };
    pub const GRID: Redraw = Redraw {
        roster: false,
        grid: true,
    };
    pub const ALL: Redraw = Redraw {
        roster: true,
        grid: true,
    };
}

/// Per-session state: the roster, the current selection, and the grid
/// derived from them.
pub struct Session {
    roster: DoctorRoster,
    holidays: Arc<dyn HolidayLookup + Send + Sync>,
    country: String,
    year: i32,
    month: u32,
    active: BTreeSet<DoctorName>,
    grid: Option<ScheduleGrid>,
}

impl Session {
    /// Start a session on an already-loaded roster, positioned at the
    /// given month with no doctors selected yet.
    pub fn new(
        roster: DoctorRoster,
        holidays: Arc<dyn HolidayLookup + Send + Sync>,
        country: impl Into<String>,
        year: i32,
        month: u32,
    ) -> Result<Self, GridError> {
        if days_in_month(year, month).is_none() {
            return Err(GridError::InvalidMonth { year, month });
        }
        Ok(Self {
            roster,
            holidays,
            country: country.into(),
            year,
            month,
            active: BTreeSet::new(),
            grid: None,
        })
    }

    pub fn roster(&self) -> &DoctorRoster {
        &self.roster
    }

    /// The current grid, if any doctors are selected.
    pub fn grid(&self) -> Option<&ScheduleGrid> {
        self.grid.as_ref()
    }

    pub fn selection(&self) -> (i32, u32) {
        (self.year, self.month)
    }

    pub fn active_doctors(&self) -> &BTreeSet<DoctorName> {
        &self.active
    }

    /// Add a doctor to the roster. The new doctor is not auto-selected
    /// for planning, so the grid is untouched.
    pub async fn on_add_doctor(&mut self, raw: &str) -> Result<Redraw, RosterError> {
        self.roster.add(raw).await?;
        Ok(Redraw::ROSTER)
    }

    /// Remove a doctor from the roster. If the doctor was selected for
    /// planning, the selection shrinks and the grid is regenerated.
    pub async fn on_remove_doctor(&mut self, raw: &str) -> Result<Redraw, SessionError> {
        let removed = self.roster.remove(raw).await?;

        if self.active.remove(&removed) {
            debug!(doctor = %removed, "removed doctor was active, regenerating grid");
            self.refresh_grid()?;
            Ok(Redraw::ALL)
        } else {
            Ok(Redraw::ROSTER)
        }
    }

    /// Replace the set of doctors selected for planning. Every name must
    /// be a roster member. Regenerates the grid when the set changed.
    pub fn on_select_doctors<I, S>(&mut self, raws: I) -> Result<Redraw, SessionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selected = BTreeSet::new();
        for raw in raws {
            let member = self
                .roster
                .find(raw.as_ref())
                .ok_or_else(|| SessionError::NotInRoster(raw.as_ref().to_string()))?;
            selected.insert(member.clone());
        }

        if selected == self.active {
            return Ok(Redraw::NOTHING);
        }
        self.active = selected;
        self.refresh_grid()?;
        Ok(Redraw::GRID)
    }

    /// Move the session to another month. Regenerates the grid when the
    /// selection actually changed, discarding any edits.
    pub fn on_month_change(&mut self, year: i32, month: u32) -> Result<Redraw, SessionError> {
        if days_in_month(year, month).is_none() {
            return Err(GridError::InvalidMonth { year, month }.into());
        }
        if (year, month) == (self.year, self.month) {
            return Ok(Redraw::NOTHING);
        }
        self.year = year;
        self.month = month;
        self.refresh_grid()?;
        Ok(Redraw::GRID)
    }

    /// Edit one day × doctor cell in place.
    pub fn on_cell_edit(
        &mut self,
        date: NaiveDate,
        raw: &str,
        status: AbsenceStatus,
    ) -> Result<Redraw, SessionError> {
        let name = self
            .roster
            .find(raw)
            .ok_or_else(|| SessionError::NotInRoster(raw.to_string()))?
            .clone();
        let grid = self.grid.as_mut().ok_or(SessionError::NoGrid)?;
        grid.set_status(date, &name, status)?;
        Ok(Redraw::GRID)
    }

    /// Merge a bulk-edited copy of the grid back in (the table-editor
    /// path). The copy must come from the current generation.
    pub fn on_grid_edits(&mut self, edited: &ScheduleGrid) -> Result<Redraw, SessionError> {
        let grid = self.grid.as_mut().ok_or(SessionError::NoGrid)?;
        grid.merge_edits(edited)?;
        Ok(Redraw::GRID)
    }

    /// Regenerate the grid if it is stale for the current selection.
    fn refresh_grid(&mut self) -> Result<(), GridError> {
        if self.active.is_empty() {
            self.grid = None;
            return Ok(());
        }

        let stale = match &self.grid {
            None => true,
            Some(grid) => grid.is_stale(self.year, self.month, &self.active),
        };
        if stale {
            debug!(
                year = self.year,
                month = self.month,
                doctors = self.active.len(),
                "generating schedule grid"
            );
            self.grid = Some(ScheduleGrid::generate(
                self.year,
                self.month,
                self.active.clone(),
                self.holidays.as_ref(),
                &self.country,
            )?);
        }
        Ok(())
    }
}
