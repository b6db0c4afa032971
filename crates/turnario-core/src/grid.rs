//! Monthly schedule grid.
//!
//! A grid is derived data: one row per calendar day of a (year, month),
//! one status column per active doctor. It is valid for exactly one
//! (year, month, doctor set) triple, recorded in its tag; any change to
//! that triple makes the grid stale and mandates regeneration, which
//! resets every status to Present. Edits are deliberately NOT carried
//! across a regeneration.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, Weekday};
use thiserror::Error;

use crate::holiday::HolidayLookup;
use crate::name::DoctorName;
use crate::status::AbsenceStatus;

/// Errors from grid construction and editing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("no such month: {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("edited grid was generated for a different month or doctor set")]
    TagMismatch,

    #[error("doctor not active in this grid: {0}")]
    UnknownDoctor(String),

    #[error("date not in this grid: {0}")]
    UnknownDate(NaiveDate),
}

/// The (year, month, doctor set) triple a grid was generated from.
///
/// Compared structurally; a mismatch with the current selection is the
/// staleness signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridTag {
    pub year: i32,
    pub month: u32,
    pub doctors: BTreeSet<DoctorName>,
}

/// One calendar day of the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRow {
    pub date: NaiveDate,
    pub weekday: Weekday,
    /// Holiday name when the day is a public holiday. Presence of the
    /// name IS the holiday flag, so the two can never disagree.
    pub holiday: Option<String>,
    /// Clinic runs Monday, Wednesday, and Friday, holidays excepted.
    pub clinic_day: bool,
    statuses: BTreeMap<DoctorName, AbsenceStatus>,
}

impl DayRow {
    pub fn is_holiday(&self) -> bool {
        self.holiday.is_some()
    }

    pub fn holiday_name(&self) -> &str {
        self.holiday.as_deref().unwrap_or("")
    }

    pub fn status(&self, doctor: &DoctorName) -> Option<AbsenceStatus> {
        self.statuses.get(doctor).copied()
    }

    pub fn statuses(&self) -> impl Iterator<Item = (&DoctorName, AbsenceStatus)> {
        self.statuses.iter().map(|(name, status)| (name, *status))
    }
}

/// Number of days in a month, `None` for an invalid (year, month).
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}

fn is_clinic_weekday(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Mon | Weekday::Wed | Weekday::Fri)
}

/// The per-month day × doctor status table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleGrid {
    tag: GridTag,
    rows: Vec<DayRow>,
}

impl ScheduleGrid {
    /// Derive a fresh grid for a month.
    ///
    /// Enumerates every day of the month in ascending order; every doctor
    /// starts as Present. The holiday lookup is consulted once; its
    /// contract is to return an empty map rather than fail, so generation
    /// is total for any valid (year, month).
    pub fn generate(
        year: i32,
        month: u32,
        doctors: BTreeSet<DoctorName>,
        lookup: &dyn HolidayLookup,
        country: &str,
    ) -> Result<Self, GridError> {
        let days = days_in_month(year, month).ok_or(GridError::InvalidMonth { year, month })?;
        let holidays = lookup.holidays(country, year);

        let mut rows = Vec::with_capacity(days as usize);
        for day in 1..=days {
            let date = NaiveDate::from_ymd_opt(year, month, day)
                .ok_or(GridError::InvalidMonth { year, month })?;
            let weekday = date.weekday();
            let holiday = holidays.get(&date).cloned();
            let clinic_day = is_clinic_weekday(weekday) && holiday.is_none();
            let statuses = doctors
                .iter()
                .map(|doctor| (doctor.clone(), AbsenceStatus::Present))
                .collect();

            rows.push(DayRow {
                date,
                weekday,
                holiday,
                clinic_day,
                statuses,
            });
        }

        Ok(Self {
            tag: GridTag {
                year,
                month,
                doctors,
            },
            rows,
        })
    }

    pub fn tag(&self) -> &GridTag {
        &self.tag
    }

    pub fn year(&self) -> i32 {
        self.tag.year
    }

    pub fn month(&self) -> u32 {
        self.tag.month
    }

    pub fn doctors(&self) -> &BTreeSet<DoctorName> {
        &self.tag.doctors
    }

    pub fn rows(&self) -> &[DayRow] {
        &self.rows
    }

    /// Whether this grid no longer matches the current selection.
    pub fn is_stale(&self, year: i32, month: u32, doctors: &BTreeSet<DoctorName>) -> bool {
        self.tag.year != year || self.tag.month != month || &self.tag.doctors != doctors
    }

    /// Read one cell.
    pub fn status(&self, date: NaiveDate, doctor: &DoctorName) -> Option<AbsenceStatus> {
        self.row(date).and_then(|row| row.status(doctor))
    }

    fn row(&self, date: NaiveDate) -> Option<&DayRow> {
        // Rows are sorted by construction.
        self.rows
            .binary_search_by_key(&date, |row| row.date)
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Edit one cell in place.
    pub fn set_status(
        &mut self,
        date: NaiveDate,
        doctor: &DoctorName,
        status: AbsenceStatus,
    ) -> Result<(), GridError> {
        if !self.tag.doctors.contains(doctor) {
            return Err(GridError::UnknownDoctor(doctor.to_string()));
        }
        let idx = self
            .rows
            .binary_search_by_key(&date, |row| row.date)
            .map_err(|_| GridError::UnknownDate(date))?;
        self.rows[idx].statuses.insert(doctor.clone(), status);
        Ok(())
    }

    /// Merge an edited copy of this grid back in.
    ///
    /// The edited grid must carry the same tag (dates are immutable within
    /// a generation, so rows match positionally by date identity). Doctor
    /// columns are overwritten row-wise; re-applying the same edits is a
    /// no-op.
    pub fn merge_edits(&mut self, edited: &ScheduleGrid) -> Result<(), GridError> {
        if edited.tag != self.tag {
            return Err(GridError::TagMismatch);
        }

        for (row, edited_row) in self.rows.iter_mut().zip(&edited.rows) {
            debug_assert_eq!(row.date, edited_row.date);
            for (doctor, status) in &edited_row.statuses {
                if row.statuses.contains_key(doctor) {
                    row.statuses.insert(doctor.clone(), *status);
                }
            }
        }
        Ok(())
    }
}
