//! Holiday-calendar lookup collaborator.
//!
//! The grid does not know where holiday data comes from; it is handed a
//! lookup at generation time. Implementations must degrade to an empty
//! mapping on failure or missing data, never error.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use tracing::warn;

/// Holidays of one year: date to holiday name.
pub type HolidayMap = BTreeMap<NaiveDate, String>;

/// Source of public-holiday data for a country and year.
pub trait HolidayLookup {
    /// All holidays of `year` in `country`. Missing data or lookup
    /// failures yield an empty map.
    fn holidays(&self, country: &str, year: i32) -> HolidayMap;
}

/// Lookup with no data at all. Every day is a working day.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHolidays;

impl HolidayLookup for NoHolidays {
    fn holidays(&self, _country: &str, _year: i32) -> HolidayMap {
        HolidayMap::new()
    }
}

/// In-memory holiday table for a single country.
#[derive(Debug, Clone, Default)]
pub struct FixedHolidays {
    country: String,
    dates: HolidayMap,
}

impl FixedHolidays {
    pub fn new(
        country: impl Into<String>,
        entries: impl IntoIterator<Item = (NaiveDate, String)>,
    ) -> Self {
        Self {
            country: country.into(),
            dates: entries.into_iter().collect(),
        }
    }

    /// Build a table from a JSON object of `"YYYY-MM-DD": "Name"` pairs.
    /// Unparseable entries are skipped with a warning; an unusable value
    /// yields an empty table.
    pub fn from_json(country: impl Into<String>, value: &serde_json::Value) -> Self {
        let mut dates = HolidayMap::new();
        match value.as_object() {
            Some(map) => {
                for (raw_date, name) in map {
                    match (
                        NaiveDate::parse_from_str(raw_date, "%Y-%m-%d"),
                        name.as_str(),
                    ) {
                        (Ok(date), Some(name)) if !name.is_empty() => {
                            dates.insert(date, name.to_string());
                        }
                        _ => warn!(entry = %raw_date, "skipping unparseable holiday entry"),
                    }
                }
            }
            None => warn!("holiday table is not a JSON object, proceeding without holidays"),
        }
        Self {
            country: country.into(),
            dates,
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl HolidayLookup for FixedHolidays {
    fn holidays(&self, country: &str, year: i32) -> HolidayMap {
        if !self.country.eq_ignore_ascii_case(country) {
            return HolidayMap::new();
        }
        self.dates
            .iter()
            .filter(|(date, _)| date.year() == year)
            .map(|(date, name)| (*date, name.clone()))
            .collect()
    }
}
