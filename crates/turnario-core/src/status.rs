//! Absence status values for schedule cells.

use serde::{Deserialize, Serialize};

/// Per-day status of one doctor.
///
/// A closed set: the grid only ever holds one of these values per cell.
/// Serialized as snake_case; the Italian labels written by earlier
/// revisions of the data files are accepted on read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceStatus {
    #[default]
    #[serde(alias = "Presente")]
    Present,
    #[serde(alias = "Ferie")]
    Vacation,
    #[serde(alias = "Malattia")]
    Sick,
    #[serde(alias = "Congresso")]
    Conference,
    #[serde(alias = "Lezione")]
    Teaching,
    #[serde(alias = "Altro")]
    Other,
}

impl AbsenceStatus {
    /// Every status, in display order.
    pub const ALL: [AbsenceStatus; 6] = [
        AbsenceStatus::Present,
        AbsenceStatus::Vacation,
        AbsenceStatus::Sick,
        AbsenceStatus::Conference,
        AbsenceStatus::Teaching,
        AbsenceStatus::Other,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            AbsenceStatus::Present => "Present",
            AbsenceStatus::Vacation => "Vacation",
            AbsenceStatus::Sick => "Sick",
            AbsenceStatus::Conference => "Conference",
            AbsenceStatus::Teaching => "Teaching",
            AbsenceStatus::Other => "Other",
        }
    }
}

impl std::fmt::Display for AbsenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for AbsenceStatus {
    type Err = String;

    /// Parse a status label, case-insensitively. Accepts both the current
    /// labels and the legacy Italian ones.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "present" | "presente" => Ok(AbsenceStatus::Present),
            "vacation" | "ferie" => Ok(AbsenceStatus::Vacation),
            "sick" | "malattia" => Ok(AbsenceStatus::Sick),
            "conference" | "congresso" => Ok(AbsenceStatus::Conference),
            "teaching" | "lezione" => Ok(AbsenceStatus::Teaching),
            "other" | "altro" => Ok(AbsenceStatus::Other),
            other => Err(format!("unknown absence status: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_present() {
        assert_eq!(AbsenceStatus::default(), AbsenceStatus::Present);
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&AbsenceStatus::Vacation).unwrap();
        assert_eq!(json, "\"vacation\"");
    }

    #[test]
    fn reads_legacy_italian_labels() {
        for (legacy, expected) in [
            ("Presente", AbsenceStatus::Present),
            ("Ferie", AbsenceStatus::Vacation),
            ("Malattia", AbsenceStatus::Sick),
            ("Congresso", AbsenceStatus::Conference),
            ("Lezione", AbsenceStatus::Teaching),
            ("Altro", AbsenceStatus::Other),
        ] {
            let parsed: AbsenceStatus =
                serde_json::from_str(&format!("\"{}\"", legacy)).unwrap();
            assert_eq!(parsed, expected);
        }
    }

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!("FERIE".parse::<AbsenceStatus>(), Ok(AbsenceStatus::Vacation));
        assert_eq!(
            "vacation".parse::<AbsenceStatus>(),
            Ok(AbsenceStatus::Vacation)
        );
        assert!("holiday".parse::<AbsenceStatus>().is_err());
    }
}
