//! Validated doctor names.
//!
//! Names are normalized once at the boundary and never mutated afterwards
//! (a rename is remove + add). Each name carries a derived comparison key
//! that ignores case and diacritics, so "ROSSI Mario" and "Rossi Màrio"
//! collide instead of duplicating a person.

use icu::casemap::CaseMapper;
use icu::normalizer::{ComposingNormalizer, DecomposingNormalizer};
use icu::properties::CodePointMapData;
use icu::properties::props::GeneralCategory;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Minimum name length in normalized characters.
const MIN_CHARS: usize = 2;

/// Maximum name length in normalized characters.
const MAX_CHARS: usize = 100;

/// Why a raw name was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("name is empty")]
    Empty,

    #[error("name too short ({0} characters, minimum {MIN_CHARS})")]
    TooShort(usize),

    #[error("name too long ({0} characters, maximum {MAX_CHARS})")]
    TooLong(usize),

    #[error("illegal character {0:?} in name")]
    IllegalChar(char),
}

/// A validated doctor display name.
///
/// Equality, ordering, and hashing all use the case- and accent-folded
/// key, so a roster keyed on `DoctorName` is duplicate-free in the sense
/// users expect.
#[derive(Debug, Clone)]
pub struct DoctorName {
    display: String,
    key: String,
}

impl DoctorName {
    /// Parse and normalize a raw name.
    ///
    /// Whitespace is trimmed and collapsed, the text is NFC-normalized and
    /// title-cased per word ("bianchi luca " becomes "Bianchi Luca").
    /// Allowed characters: letters in any script, combining marks, space,
    /// apostrophe, period, hyphen.
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            return Err(NameError::Empty);
        }

        let composed = ComposingNormalizer::new_nfc().normalize(&collapsed);
        for c in composed.chars() {
            if !is_allowed(c) {
                return Err(NameError::IllegalChar(c));
            }
        }

        let display = title_case(&composed);
        let chars = display.chars().count();
        if chars < MIN_CHARS {
            return Err(NameError::TooShort(chars));
        }
        if chars > MAX_CHARS {
            return Err(NameError::TooLong(chars));
        }

        let key = fold_key(&display);
        Ok(Self { display, key })
    }

    /// The normalized display form.
    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// The case- and accent-insensitive comparison key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

fn is_allowed(c: char) -> bool {
    c.is_alphabetic() || is_mark(c) || matches!(c, ' ' | '\'' | '\u{2019}' | '.' | '-')
}

fn is_mark(c: char) -> bool {
    matches!(
        CodePointMapData::<GeneralCategory>::new().get(c),
        GeneralCategory::NonspacingMark
            | GeneralCategory::SpacingMark
            | GeneralCategory::EnclosingMark
    )
}

/// Uppercase the letter opening each word, lowercase the rest. Hyphens and
/// apostrophes open a new word ("o'brien" becomes "O'Brien").
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if matches!(c, ' ' | '-' | '\'' | '\u{2019}') {
            out.push(c);
            at_word_start = true;
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// Decompose, strip combining marks, case-fold.
fn fold_key(s: &str) -> String {
    let decomposed = DecomposingNormalizer::new_nfd().normalize(s);
    let stripped: String = decomposed.chars().filter(|c| !is_mark(*c)).collect();
    CaseMapper::new().fold_string(&stripped).into_owned()
}

impl PartialEq for DoctorName {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for DoctorName {}

impl PartialOrd for DoctorName {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DoctorName {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.display.cmp(&other.display))
    }
}

impl std::hash::Hash for DoctorName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl std::fmt::Display for DoctorName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display)
    }
}

impl Serialize for DoctorName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display)
    }
}

impl<'de> Deserialize<'de> for DoctorName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DoctorName::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let name = DoctorName::parse("  bianchi   luca ").unwrap();
        assert_eq!(name.as_str(), "Bianchi Luca");
    }

    #[test]
    fn title_cases_after_hyphen_and_apostrophe() {
        assert_eq!(
            DoctorName::parse("anna-maria d'angelo").unwrap().as_str(),
            "Anna-Maria D'Angelo"
        );
    }

    #[test]
    fn keeps_accents_in_display_but_not_in_key() {
        let accented = DoctorName::parse("Nicolò Rèsta").unwrap();
        let plain = DoctorName::parse("nicolo resta").unwrap();
        assert_eq!(accented.as_str(), "Nicolò Rèsta");
        assert_eq!(accented, plain);
    }

    #[test]
    fn rejects_empty_and_too_short() {
        assert_eq!(DoctorName::parse("   "), Err(NameError::Empty));
        assert_eq!(DoctorName::parse("x"), Err(NameError::TooShort(1)));
    }

    #[test]
    fn rejects_overlong() {
        let raw = "a".repeat(MAX_CHARS + 1);
        assert_eq!(DoctorName::parse(&raw), Err(NameError::TooLong(MAX_CHARS + 1)));
    }

    #[test]
    fn rejects_digits_and_symbols() {
        assert_eq!(
            DoctorName::parse("Rossi 2"),
            Err(NameError::IllegalChar('2'))
        );
        assert_eq!(
            DoctorName::parse("Rossi@Mario"),
            Err(NameError::IllegalChar('@'))
        );
    }

    #[test]
    fn accepts_non_latin_scripts() {
        assert!(DoctorName::parse("Σωκράτης Παπαδόπουλος").is_ok());
    }

    #[test]
    fn ordering_ignores_case() {
        let a = DoctorName::parse("bianchi luca").unwrap();
        let b = DoctorName::parse("Rossi Mario").unwrap();
        assert!(a < b);
    }

    #[test]
    fn serde_round_trip() {
        let name = DoctorName::parse("Rossi Mario").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"Rossi Mario\"");
        let back: DoctorName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }

    proptest! {
        // Parsing is idempotent: re-parsing a normalized display form
        // yields the same name.
        #[test]
        fn parse_is_idempotent(raw in "[a-zA-Zàèéìòù' .-]{2,40}") {
            if let Ok(name) = DoctorName::parse(&raw) {
                let again = DoctorName::parse(name.as_str()).unwrap();
                prop_assert_eq!(again.as_str(), name.as_str());
                prop_assert_eq!(again.key(), name.key());
            }
        }

        // The key never distinguishes names that differ only by case.
        #[test]
        fn key_ignores_case(raw in "[a-z]{2,20}( [a-z]{2,20})?") {
            let lower = DoctorName::parse(&raw).unwrap();
            let upper = DoctorName::parse(&raw.to_uppercase()).unwrap();
            prop_assert_eq!(lower.key(), upper.key());
        }
    }
}
