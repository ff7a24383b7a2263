//! Canonical forms for free-text neighborhood and container-type strings.
//!
//! Tables coming from different sources spell the same neighborhood with
//! and without diacritics, with or without the administrative suffix, and
//! with arbitrary punctuation. Every join in the planner goes through
//! [`normalize_text`] first.

use chrono::Weekday;

/// Administrative suffixes removed after upper-casing and folding.
const NEIGHBORHOOD_SUFFIXES: &[&str] = &[" MAHALLESI", " MH.", " MH"];

/// Keyword in a rotation expression meaning "collected every night".
const EVERY_DAY_KEYWORD: &str = "NIGHT";

const WEEKDAY_NAMES: &[(&str, Weekday)] = &[
    ("MONDAY", Weekday::Mon),
    ("TUESDAY", Weekday::Tue),
    ("WEDNESDAY", Weekday::Wed),
    ("THURSDAY", Weekday::Thu),
    ("FRIDAY", Weekday::Fri),
    ("SATURDAY", Weekday::Sat),
    ("SUNDAY", Weekday::Sun),
];

fn fold_char(c: char) -> char {
    match c {
        'Ç' | 'ç' => 'C',
        'Ğ' | 'ğ' => 'G',
        'İ' | 'I' | 'ı' | 'i' | 'Î' | 'î' => 'I',
        'Ö' | 'ö' => 'O',
        'Ş' | 'ş' => 'S',
        'Ü' | 'ü' | 'Û' | 'û' => 'U',
        'Â' | 'â' => 'A',
        other => other,
    }
}

/// Canonicalizes a neighborhood or container-type string.
///
/// Folds Turkish diacritics, upper-cases, strips the neighborhood suffix,
/// replaces anything outside `[0-9A-Z]` and whitespace with a space and
/// collapses runs of whitespace.
pub fn normalize_text(raw: &str) -> String {
    let mut folded: String = raw
        .trim()
        .chars()
        .map(fold_char)
        .flat_map(char::to_uppercase)
        .collect();

    for suffix in NEIGHBORHOOD_SUFFIXES {
        folded = folded.replace(suffix, "");
    }

    let cleaned: String = folded
        .chars()
        .map(|c| {
            if c.is_ascii_uppercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A set of weekdays stored as a bitmask, Monday in bit 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: WeekdaySet = WeekdaySet(0);
    pub const ALL: WeekdaySet = WeekdaySet(0b111_1111);

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn union(self, other: WeekdaySet) -> WeekdaySet {
        WeekdaySet(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = WeekdaySet::EMPTY;
        for day in iter {
            set.insert(day);
        }
        set
    }
}

/// Parses a free-text collection-frequency expression into weekdays.
///
/// `"MONDAY-THURSDAY"` yields Monday and Thursday (names are matched, ranges
/// are not expanded). Any expression mentioning `NIGHT` means every day.
/// Empty text and `"0"` mean never.
pub fn parse_weekdays(expression: &str) -> WeekdaySet {
    let upper = expression.trim().to_uppercase();
    if upper.is_empty() || upper == "0" {
        return WeekdaySet::EMPTY;
    }
    if upper.contains(EVERY_DAY_KEYWORD) {
        return WeekdaySet::ALL;
    }

    WEEKDAY_NAMES
        .iter()
        .filter(|(name, _)| upper.contains(name))
        .map(|(_, day)| *day)
        .collect()
}
