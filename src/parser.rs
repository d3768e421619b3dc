use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

/// Festival days, in running order. District X opens mid-week; the Arena
/// only runs friday through sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Wednesday => "wednesday",
            Day::Thursday => "thursday",
            Day::Friday => "friday",
            Day::Saturday => "saturday",
            Day::Sunday => "sunday",
        }
    }

    /// Parses a lowercase day name as used in the dataset and in set keys
    pub fn parse(value: &str) -> Option<Day> {
        match value.trim().to_lowercase().as_str() {
            "wednesday" => Some(Day::Wednesday),
            "thursday" => Some(Day::Thursday),
            "friday" => Some(Day::Friday),
            "saturday" => Some(Day::Saturday),
            "sunday" => Some(Day::Sunday),
            _ => None,
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two performance areas. They keep independent day/stage schedules,
/// but a visitor can only be in one of them at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Venue {
    #[serde(rename = "Arena")]
    Arena,
    #[serde(rename = "District X")]
    DistrictX,
}

impl Venue {
    pub fn display_name(&self) -> &'static str {
        match self {
            Venue::Arena => "Arena",
            Venue::DistrictX => "District X",
        }
    }

    pub fn other(&self) -> Venue {
        match self {
            Venue::Arena => Venue::DistrictX,
            Venue::DistrictX => Venue::Arena,
        }
    }

    /// Parses the venue identifiers used in the dataset and API
    pub fn parse(value: &str) -> Option<Venue> {
        match value.trim().to_lowercase().as_str() {
            "arena" => Some(Venue::Arena),
            "districtx" | "district x" => Some(Venue::DistrictX),
            _ => None,
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One scheduled set. Times are day-local "HH:MM" strings; a set missing
/// either time can still be displayed and favorited but never conflicts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Performance {
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// stage name -> ordered sets for that stage
pub type StageMap = BTreeMap<String, Vec<Performance>>;

/// The full read-only schedule dataset: venue -> day -> stage -> sets.
/// District X may be absent entirely, or absent for individual days.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleData {
    #[serde(default)]
    pub arena: BTreeMap<Day, StageMap>,
    #[serde(default, rename = "districtX")]
    pub district_x: BTreeMap<Day, StageMap>,
}

impl ScheduleData {
    pub fn venue_days(&self, venue: Venue) -> &BTreeMap<Day, StageMap> {
        match venue {
            Venue::Arena => &self.arena,
            Venue::DistrictX => &self.district_x,
        }
    }

    /// Stages for one venue/day combination; None when the venue is closed
    /// that day
    pub fn stages(&self, venue: Venue, day: Day) -> Option<&StageMap> {
        self.venue_days(venue).get(&day)
    }
}

/// Loads the schedule dataset from a JSON file
pub fn load_schedule<P: AsRef<Path>>(path: P) -> Result<ScheduleData, Box<dyn std::error::Error>> {
    let raw = fs::read_to_string(path)?;
    let data: ScheduleData = serde_json::from_str(&raw)?;
    Ok(data)
}

/// Resolves the schedule dataset path: SCHEDULE_DATA env var first, then
/// the bundled data/ copy, then the working directory
pub fn schedule_data_path() -> PathBuf {
    if let Ok(path) = std::env::var("SCHEDULE_DATA") {
        return PathBuf::from(path);
    }
    if Path::new("data/schedule-data.json").exists() {
        PathBuf::from("data/schedule-data.json")
    } else {
        PathBuf::from("schedule-data.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_parse_round_trips() {
        for day in [Day::Wednesday, Day::Thursday, Day::Friday, Day::Saturday, Day::Sunday] {
            assert_eq!(Day::parse(day.as_str()), Some(day));
        }
        assert_eq!(Day::parse("monday"), None);
        assert_eq!(Day::parse(""), None);
    }

    #[test]
    fn venue_parse_accepts_dataset_and_display_forms() {
        assert_eq!(Venue::parse("arena"), Some(Venue::Arena));
        assert_eq!(Venue::parse("districtX"), Some(Venue::DistrictX));
        assert_eq!(Venue::parse("District X"), Some(Venue::DistrictX));
        assert_eq!(Venue::parse("main hall"), None);
    }

    #[test]
    fn dataset_deserializes_with_missing_district_x() {
        let raw = r#"{
            "arena": {
                "friday": {
                    "Main Stage": [
                        {"artist": "The Amber Youth", "start": "20:00", "end": "21:00"},
                        {"artist": "Static Parade"}
                    ]
                }
            }
        }"#;
        let data: ScheduleData = serde_json::from_str(raw).unwrap();
        assert!(data.district_x.is_empty());
        let sets = &data.arena[&Day::Friday]["Main Stage"];
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].start.as_deref(), Some("20:00"));
        assert!(sets[1].start.is_none());
        assert!(data.stages(Venue::DistrictX, Day::Friday).is_none());
    }
}
