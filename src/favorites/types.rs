use serde::{Serialize, Deserialize};

use crate::parser::{Day, Venue};

/// One favorited performance for one person. The set key is the composite
/// identity `artist|day|stage|start`; an artist playing two sets gets two
/// distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    #[serde(rename = "setKey")]
    pub set_key: String,
    pub person: String,
}

/// Two favorited performances whose time intervals overlap. Computed on
/// demand, never stored. The venue fields are only present on cross-venue
/// conflicts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub day: Day,
    pub artist1: String,
    pub artist2: String,
    /// "start-end" of the first performance, e.g. "20:00-21:00"
    pub time1: String,
    pub time2: String,
    pub stage1: String,
    pub stage2: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue1: Option<Venue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue2: Option<Venue>,
}

/// A conflicting counterpart for one specific performance, as shown in the
/// set detail tooltip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetConflict {
    pub artist: String,
    pub stage: String,
    pub start: String,
    pub end: String,
    pub venue: Venue,
}
