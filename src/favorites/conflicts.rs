use crate::parser::{Day, Performance, ScheduleData, StageMap, Venue};

use super::manager::set_key;
use super::time_utils::{intervals_overlap, parse_time_to_minutes};
use super::types::{Conflict, FavoriteEntry, SetConflict};

/// Days on which both venues operate
const COMMON_DAYS: [Day; 3] = [Day::Friday, Day::Saturday, Day::Sunday];

/// A favorited performance with resolved times, ready for overlap checks
struct TimedSet {
    artist: String,
    stage: String,
    start: String,
    end: String,
    start_min: u32,
    end_min: u32,
}

fn is_favorited(favorites: &[FavoriteEntry], key: &str) -> bool {
    favorites.iter().any(|fav| fav.set_key == key)
}

/// Collects the favorited performances for one venue/day across all of its
/// stages. Sets missing a start or end time (or with times that do not
/// parse) are excluded; they can never conflict.
fn collect_favorited_sets(favorites: &[FavoriteEntry], day: Day, stages: &StageMap) -> Vec<TimedSet> {
    let mut sets = Vec::new();
    for (stage, performances) in stages {
        for set in performances {
            let key = set_key(&set.artist, day, stage, set.start.as_deref());
            if !is_favorited(favorites, &key) {
                continue;
            }
            let (start, end) = match (&set.start, &set.end) {
                (Some(start), Some(end)) => (start, end),
                _ => continue,
            };
            let (start_min, end_min) = match (parse_time_to_minutes(start), parse_time_to_minutes(end)) {
                (Some(s), Some(e)) => (s, e),
                _ => continue,
            };
            sets.push(TimedSet {
                artist: set.artist.clone(),
                stage: stage.clone(),
                start: start.clone(),
                end: end.clone(),
                start_min,
                end_min,
            });
        }
    }
    sets
}

/// Finds every pairwise overlap among favorited performances for one
/// venue/day. Pairs are checked across stages too: a visitor cannot attend
/// two stages in the same venue at once.
fn find_conflicts_for_venue(favorites: &[FavoriteEntry], day: Day, stages: &StageMap) -> Vec<Conflict> {
    let sets = collect_favorited_sets(favorites, day, stages);
    let mut conflicts = Vec::new();

    for i in 0..sets.len() {
        for j in (i + 1)..sets.len() {
            let set1 = &sets[i];
            let set2 = &sets[j];
            if intervals_overlap(set1.start_min, set1.end_min, set2.start_min, set2.end_min) {
                conflicts.push(Conflict {
                    day,
                    artist1: set1.artist.clone(),
                    artist2: set2.artist.clone(),
                    time1: format!("{}-{}", set1.start, set1.end),
                    time2: format!("{}-{}", set2.start, set2.end),
                    stage1: set1.stage.clone(),
                    stage2: set2.stage.clone(),
                    venue1: None,
                    venue2: None,
                });
            }
        }
    }

    conflicts
}

/// Finds overlaps between favorited Arena and District X performances on
/// the days both venues operate. Venues are separate stage maps, but one
/// visitor still cannot be in both.
fn find_cross_venue_conflicts(favorites: &[FavoriteEntry], data: &ScheduleData) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for day in COMMON_DAYS {
        let (arena_stages, district_stages) = match (data.arena.get(&day), data.district_x.get(&day)) {
            (Some(arena), Some(district)) => (arena, district),
            _ => continue,
        };

        let arena_sets = collect_favorited_sets(favorites, day, arena_stages);
        let district_sets = collect_favorited_sets(favorites, day, district_stages);

        for arena_set in &arena_sets {
            for district_set in &district_sets {
                if intervals_overlap(
                    arena_set.start_min,
                    arena_set.end_min,
                    district_set.start_min,
                    district_set.end_min,
                ) {
                    conflicts.push(Conflict {
                        day,
                        artist1: arena_set.artist.clone(),
                        artist2: district_set.artist.clone(),
                        time1: format!("{}-{}", arena_set.start, arena_set.end),
                        time2: format!("{}-{}", district_set.start, district_set.end),
                        stage1: arena_set.stage.clone(),
                        stage2: district_set.stage.clone(),
                        venue1: Some(Venue::Arena),
                        venue2: Some(Venue::DistrictX),
                    });
                }
            }
        }
    }

    conflicts
}

/// Produces the complete conflict list for the current favorites: both
/// intra-venue scans plus the cross-venue scan
pub fn check_for_conflicts(favorites: &[FavoriteEntry], data: &ScheduleData) -> Vec<Conflict> {
    // Need at least 2 favorites to have a conflict
    if favorites.len() < 2 {
        return Vec::new();
    }

    let mut conflicts = Vec::new();

    for (day, stages) in &data.arena {
        conflicts.extend(find_conflicts_for_venue(favorites, *day, stages));
    }

    for (day, stages) in &data.district_x {
        conflicts.extend(find_conflicts_for_venue(favorites, *day, stages));
    }

    conflicts.extend(find_cross_venue_conflicts(favorites, data));

    conflicts
}

/// Finds the conflicts involving one specific performance, for the set
/// detail tooltip. Scans the other stages of its own venue, then the whole
/// opposite venue for the same day. Returns empty unless the performance
/// itself is favorited and has usable times.
pub fn find_conflicts_for_set(
    favorites: &[FavoriteEntry],
    data: &ScheduleData,
    set: &Performance,
    stage: &str,
    day: Day,
    venue: Venue,
) -> Vec<SetConflict> {
    let key = set_key(&set.artist, day, stage, set.start.as_deref());
    if !is_favorited(favorites, &key) {
        return Vec::new();
    }
    let (start_min, end_min) = match (
        set.start.as_deref().and_then(parse_time_to_minutes),
        set.end.as_deref().and_then(parse_time_to_minutes),
    ) {
        (Some(s), Some(e)) => (s, e),
        _ => return Vec::new(),
    };

    let mut conflicts = Vec::new();

    // Same venue, other stages
    if let Some(stages) = data.stages(venue, day) {
        for (other_stage, performances) in stages {
            if other_stage == stage {
                continue;
            }
            collect_set_conflicts(
                favorites,
                day,
                venue,
                other_stage,
                performances,
                start_min,
                end_min,
                &mut conflicts,
            );
        }
    }

    // Opposite venue, same day, all stages
    let other_venue = venue.other();
    if let Some(stages) = data.stages(other_venue, day) {
        for (other_stage, performances) in stages {
            collect_set_conflicts(
                favorites,
                day,
                other_venue,
                other_stage,
                performances,
                start_min,
                end_min,
                &mut conflicts,
            );
        }
    }

    conflicts
}

fn collect_set_conflicts(
    favorites: &[FavoriteEntry],
    day: Day,
    venue: Venue,
    stage: &str,
    performances: &[Performance],
    start_min: u32,
    end_min: u32,
    conflicts: &mut Vec<SetConflict>,
) {
    for other in performances {
        let other_key = set_key(&other.artist, day, stage, other.start.as_deref());
        if !is_favorited(favorites, &other_key) {
            continue;
        }
        let (other_start, other_end) = match (&other.start, &other.end) {
            (Some(start), Some(end)) => (start, end),
            _ => continue,
        };
        let (other_start_min, other_end_min) =
            match (parse_time_to_minutes(other_start), parse_time_to_minutes(other_end)) {
                (Some(s), Some(e)) => (s, e),
                _ => continue,
            };
        if intervals_overlap(start_min, end_min, other_start_min, other_end_min) {
            conflicts.push(SetConflict {
                artist: other.artist.clone(),
                stage: stage.to_string(),
                start: other_start.clone(),
                end: other_end.clone(),
                venue,
            });
        }
    }
}
