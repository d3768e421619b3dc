use log::warn;
use serde::Deserialize;

use crate::parser::{Day, ScheduleData};
use crate::storage::KeyValueStore;

use super::conflicts::check_for_conflicts;
use super::types::{Conflict, FavoriteEntry};

pub const FAVORITES_KEY: &str = "downloadFestivalFavoriteSets";
pub const FAVORITES_FILTER_KEY: &str = "downloadFestivalFavoritesFilter";
pub const VISITED_KEY: &str = "downloadFestivalVisited";

/// The implicit single-user identity. The entry shape anticipates several
/// people sharing one list, but every mutation today acts as this person.
pub const DEFAULT_PERSON: &str = "You";

/// Builds the unique key for a scheduled set
pub fn set_key(artist: &str, day: Day, stage: &str, start: Option<&str>) -> String {
    format!("{}|{}|{}|{}", artist, day.as_str(), stage, start.unwrap_or(""))
}

/// Persisted favorites come in two shapes: the current entry objects, and a
/// legacy array of bare set keys still present in old saved data.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredFavorite {
    Entry(FavoriteEntry),
    Key(String),
}

impl StoredFavorite {
    fn into_entry(self) -> FavoriteEntry {
        match self {
            StoredFavorite::Entry(entry) => entry,
            StoredFavorite::Key(set_key) => FavoriteEntry {
                set_key,
                person: DEFAULT_PERSON.to_string(),
            },
        }
    }
}

/// Result of a toggle: the new favorited state, plus any conflicts the
/// addition introduced that the page should alert on
#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    pub favorited: bool,
    pub new_conflicts: Vec<Conflict>,
}

/// Favorites state for one visitor. Built from a key-value store, mutated
/// by toggles, written back after every mutation. Holds no reference to
/// the page or the store; both are passed in per operation.
#[derive(Debug, Clone, Default)]
pub struct FavoritesState {
    pub favorite_sets: Vec<FavoriteEntry>,
    pub storage_warning: bool,
    pub show_favorites_only: bool,
    pub first_visit: bool,
}

impl FavoritesState {
    /// Loads favorites and the favorites-only filter from storage.
    /// Unavailable storage or unparseable data degrades to an empty set
    /// with the warning flag raised; this never fails.
    pub fn load(store: &dyn KeyValueStore) -> FavoritesState {
        let mut state = FavoritesState::default();

        if !store.available() {
            state.storage_warning = true;
            return state;
        }

        if let Some(raw) = store.get(FAVORITES_KEY) {
            match serde_json::from_str::<Vec<StoredFavorite>>(&raw) {
                Ok(stored) => {
                    state.favorite_sets = stored.into_iter().map(StoredFavorite::into_entry).collect();
                }
                Err(err) => {
                    warn!("discarding unreadable favorites data: {}", err);
                    state.favorite_sets = Vec::new();
                    state.storage_warning = true;
                }
            }
        }

        state.show_favorites_only = store.get(FAVORITES_FILTER_KEY).as_deref() == Some("true");

        state
    }

    /// Writes the current favorites back to storage. Failures only raise
    /// the warning flag; the in-memory set stays authoritative.
    pub fn save(&mut self, store: &dyn KeyValueStore) {
        if !store.available() {
            self.storage_warning = true;
            return;
        }
        match serde_json::to_string(&self.favorite_sets) {
            Ok(raw) => {
                if store.set(FAVORITES_KEY, &raw) {
                    self.storage_warning = false;
                } else {
                    warn!("favorites write failed; keeping in-memory state");
                    self.storage_warning = true;
                }
            }
            Err(_) => self.storage_warning = true,
        }
    }

    /// Toggles the favorite for (set_key, "You"), persisting afterwards in
    /// both branches. When a favorite is added, conflicts are computed
    /// before and after the add so the caller can alert on just the
    /// conflicts this addition introduced for the added artist.
    pub fn toggle(
        &mut self,
        set_key: &str,
        data: &ScheduleData,
        store: &dyn KeyValueStore,
    ) -> ToggleOutcome {
        let mut outcome = ToggleOutcome {
            favorited: false,
            new_conflicts: Vec::new(),
        };

        let existing_idx = self
            .favorite_sets
            .iter()
            .position(|fav| fav.set_key == set_key && fav.person == DEFAULT_PERSON);

        if let Some(idx) = existing_idx {
            self.favorite_sets.remove(idx);
        } else {
            // Conflicts before the add, so only newly introduced ones alert
            let existing_conflicts = check_for_conflicts(&self.favorite_sets, data);

            self.favorite_sets.push(FavoriteEntry {
                set_key: set_key.to_string(),
                person: DEFAULT_PERSON.to_string(),
            });
            outcome.favorited = true;

            let current_conflicts = check_for_conflicts(&self.favorite_sets, data);
            let artist = set_key.split('|').next().unwrap_or("");
            outcome.new_conflicts = current_conflicts
                .into_iter()
                .filter(|conflict| !existing_conflicts.contains(conflict))
                .filter(|conflict| conflict.artist1 == artist || conflict.artist2 == artist)
                .collect();
        }

        self.save(store);
        outcome
    }

    pub fn is_favorite(&self, set_key: &str, person: &str) -> bool {
        self.favorite_sets
            .iter()
            .any(|fav| fav.set_key == set_key && fav.person == person)
    }

    /// Everyone who favorited this set
    pub fn people_for(&self, set_key: &str) -> Vec<String> {
        self.favorite_sets
            .iter()
            .filter(|fav| fav.set_key == set_key)
            .map(|fav| fav.person.clone())
            .collect()
    }

    /// Updates and persists the favorites-only filter
    pub fn set_filter(&mut self, show: bool, store: &dyn KeyValueStore) {
        self.show_favorites_only = show;
        if !store.available() {
            self.storage_warning = true;
            return;
        }
        if !store.set(FAVORITES_FILTER_KEY, if show { "true" } else { "false" }) {
            self.storage_warning = true;
        }
    }

    /// Marks the visited flag, recording whether this was the first visit
    /// so the page can show its onboarding prompt once
    pub fn check_first_visit(&mut self, store: &dyn KeyValueStore) {
        let visited = store.get(VISITED_KEY).as_deref() == Some("true");
        if !visited {
            store.set(VISITED_KEY, "true");
            self.first_visit = true;
        }
    }
}
