pub mod types;
pub mod time_utils;
pub mod conflicts;
pub mod manager;

pub use types::{FavoriteEntry, Conflict, SetConflict};
pub use conflicts::{check_for_conflicts, find_conflicts_for_set};
pub use manager::{FavoritesState, ToggleOutcome, set_key, DEFAULT_PERSON};
