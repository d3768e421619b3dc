use actix_web::{web, App, HttpServer, HttpResponse, Result, middleware};
use actix_web::cookie::Key;
use actix_files::Files;
use actix_session::{Session, SessionMiddleware, storage::CookieSessionStore};
use log::info;
use serde::{Deserialize, Serialize};

use crate::display;
use crate::favorites::{self, Conflict, FavoriteEntry, FavoritesState, SetConflict};
use crate::parser::{Day, ScheduleData, Venue};
use crate::storage::KeyValueStore;

/// Shared read-only state: the schedule dataset, loaded once at startup.
/// Favorites are per visitor and live in the session cookie, so there is
/// no server-side mutable state.
pub struct AppState {
    pub data: ScheduleData,
}

/// Key-value store backed by the visitor's cookie session. This is the
/// per-visitor persistence collaborator the favorites module writes
/// through; each request gets a fresh scoped handle.
struct SessionStore<'a> {
    session: &'a Session,
}

impl KeyValueStore for SessionStore<'_> {
    fn get(&self, key: &str) -> Option<String> {
        self.session.get::<String>(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        self.session.insert(key, value).is_ok()
    }
}

#[derive(Deserialize)]
pub struct ToggleRequest {
    #[serde(rename = "setKey")]
    set_key: String,
}

#[derive(Deserialize)]
pub struct FilterRequest {
    show: bool,
}

#[derive(Deserialize)]
pub struct SetConflictQuery {
    artist: String,
    stage: String,
    day: String,
    venue: String,
    start: Option<String>,
}

#[derive(Serialize)]
pub struct FavoritesResponse {
    favorites: Vec<FavoriteEntry>,
    #[serde(rename = "showFavoritesOnly")]
    show_favorites_only: bool,
    #[serde(rename = "storageWarning")]
    storage_warning: bool,
    #[serde(rename = "firstVisit")]
    first_visit: bool,
}

#[derive(Serialize)]
pub struct ToggleResponse {
    favorited: bool,
    #[serde(rename = "newConflicts")]
    new_conflicts: Vec<Conflict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alert: Option<String>,
    #[serde(rename = "storageWarning")]
    storage_warning: bool,
}

#[derive(Serialize)]
pub struct ConflictsResponse {
    conflicts: Vec<Conflict>,
}

#[derive(Serialize)]
pub struct SetConflictsResponse {
    conflicts: Vec<SetConflict>,
    labels: Vec<String>,
    /// Everyone who favorited the queried set
    people: Vec<String>,
}

/// Validates a toggle request's set key
fn validate_set_key(set_key: &str) -> Result<(), String> {
    let parts: Vec<&str> = set_key.split('|').collect();
    if parts.len() != 4 {
        return Err("Set key must have the shape artist|day|stage|start".to_string());
    }
    if parts[0].trim().is_empty() {
        return Err("Set key artist is required".to_string());
    }
    if Day::parse(parts[1]).is_none() {
        return Err(format!("Invalid set key day: {}", parts[1]));
    }
    Ok(())
}

// Schedule page
async fn index() -> Result<HttpResponse> {
    let html = include_str!("../templates/index.html");
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

// Full schedule dataset
async fn get_schedule(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(&state.data))
}

// Current favorites plus the flags the page needs on load
async fn get_favorites(session: Session) -> Result<HttpResponse> {
    let store = SessionStore { session: &session };
    let mut favorites = FavoritesState::load(&store);
    favorites.check_first_visit(&store);

    Ok(HttpResponse::Ok().json(FavoritesResponse {
        favorites: favorites.favorite_sets.clone(),
        show_favorites_only: favorites.show_favorites_only,
        storage_warning: favorites.storage_warning,
        first_visit: favorites.first_visit,
    }))
}

// Toggle one favorite; responds with any newly introduced conflicts
async fn toggle_favorite(
    req: web::Json<ToggleRequest>,
    session: Session,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if let Err(error) = validate_set_key(&req.set_key) {
        return Ok(HttpResponse::BadRequest()
            .json(serde_json::json!({"success": false, "error": error})));
    }

    let store = SessionStore { session: &session };
    let mut favorites = FavoritesState::load(&store);
    let outcome = favorites.toggle(&req.set_key, &state.data, &store);

    Ok(HttpResponse::Ok().json(ToggleResponse {
        favorited: outcome.favorited,
        alert: display::format_conflict_alert(&outcome.new_conflicts),
        new_conflicts: outcome.new_conflicts,
        storage_warning: favorites.storage_warning,
    }))
}

// Persist the favorites-only filter
async fn set_filter(req: web::Json<FilterRequest>, session: Session) -> Result<HttpResponse> {
    let store = SessionStore { session: &session };
    let mut favorites = FavoritesState::load(&store);
    favorites.set_filter(req.show, &store);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "showFavoritesOnly": favorites.show_favorites_only,
        "storageWarning": favorites.storage_warning,
    })))
}

// The complete conflict list for the current favorites
async fn get_conflicts(session: Session, state: web::Data<AppState>) -> Result<HttpResponse> {
    let store = SessionStore { session: &session };
    let favorites = FavoritesState::load(&store);
    let conflicts = favorites::check_for_conflicts(&favorites.favorite_sets, &state.data);

    Ok(HttpResponse::Ok().json(ConflictsResponse { conflicts }))
}

// Conflicts for one specific performance, for the detail tooltip
async fn get_set_conflicts(
    query: web::Query<SetConflictQuery>,
    session: Session,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let day = match Day::parse(&query.day) {
        Some(day) => day,
        None => {
            return Ok(HttpResponse::BadRequest()
                .json(serde_json::json!({"success": false, "error": format!("Invalid day: {}", query.day)})));
        }
    };
    let venue = match Venue::parse(&query.venue) {
        Some(venue) => venue,
        None => {
            return Ok(HttpResponse::BadRequest()
                .json(serde_json::json!({"success": false, "error": format!("Invalid venue: {}", query.venue)})));
        }
    };

    let store = SessionStore { session: &session };
    let favorites = FavoritesState::load(&store);

    // An unknown performance simply has no conflicts
    let performance = state
        .data
        .stages(venue, day)
        .and_then(|stages| stages.get(&query.stage))
        .and_then(|sets| {
            sets.iter().find(|set| {
                set.artist == query.artist
                    && (query.start.is_none() || set.start == query.start)
            })
        });

    let (conflicts, people) = match performance {
        Some(set) => {
            let key = favorites::set_key(&set.artist, day, &query.stage, set.start.as_deref());
            (
                favorites::find_conflicts_for_set(
                    &favorites.favorite_sets,
                    &state.data,
                    set,
                    &query.stage,
                    day,
                    venue,
                ),
                favorites.people_for(&key),
            )
        }
        None => (Vec::new(), Vec::new()),
    };

    let labels = conflicts.iter().map(display::format_set_conflict_line).collect();
    Ok(HttpResponse::Ok().json(SetConflictsResponse { conflicts, labels, people }))
}

pub async fn start_server(port: u16, data: ScheduleData) -> std::io::Result<()> {
    info!(
        "serving {} arena days and {} district x days",
        data.arena.len(),
        data.district_x.len()
    );
    let app_state = web::Data::new(AppState { data });
    let secret_key = Key::generate();

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .service(Files::new("/static", "static"))
            .route("/", web::get().to(index))
            .route("/api/schedule", web::get().to(get_schedule))
            .route("/api/favorites", web::get().to(get_favorites))
            .route("/api/favorites/toggle", web::post().to(toggle_favorite))
            .route("/api/favorites/filter", web::post().to(set_filter))
            .route("/api/conflicts", web::get().to(get_conflicts))
            .route("/api/conflicts/set", web::get().to(get_set_conflicts))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Performance, StageMap};
    use actix_web::test;
    use std::collections::BTreeMap;

    fn test_data() -> ScheduleData {
        let mut friday: StageMap = BTreeMap::new();
        friday.insert(
            "Main Stage".to_string(),
            vec![Performance {
                artist: "Iron Covenant".to_string(),
                start: Some("20:00".to_string()),
                end: Some("21:00".to_string()),
            }],
        );
        friday.insert(
            "Second Stage".to_string(),
            vec![Performance {
                artist: "The Amber Youth".to_string(),
                start: Some("20:30".to_string()),
                end: Some("21:30".to_string()),
            }],
        );
        let mut arena = BTreeMap::new();
        arena.insert(Day::Friday, friday);
        ScheduleData { arena, district_x: BTreeMap::new() }
    }

    macro_rules! test_app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(AppState { data: test_data() }))
                    .wrap(
                        SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                            .cookie_secure(false)
                            .build(),
                    )
                    .route("/api/favorites", web::get().to(get_favorites))
                    .route("/api/favorites/toggle", web::post().to(toggle_favorite))
                    .route("/api/conflicts", web::get().to(get_conflicts))
                    .route("/api/conflicts/set", web::get().to(get_set_conflicts)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn toggling_an_overlapping_favorite_alerts() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/api/favorites/toggle")
            .set_json(serde_json::json!({"setKey": "Iron Covenant|friday|Main Stage|20:00"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let session_cookie = resp
            .response()
            .cookies()
            .next()
            .expect("session cookie")
            .into_owned();
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["favorited"], true);
        assert!(body["newConflicts"].as_array().unwrap().is_empty());

        let req = test::TestRequest::post()
            .uri("/api/favorites/toggle")
            .cookie(session_cookie)
            .set_json(serde_json::json!({"setKey": "The Amber Youth|friday|Second Stage|20:30"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["favorited"], true);
        assert_eq!(body["newConflicts"].as_array().unwrap().len(), 1);
        assert!(body["alert"].as_str().unwrap().contains("The Amber Youth"));
    }

    #[actix_web::test]
    async fn malformed_set_key_is_rejected() {
        let app = test_app!();
        let req = test::TestRequest::post()
            .uri("/api/favorites/toggle")
            .set_json(serde_json::json!({"setKey": "not a set key"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn first_visit_is_flagged_once_per_session() {
        let app = test_app!();

        let req = test::TestRequest::get().uri("/api/favorites").to_request();
        let resp = test::call_service(&app, req).await;
        let session_cookie = resp
            .response()
            .cookies()
            .next()
            .expect("session cookie")
            .into_owned();
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["firstVisit"], true);
        assert_eq!(body["storageWarning"], false);

        let req = test::TestRequest::get()
            .uri("/api/favorites")
            .cookie(session_cookie)
            .to_request();
        let resp = test::call_service(&app, req).await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["firstVisit"], false);
    }

    #[actix_web::test]
    async fn set_conflict_query_rejects_unknown_day() {
        let app = test_app!();
        let req = test::TestRequest::get()
            .uri("/api/conflicts/set?artist=Iron%20Covenant&stage=Main%20Stage&day=someday&venue=arena")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn set_conflict_lookup_names_counterpart_and_people() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/api/favorites/toggle")
            .set_json(serde_json::json!({"setKey": "Iron Covenant|friday|Main Stage|20:00"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let session_cookie = resp
            .response()
            .cookies()
            .next()
            .expect("session cookie")
            .into_owned();
        test::read_body(resp).await;

        let req = test::TestRequest::post()
            .uri("/api/favorites/toggle")
            .cookie(session_cookie)
            .set_json(serde_json::json!({"setKey": "The Amber Youth|friday|Second Stage|20:30"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        // The session lives in the cookie, so pick up the updated one
        let session_cookie = resp
            .response()
            .cookies()
            .next()
            .expect("session cookie")
            .into_owned();
        test::read_body(resp).await;

        let req = test::TestRequest::get()
            .uri("/api/conflicts/set?artist=Iron%20Covenant&stage=Main%20Stage&day=friday&venue=arena")
            .cookie(session_cookie)
            .to_request();
        let resp = test::call_service(&app, req).await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["people"], serde_json::json!(["You"]));
        assert_eq!(body["conflicts"].as_array().unwrap().len(), 1);
        assert_eq!(body["conflicts"][0]["artist"], "The Amber Youth");
        assert!(body["labels"][0].as_str().unwrap().contains("Second Stage"));
    }

    #[actix_web::test]
    async fn conflicts_endpoint_is_empty_without_favorites() {
        let app = test_app!();
        let req = test::TestRequest::get().uri("/api/conflicts").to_request();
        let resp = test::call_service(&app, req).await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["conflicts"].as_array().unwrap().is_empty());
    }
}
