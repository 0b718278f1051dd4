use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post, put};
use axum::Router;
use chrono::NaiveDate;
use tower::ServiceExt;

use luxstay::config::AppConfig;
use luxstay::db;
use luxstay::handlers;
use luxstay::models::{Capacity, Hotel, Location, Policies, PriceRange, Room};
use luxstay::state::AppState;
use luxstay::store::sqlite::SqliteStore;
use luxstay::store::Store;

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 5000,
        database_url: ":memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        token_ttl_days: 7,
    }
}

fn test_state() -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    Arc::new(AppState {
        store: Arc::new(SqliteStore::new(Arc::new(Mutex::new(conn)))),
        config: test_config(),
    })
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/hotels", get(handlers::hotels::list_hotels))
        .route(
            "/api/hotels/featured",
            get(handlers::hotels::featured_hotels),
        )
        .route("/api/hotels/:id", get(handlers::hotels::get_hotel))
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/bookings/my", get(handlers::bookings::my_bookings))
        .route("/api/users/profile", get(handlers::users::get_profile))
        .route("/api/users/profile", put(handlers::users::update_profile))
        .route("/api/users/favorites", get(handlers::users::get_favorites))
        .route(
            "/api/users/favorites/toggle",
            post(handlers::users::toggle_favorite),
        )
        .with_state(state)
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Registers a fresh user and returns their bearer token.
async fn register_user(state: &Arc<AppState>, email: &str) -> String {
    let app = test_app(state.clone());
    let res = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            &format!(
                r#"{{"fullName":"Test User","email":"{email}","password":"hunter42","phone":"9876543210"}}"#
            ),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    json["token"].as_str().unwrap().to_string()
}

fn sample_hotel(
    id: &str,
    name: &str,
    city: &str,
    state_name: &str,
    stars: i64,
    price_min: f64,
    amenities: &[&str],
    featured: bool,
    day: u32,
) -> Hotel {
    Hotel {
        id: id.to_string(),
        name: name.to_string(),
        description: "A fine place to stay".to_string(),
        location: Location {
            address: "1 Main Road".to_string(),
            city: city.to_string(),
            district: city.to_string(),
            state: state_name.to_string(),
            pin_code: "500001".to_string(),
            coordinates: None,
        },
        star_rating: stars,
        images: vec![],
        amenities: amenities.iter().map(|s| s.to_string()).collect(),
        regional_amenities: vec![],
        policies: Policies::default(),
        featured,
        rating: stars as f64 - 0.5,
        review_count: 10,
        price_range: PriceRange {
            min: price_min,
            max: price_min * 2.0,
        },
        created_at: NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap(),
    }
}

fn sample_room(id: &str, hotel_id: &str, price: f64) -> Room {
    Room {
        id: id.to_string(),
        hotel_id: hotel_id.to_string(),
        room_type: "Deluxe".to_string(),
        description: "King bed, city view".to_string(),
        price_per_night: price,
        capacity: Capacity {
            adults: 2,
            children: 1,
        },
        amenities: vec!["WiFi".to_string()],
        images: vec![],
        unit_count: 4,
        availability: true,
    }
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let state = test_state();
    let app = test_app(state);

    let res = app.oneshot(get_request("/health", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["status"], "ok");
}

// ── Auth ──

#[tokio::test]
async fn test_register_returns_token_and_user() {
    let state = test_state();
    let app = test_app(state);

    let res = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            r#"{"fullName":"Asha Rao","email":"asha@example.com","password":"hunter42","phone":"9876543210"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    assert!(json["token"].as_str().unwrap().len() > 20);
    assert_eq!(json["user"]["fullName"], "Asha Rao");
    assert_eq!(json["user"]["email"], "asha@example.com");
    assert_eq!(json["user"]["role"], "user");
}

#[tokio::test]
async fn test_register_validation_errors() {
    let state = test_state();
    let app = test_app(state);

    let res = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            r#"{"fullName":"A","email":"not-an-email","password":"123","phone":"12"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    let errors = json["errors"].as_array().unwrap();
    let fields: Vec<&str> = errors
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"fullName"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
    assert!(fields.contains(&"phone"));
}

#[tokio::test]
async fn test_register_duplicate_email_conflict() {
    let state = test_state();
    register_user(&state, "dup@example.com").await;

    let app = test_app(state);
    let res = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            r#"{"fullName":"Other Person","email":"dup@example.com","password":"hunter42","phone":"9876543210"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_round_trip() {
    let state = test_state();
    register_user(&state, "login@example.com").await;

    let app = test_app(state.clone());
    let res = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            r#"{"email":"login@example.com","password":"hunter42"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert!(json["token"].as_str().unwrap().len() > 20);

    let app = test_app(state);
    let res = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            r#"{"email":"login@example.com","password":"wrong-password"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// ── Hotel catalog ──

#[tokio::test]
async fn test_hotels_empty_catalog() {
    let state = test_state();
    let app = test_app(state);

    let res = app.oneshot(get_request("/api/hotels", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_hotels_filter_by_stars() {
    let state = test_state();
    for (i, stars) in [3, 4, 5, 5].iter().enumerate() {
        let hotel = sample_hotel(
            &format!("h{i}"),
            &format!("Hotel {i}"),
            "Hyderabad",
            "Telangana",
            *stars,
            4000.0,
            &[],
            false,
            i as u32 + 1,
        );
        state.store.insert_hotel(&hotel).await.unwrap();
    }

    let app = test_app(state);
    let res = app
        .oneshot(get_request("/api/hotels?stars=4,5", None))
        .await
        .unwrap();
    let json = body_json(res).await;
    let hotels = json.as_array().unwrap();
    assert_eq!(hotels.len(), 3);
    assert!(hotels.iter().all(|h| h["starRating"].as_i64().unwrap() >= 4));
}

#[tokio::test]
async fn test_hotels_amenities_require_every_tag() {
    let state = test_state();
    state
        .store
        .insert_hotel(&sample_hotel(
            "both", "Grand", "Hyderabad", "Telangana", 5, 8000.0,
            &["WiFi", "Pool", "Spa"], false, 1,
        ))
        .await
        .unwrap();
    state
        .store
        .insert_hotel(&sample_hotel(
            "wifi-only", "Lodge", "Hyderabad", "Telangana", 4, 3000.0,
            &["WiFi"], false, 2,
        ))
        .await
        .unwrap();

    let app = test_app(state);
    let res = app
        .oneshot(get_request("/api/hotels?amenities=WiFi,Pool", None))
        .await
        .unwrap();
    let json = body_json(res).await;
    let hotels = json.as_array().unwrap();
    assert_eq!(hotels.len(), 1);
    assert_eq!(hotels[0]["id"], "both");
}

#[tokio::test]
async fn test_hotels_malformed_price_filter_ignored() {
    let state = test_state();
    state
        .store
        .insert_hotel(&sample_hotel(
            "h1", "Grand", "Hyderabad", "Telangana", 5, 8000.0, &[], false, 1,
        ))
        .await
        .unwrap();

    let app = test_app(state);
    let res = app
        .oneshot(get_request("/api/hotels?minPrice=abc&maxPrice=", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_hotels_city_exact_case_insensitive() {
    let state = test_state();
    state
        .store
        .insert_hotel(&sample_hotel(
            "h1", "Grand", "Hyderabad", "Telangana", 5, 8000.0, &[], false, 1,
        ))
        .await
        .unwrap();
    state
        .store
        .insert_hotel(&sample_hotel(
            "h2", "Beach Stay", "Visakhapatnam", "Andhra Pradesh", 4, 5000.0, &[], false, 2,
        ))
        .await
        .unwrap();

    let app = test_app(state.clone());
    let res = app
        .oneshot(get_request("/api/hotels?city=hyderabad", None))
        .await
        .unwrap();
    let json = body_json(res).await;
    let hotels = json.as_array().unwrap();
    assert_eq!(hotels.len(), 1);
    assert_eq!(hotels[0]["id"], "h1");

    // A city prefix is not an exact match; substring search lives in `search`.
    let app = test_app(state.clone());
    let res = app
        .oneshot(get_request("/api/hotels?city=hyder", None))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 0);

    let app = test_app(state);
    let res = app
        .oneshot(get_request("/api/hotels?search=hyder", None))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_hotels_sort_price_low() {
    let state = test_state();
    state
        .store
        .insert_hotel(&sample_hotel(
            "pricey", "Grand", "Hyderabad", "Telangana", 5, 9000.0, &[], false, 1,
        ))
        .await
        .unwrap();
    state
        .store
        .insert_hotel(&sample_hotel(
            "cheap", "Lodge", "Hyderabad", "Telangana", 3, 2000.0, &[], false, 2,
        ))
        .await
        .unwrap();

    let app = test_app(state);
    let res = app
        .oneshot(get_request("/api/hotels?sort=priceLow", None))
        .await
        .unwrap();
    let json = body_json(res).await;
    let hotels = json.as_array().unwrap();
    assert_eq!(hotels[0]["id"], "cheap");
    assert_eq!(hotels[1]["id"], "pricey");
}

#[tokio::test]
async fn test_featured_capped_at_six() {
    let state = test_state();
    for i in 0..8 {
        state
            .store
            .insert_hotel(&sample_hotel(
                &format!("f{i}"),
                &format!("Featured {i}"),
                "Hyderabad",
                "Telangana",
                5,
                8000.0,
                &[],
                true,
                i + 1,
            ))
            .await
            .unwrap();
    }

    let app = test_app(state);
    let res = app
        .oneshot(get_request("/api/hotels/featured", None))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_hotel_detail_embeds_rooms() {
    let state = test_state();
    state
        .store
        .insert_hotel(&sample_hotel(
            "h1", "Grand", "Hyderabad", "Telangana", 5, 8000.0, &[], false, 1,
        ))
        .await
        .unwrap();
    state
        .store
        .insert_room(&sample_room("r1", "h1", 8000.0))
        .await
        .unwrap();

    let app = test_app(state.clone());
    let res = app
        .oneshot(get_request("/api/hotels/h1", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["name"], "Grand");
    assert_eq!(json["rooms"].as_array().unwrap().len(), 1);
    assert_eq!(json["rooms"][0]["type"], "Deluxe");

    let app = test_app(state);
    let res = app
        .oneshot(get_request("/api/hotels/missing", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

// ── Bookings ──

async fn seed_bookable_hotel(state: &Arc<AppState>) {
    state
        .store
        .insert_hotel(&sample_hotel(
            "h1", "Grand", "Hyderabad", "Telangana", 5, 5000.0, &[], false, 1,
        ))
        .await
        .unwrap();
    state
        .store
        .insert_room(&sample_room("r1", "h1", 5000.0))
        .await
        .unwrap();
}

const BOOKING_BODY: &str = r#"{"hotelId":"h1","roomId":"r1","checkInDate":"2025-01-01","checkOutDate":"2025-01-03","guests":{"adults":2,"children":0}}"#;

#[tokio::test]
async fn test_booking_requires_auth() {
    let state = test_state();
    seed_bookable_hotel(&state).await;

    let app = test_app(state);
    let res = app
        .oneshot(json_request("POST", "/api/bookings", None, BOOKING_BODY))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_booking_create_computes_total() {
    let state = test_state();
    seed_bookable_hotel(&state).await;
    let token = register_user(&state, "guest@example.com").await;

    let app = test_app(state);
    let res = app
        .oneshot(json_request(
            "POST",
            "/api/bookings",
            Some(&token),
            BOOKING_BODY,
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    // 2 nights at 5000/night with the 12% surcharge.
    assert_eq!(json["totalAmount"], 11200.0);
    assert_eq!(json["status"], "confirmed");
    assert_eq!(json["paymentStatus"], "paid");
    assert!(json["bookingReference"]
        .as_str()
        .unwrap()
        .starts_with("LUX"));
    assert_eq!(json["hotel"]["name"], "Grand");
    assert_eq!(json["room"]["type"], "Deluxe");
}

#[tokio::test]
async fn test_booking_rejects_bad_dates_without_persisting() {
    let state = test_state();
    seed_bookable_hotel(&state).await;
    let token = register_user(&state, "guest@example.com").await;

    for body in [
        // check-out equal to check-in
        r#"{"hotelId":"h1","roomId":"r1","checkInDate":"2025-01-01","checkOutDate":"2025-01-01","guests":{"adults":2,"children":0}}"#,
        // check-out before check-in
        r#"{"hotelId":"h1","roomId":"r1","checkInDate":"2025-01-05","checkOutDate":"2025-01-03","guests":{"adults":2,"children":0}}"#,
        // unparseable date
        r#"{"hotelId":"h1","roomId":"r1","checkInDate":"soon","checkOutDate":"2025-01-03","guests":{"adults":2,"children":0}}"#,
    ] {
        let app = test_app(state.clone());
        let res = app
            .oneshot(json_request("POST", "/api/bookings", Some(&token), body))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    let app = test_app(state);
    let res = app
        .oneshot(get_request("/api/bookings/my", Some(&token)))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 0, "no booking persisted");
}

#[tokio::test]
async fn test_booking_requires_at_least_one_adult() {
    let state = test_state();
    seed_bookable_hotel(&state).await;
    let token = register_user(&state, "guest@example.com").await;

    let app = test_app(state);
    let res = app
        .oneshot(json_request(
            "POST",
            "/api/bookings",
            Some(&token),
            r#"{"hotelId":"h1","roomId":"r1","checkInDate":"2025-01-01","checkOutDate":"2025-01-03","guests":{"adults":0,"children":1}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    let fields: Vec<&str> = json["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"guests.adults"));
}

#[tokio::test]
async fn test_booking_fails_closed_on_unknown_refs() {
    let state = test_state();
    seed_bookable_hotel(&state).await;
    // A second hotel whose room must not be bookable under h1.
    state
        .store
        .insert_hotel(&sample_hotel(
            "h2", "Other", "Vijayawada", "Andhra Pradesh", 4, 4000.0, &[], false, 2,
        ))
        .await
        .unwrap();
    state
        .store
        .insert_room(&sample_room("r2", "h2", 4000.0))
        .await
        .unwrap();
    let token = register_user(&state, "guest@example.com").await;

    for body in [
        r#"{"hotelId":"missing","roomId":"r1","checkInDate":"2025-01-01","checkOutDate":"2025-01-03","guests":{"adults":2,"children":0}}"#,
        r#"{"hotelId":"h1","roomId":"missing","checkInDate":"2025-01-01","checkOutDate":"2025-01-03","guests":{"adults":2,"children":0}}"#,
        // room exists but belongs to another hotel
        r#"{"hotelId":"h1","roomId":"r2","checkInDate":"2025-01-01","checkOutDate":"2025-01-03","guests":{"adults":2,"children":0}}"#,
    ] {
        let app = test_app(state.clone());
        let res = app
            .oneshot(json_request("POST", "/api/bookings", Some(&token), body))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_booking_references_are_distinct() {
    let state = test_state();
    seed_bookable_hotel(&state).await;
    let token = register_user(&state, "guest@example.com").await;

    let mut references = vec![];
    for _ in 0..2 {
        let app = test_app(state.clone());
        let res = app
            .oneshot(json_request(
                "POST",
                "/api/bookings",
                Some(&token),
                BOOKING_BODY,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let json = body_json(res).await;
        references.push(json["bookingReference"].as_str().unwrap().to_string());
    }
    assert_ne!(references[0], references[1]);
}

#[tokio::test]
async fn test_my_bookings_newest_first() {
    let state = test_state();
    seed_bookable_hotel(&state).await;
    let token = register_user(&state, "guest@example.com").await;

    let mut references = vec![];
    for _ in 0..2 {
        let app = test_app(state.clone());
        let res = app
            .oneshot(json_request(
                "POST",
                "/api/bookings",
                Some(&token),
                BOOKING_BODY,
            ))
            .await
            .unwrap();
        let json = body_json(res).await;
        references.push(json["bookingReference"].as_str().unwrap().to_string());
    }

    let app = test_app(state);
    let res = app
        .oneshot(get_request("/api/bookings/my", Some(&token)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    let bookings = json.as_array().unwrap();
    assert_eq!(bookings.len(), 2);
    assert_eq!(bookings[0]["bookingReference"], references[1].as_str());
    assert_eq!(bookings[1]["bookingReference"], references[0].as_str());
    assert_eq!(bookings[0]["hotel"]["name"], "Grand");
}

// ── Profile & favorites ──

#[tokio::test]
async fn test_profile_get_and_update() {
    let state = test_state();
    let token = register_user(&state, "profile@example.com").await;

    let app = test_app(state.clone());
    let res = app
        .oneshot(get_request("/api/users/profile", Some(&token)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["email"], "profile@example.com");
    assert!(
        json.get("passwordHash").is_none(),
        "hash must never be serialized"
    );

    let app = test_app(state.clone());
    let res = app
        .oneshot(json_request(
            "PUT",
            "/api/users/profile",
            Some(&token),
            r#"{"fullName":"Renamed User","address":{"street":"2 Beach Road","city":"Visakhapatnam","state":"Andhra Pradesh","pinCode":"530002"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let app = test_app(state);
    let res = app
        .oneshot(get_request("/api/users/profile", Some(&token)))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json["fullName"], "Renamed User");
    assert_eq!(json["address"]["city"], "Visakhapatnam");
    // Fields not supplied in the update are untouched.
    assert_eq!(json["phone"], "9876543210");
}

#[tokio::test]
async fn test_favorites_toggle_round_trip() {
    let state = test_state();
    let token = register_user(&state, "fav@example.com").await;

    let app = test_app(state.clone());
    let res = app
        .oneshot(get_request("/api/users/favorites", Some(&token)))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 0);

    let app = test_app(state.clone());
    let res = app
        .oneshot(json_request(
            "POST",
            "/api/users/favorites/toggle",
            Some(&token),
            r#"{"hotelId":"h1"}"#,
        ))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0], "h1");

    let app = test_app(state);
    let res = app
        .oneshot(json_request(
            "POST",
            "/api/users/favorites/toggle",
            Some(&token),
            r#"{"hotelId":"h1"}"#,
        ))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 0, "toggle round-trips");
}

#[tokio::test]
async fn test_favorites_require_auth() {
    let state = test_state();
    let app = test_app(state);

    let res = app
        .oneshot(get_request("/api/users/favorites", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
