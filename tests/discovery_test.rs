mod common;

use std::sync::Arc;

use serde_json::{Value, json};

use common::*;
use tunetrivia::{
    cli::Services,
    discovery::Discovery,
    error::TriviaError,
    http::{HttpResponse, Method},
    management::MemoryCredentialStore,
    types::{Decade, Difficulty, Filters},
};

const PREVIEW: Option<&str> = Some("https://p.scdn.co/mp3-preview/clip");

const SEEDS_PATH: &str = "/v1/recommendations/available-genre-seeds";
const RECOMMENDATIONS_PATH: &str = "/v1/recommendations";
const SEARCH_PATH: &str = "/v1/search";

async fn authenticated(http: Arc<FakeHttp>) -> Services {
    let store = Arc::new(MemoryCredentialStore::new());
    store_credential(&store, "valid-access", Some("stored-refresh"), 3600).await;
    services(http, store, FakeAuthorizer::declining())
}

fn with_seeds(http: &FakeHttp) {
    http.on(
        Method::Get,
        SEEDS_PATH,
        200,
        json!({ "genres": ["pop", "rock", "hip-hop", "jazz"] }),
    );
}

fn recommendations(tracks: Vec<Value>) -> Value {
    json!({ "tracks": tracks, "seeds": [] })
}

fn search_page(tracks: Vec<Value>) -> Value {
    json!({ "tracks": { "items": tracks, "total": 0, "limit": 50, "offset": 0 } })
}

fn expect_track(result: Discovery) -> tunetrivia::types::Track {
    match result {
        Discovery::Track(track) => track,
        other => panic!("expected a track, got {:?}", other),
    }
}

#[tokio::test]
async fn test_all_filters_narrow_to_one_track() {
    let http = FakeHttp::new();
    with_seeds(&http);
    http.on(
        Method::Get,
        RECOMMENDATIONS_PATH,
        200,
        recommendations(vec![
            track_json("match", "a1", "al1", "1994-03-01", 85, PREVIEW),
            track_json("eighties", "a1", "al1", "1985-06-01", 85, PREVIEW),
            track_json("too-obscure", "a1", "al1", "1996", 30, PREVIEW),
            track_json("silent", "a1", "al1", "1992-01-01", 90, None),
        ]),
    );
    http.on(Method::Get, "/v1/artists/a1", 200, artist_json("a1", &["dance pop"]));
    http.on(Method::Get, "/v1/albums/al1", 200, album_json("al1", &[]));

    let services = authenticated(http.clone()).await;
    let filters = Filters::default()
        .with_genre("pop")
        .with_decade(Decade::Nineties)
        .with_difficulty(Difficulty::Easy);

    let track = expect_track(services.engine.get_random_track(&filters).await.unwrap());
    assert_eq!(track.id, "match");

    let request = &http.requests_to(RECOMMENDATIONS_PATH)[0];
    assert_eq!(request.bearer.as_deref(), Some("valid-access"));
    assert_eq!(request.query_value("seed_genres"), Some("pop"));
    assert_eq!(request.query_value("min_popularity"), Some("70"));
    assert_eq!(request.query_value("max_popularity"), Some("100"));
    assert_eq!(request.query_value("limit"), Some("100"));

    // One shared artist and album, looked up once each
    assert_eq!(http.count("/v1/artists/a1"), 1);
    assert_eq!(http.count("/v1/albums/al1"), 1);
}

fn nineties_pop(preview: Option<&str>) -> Value {
    recommendations(vec![
        track_json("p1", "a1", "al1", "1991-04-01", 80, preview),
        track_json("p2", "a1", "al1", "1995-09-12", 90, preview),
        track_json("p3", "a1", "al1", "1999", 95, preview),
    ])
}

fn nineties_pop_filters() -> Filters {
    Filters::default()
        .with_genre("pop")
        .with_decade(Decade::Nineties)
        .with_difficulty(Difficulty::Easy)
}

#[tokio::test]
async fn test_every_candidate_of_a_full_match_is_eligible() {
    let http = FakeHttp::new();
    with_seeds(&http);
    http.on(Method::Get, RECOMMENDATIONS_PATH, 200, nineties_pop(PREVIEW));
    http.on(Method::Get, "/v1/artists/a1", 200, artist_json("a1", &["pop"]));
    http.on(Method::Get, "/v1/albums/al1", 200, album_json("al1", &[]));

    let services = authenticated(http.clone()).await;
    let mut seen = std::collections::BTreeSet::new();
    for _ in 0..60 {
        let track = expect_track(
            services
                .engine
                .get_random_track(&nineties_pop_filters())
                .await
                .unwrap(),
        );
        seen.insert(track.id);
    }

    // Nothing is rejected by difficulty, so every track gets picked eventually
    let expected: std::collections::BTreeSet<String> =
        ["p1", "p2", "p3"].iter().map(|s| s.to_string()).collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_tracks_without_preview_are_not_eligible() {
    let http = FakeHttp::new();
    with_seeds(&http);
    http.on(Method::Get, RECOMMENDATIONS_PATH, 200, nineties_pop(None));
    http.on(Method::Get, "/v1/artists/a1", 200, artist_json("a1", &["pop"]));
    http.on(Method::Get, "/v1/albums/al1", 200, album_json("al1", &[]));
    http.on(Method::Get, SEARCH_PATH, 200, search_page(vec![]));

    let services = authenticated(http.clone()).await;

    let filters = nineties_pop_filters();
    let result = services.engine.get_random_track(&filters).await.unwrap();
    assert_eq!(
        result,
        Discovery::NoTracksFound {
            attempted_filters: filters
        }
    );
    assert_eq!(http.count(SEARCH_PATH), 0);

    // With relaxing enabled the cascade moves on to the looser variants
    let filters = nineties_pop_filters().relaxed(true);
    let result = services.engine.get_random_track(&filters).await.unwrap();
    assert!(matches!(result, Discovery::NoTracksFound { .. }));
    assert_eq!(http.count(SEARCH_PATH), 3);
}

#[tokio::test]
async fn test_genre_verification_drops_mismatched_tracks() {
    let http = FakeHttp::new();
    with_seeds(&http);
    http.on(
        Method::Get,
        RECOMMENDATIONS_PATH,
        200,
        recommendations(vec![
            track_json("rock-track", "rocker", "al1", "2001", 60, PREVIEW),
            track_json("jazz-track", "jazzer", "al2", "2001", 60, PREVIEW),
        ]),
    );
    http.on(
        Method::Get,
        "/v1/artists",
        200,
        json!({ "artists": [
            artist_json("rocker", &["album rock", "classic rock"]),
            artist_json("jazzer", &["cool jazz"]),
        ]}),
    );
    http.on(Method::Get, "/v1/albums/al1", 200, album_json("al1", &[]));
    http.on(Method::Get, "/v1/albums/al2", 200, album_json("al2", &[]));

    let services = authenticated(http.clone()).await;
    let filters = Filters::default().with_genre("Rock");

    for _ in 0..5 {
        let track = expect_track(services.engine.get_random_track(&filters).await.unwrap());
        assert_eq!(track.id, "rock-track");
    }

    // Two artists go through the batch endpoint once; later rounds hit the cache
    let batch = http.requests_to("/v1/artists");
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].query_value("ids"), Some("rocker,jazzer"));
}

#[tokio::test]
async fn test_unknown_genre_without_relax_finds_nothing() {
    let http = FakeHttp::new();
    with_seeds(&http);

    let services = authenticated(http.clone()).await;
    let filters = Filters::default().with_genre("nonexistent-genre");

    let result = services.engine.get_random_track(&filters).await.unwrap();
    assert_eq!(
        result,
        Discovery::NoTracksFound {
            attempted_filters: filters
        }
    );
    assert_eq!(http.count(RECOMMENDATIONS_PATH), 0);
    assert_eq!(http.count(SEARCH_PATH), 0);
}

#[tokio::test]
async fn test_unknown_genre_with_relax_drops_genres() {
    let http = FakeHttp::new();
    with_seeds(&http);
    http.on(
        Method::Get,
        SEARCH_PATH,
        200,
        search_page(vec![track_json("any", "a1", "al1", "2011-02-02", 55, PREVIEW)]),
    );

    let services = authenticated(http.clone()).await;
    let filters = Filters::default()
        .with_genre("nonexistent-genre")
        .relaxed(true);

    let track = expect_track(services.engine.get_random_track(&filters).await.unwrap());
    assert_eq!(track.id, "any");

    let search = &http.requests_to(SEARCH_PATH)[0];
    assert_eq!(search.query_value("type"), Some("track"));
    assert_eq!(search.query_value("limit"), Some("50"));
    assert_eq!(search.query_value("q").map(str::len), Some(1));

    // Genres were dropped, so nothing needed verifying
    assert_eq!(http.count_prefix("/v1/artists"), 0);
}

#[tokio::test]
async fn test_relax_cascade_stops_after_four_queries() {
    let http = FakeHttp::new();
    with_seeds(&http);
    http.on(Method::Get, RECOMMENDATIONS_PATH, 200, recommendations(vec![]));
    http.on(Method::Get, SEARCH_PATH, 200, search_page(vec![]));

    let services = authenticated(http.clone()).await;
    let filters = Filters::default()
        .with_genre("pop")
        .with_decade(Decade::Nineties)
        .with_difficulty(Difficulty::Easy)
        .relaxed(true);

    let result = services.engine.get_random_track(&filters).await.unwrap();
    assert_eq!(
        result,
        Discovery::NoTracksFound {
            attempted_filters: filters
        }
    );

    assert_eq!(http.count(RECOMMENDATIONS_PATH), 1);
    let searches = http.requests_to(SEARCH_PATH);
    assert_eq!(searches.len(), 3);

    // Without genres but still within the decade
    assert!(searches[0].query_value("q").unwrap().ends_with(" year:1990-1999"));
    assert!(!searches[1].query_value("q").unwrap().contains("year:"));
    assert!(!searches[2].query_value("q").unwrap().contains("year:"));
}

#[tokio::test]
async fn test_relax_keeps_decade_when_dropping_genres() {
    let http = FakeHttp::new();
    with_seeds(&http);
    http.on(Method::Get, RECOMMENDATIONS_PATH, 200, recommendations(vec![]));
    http.on(
        Method::Get,
        SEARCH_PATH,
        200,
        search_page(vec![
            track_json("old", "a1", "al1", "1972-01-01", 50, PREVIEW),
            track_json("nineties", "a2", "al2", "1999-12-31", 50, PREVIEW),
        ]),
    );

    let services = authenticated(http.clone()).await;
    let filters = Filters::default()
        .with_genre("jazz")
        .with_decade(Decade::Nineties)
        .relaxed(true);

    for _ in 0..5 {
        let track = expect_track(services.engine.get_random_track(&filters).await.unwrap());
        assert_eq!(track.id, "nineties");
    }
}

#[tokio::test]
async fn test_rejected_token_is_renewed_once() {
    let http = FakeHttp::new();
    http.on(
        Method::Post,
        TOKEN_PATH,
        200,
        token_json("refreshed-access", None, 3600),
    );
    http.on_fn(Method::Get, SEARCH_PATH, |req| {
        if req.bearer.as_deref() == Some("valid-access") {
            HttpResponse::new(401, json!({"error": {"status": 401}}).to_string())
        } else {
            HttpResponse::new(
                200,
                search_page(vec![track_json("t", "a1", "al1", "2005", 50, PREVIEW)]).to_string(),
            )
        }
    });

    let services = authenticated(http.clone()).await;
    let track = expect_track(
        services
            .engine
            .get_random_track(&Filters::default())
            .await
            .unwrap(),
    );
    assert_eq!(track.id, "t");

    let searches = http.requests_to(SEARCH_PATH);
    assert_eq!(searches.len(), 2);
    assert_eq!(searches[1].bearer.as_deref(), Some("refreshed-access"));
    assert_eq!(http.count(TOKEN_PATH), 1);
}

#[tokio::test]
async fn test_second_rejection_is_unauthorized() {
    let http = FakeHttp::new();
    http.on(
        Method::Post,
        TOKEN_PATH,
        200,
        token_json("refreshed-access", None, 3600),
    );
    http.on(Method::Get, SEARCH_PATH, 401, json!({"error": {"status": 401}}));

    let services = authenticated(http.clone()).await;
    let filters = Filters::default().relaxed(true);
    let err = services.engine.get_random_track(&filters).await.unwrap_err();

    assert!(matches!(err, TriviaError::Unauthorized));
    assert!(!err.is_transient());

    // Aborted on the first variant, no retry loop
    assert_eq!(http.count(SEARCH_PATH), 2);
    assert_eq!(http.count(TOKEN_PATH), 1);
}

#[tokio::test]
async fn test_server_error_counts_as_empty_step() {
    let http = FakeHttp::new();
    http.on(Method::Get, SEARCH_PATH, 503, json!({"error": "unavailable"}));

    let services = authenticated(http.clone()).await;
    let result = services
        .engine
        .get_random_track(&Filters::default())
        .await
        .unwrap();

    assert!(matches!(result, Discovery::NoTracksFound { .. }));
}

#[tokio::test]
async fn test_transport_failure_falls_through_to_next_variant() {
    let http = FakeHttp::new();
    with_seeds(&http);
    http.fail_transport(RECOMMENDATIONS_PATH);
    http.on(
        Method::Get,
        SEARCH_PATH,
        200,
        search_page(vec![track_json("fallback", "a1", "al1", "2015", 50, PREVIEW)]),
    );

    let services = authenticated(http.clone()).await;
    let filters = Filters::default().with_genre("pop").relaxed(true);

    let track = expect_track(services.engine.get_random_track(&filters).await.unwrap());
    assert_eq!(track.id, "fallback");
    assert_eq!(http.count(RECOMMENDATIONS_PATH), 1);
}

#[tokio::test]
async fn test_only_unplayable_tracks_is_no_tracks_found() {
    let http = FakeHttp::new();
    http.on(
        Method::Get,
        SEARCH_PATH,
        200,
        search_page(vec![
            track_json("a", "a1", "al1", "2015", 50, None),
            track_json("b", "a1", "al1", "2016", 50, None),
        ]),
    );

    let services = authenticated(http).await;
    let result = services
        .engine
        .get_random_track(&Filters::default().relaxed(true))
        .await
        .unwrap();

    assert!(matches!(result, Discovery::NoTracksFound { .. }));
}

#[tokio::test]
async fn test_missing_credential_aborts_before_querying() {
    let http = FakeHttp::new();
    let services = services(
        http.clone(),
        Arc::new(MemoryCredentialStore::new()),
        FakeAuthorizer::declining(),
    );

    let err = services
        .engine
        .get_random_track(&Filters::default().relaxed(true))
        .await
        .unwrap_err();

    assert!(matches!(err, TriviaError::AuthUnavailable(_)));
    assert_eq!(http.count_prefix("/v1/"), 0);
}

#[tokio::test]
async fn test_failed_login_during_genre_lookup_aborts_discovery() {
    let http = FakeHttp::new();
    with_seeds(&http);
    http.on(Method::Post, TOKEN_PATH, 400, json!({"error": "invalid_grant"}));
    let candidates = (0..15)
        .map(|i| {
            track_json(
                &format!("t{}", i),
                &format!("a{}", i),
                &format!("al{}", i),
                "2012",
                60,
                PREVIEW,
            )
        })
        .collect();
    http.on(Method::Get, RECOMMENDATIONS_PATH, 200, recommendations(candidates));
    http.on(Method::Get, "/v1/artists", 401, json!({"error": {"status": 401}}));
    for i in 0..15 {
        http.on(
            Method::Get,
            &format!("/v1/albums/al{}", i),
            401,
            json!({"error": {"status": 401}}),
        );
    }

    let store = Arc::new(MemoryCredentialStore::new());
    store_credential(&store, "valid-access", Some("stored-refresh"), 3600).await;
    let authorizer = FakeAuthorizer::declining();
    let services = services(http.clone(), store, authorizer.clone());

    let filters = Filters::default().with_genre("pop").relaxed(true);
    let err = services.engine.get_random_track(&filters).await.unwrap_err();

    assert!(err.is_auth_failure());
    assert_eq!(authorizer.calls(), 1);
    assert_eq!(http.count(TOKEN_PATH), 1);
    // Neither later batches nor later variants ran
    assert!(http.count_prefix("/v1/albums/") <= 10);
    assert_eq!(http.count(SEARCH_PATH), 0);
}
