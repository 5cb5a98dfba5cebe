#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};

use tunetrivia::{
    cli::Services,
    config::{AuthSettings, Settings},
    error::{Result, TriviaError},
    http::{HttpClient, HttpRequest, HttpResponse, Method},
    management::{
        CredentialStore, KEY_ACCESS_TOKEN, KEY_CODE_VERIFIER, KEY_EXPIRES_AT, KEY_REFRESH_TOKEN,
        MemoryCredentialStore, TokenManager,
    },
    spotify::auth::{AuthorizationRequest, InteractiveAuthorizer},
};

pub const API_URL: &str = "https://api.test";
pub const TOKEN_URL: &str = "https://accounts.test/api/token";
pub const TOKEN_PATH: &str = "/api/token";

type Handler = Box<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>;

enum Responder {
    /// Answers in order; the last answer repeats.
    Sequence(VecDeque<HttpResponse>),
    Handler(Handler),
}

/// Scripted HTTP transport. Routes by method and URL path, records every request.
#[derive(Default)]
pub struct FakeHttp {
    routes: Mutex<HashMap<(bool, String), Responder>>,
    requests: Mutex<Vec<HttpRequest>>,
    failing: Mutex<Vec<String>>,
}

impl FakeHttp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        self.on_sequence(method, path, vec![(status, body)])
    }

    pub fn on_sequence(&self, method: Method, path: &str, answers: Vec<(u16, Value)>) -> &Self {
        let answers = answers
            .into_iter()
            .map(|(status, body)| HttpResponse::new(status, body.to_string()))
            .collect();
        self.routes
            .lock()
            .unwrap()
            .insert(key(method, path), Responder::Sequence(answers));
        self
    }

    pub fn on_fn<F>(&self, method: Method, path: &str, handler: F) -> &Self
    where
        F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        self.routes
            .lock()
            .unwrap()
            .insert(key(method, path), Responder::Handler(Box::new(handler)));
        self
    }

    /// Requests to `path` fail at the transport level.
    pub fn fail_transport(&self, path: &str) -> &Self {
        self.failing.lock().unwrap().push(path.to_string());
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| path_of(&r.url) == path)
            .collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| path_of(&r.url).starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl HttpClient for FakeHttp {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let path = path_of(&request.url);

        if self.failing.lock().unwrap().iter().any(|p| *p == path) {
            return Err(TriviaError::Transport(format!("connection reset: {}", path)));
        }

        let mut routes = self.routes.lock().unwrap();
        let response = match routes.get_mut(&key(request.method, &path)) {
            Some(Responder::Sequence(answers)) => {
                if answers.len() > 1 {
                    answers.pop_front().unwrap()
                } else {
                    answers.front().cloned().unwrap()
                }
            }
            Some(Responder::Handler(handler)) => handler(&request),
            None => HttpResponse::new(404, json!({"error": "not found"}).to_string()),
        };
        Ok(response)
    }
}

fn key(method: Method, path: &str) -> (bool, String) {
    (method == Method::Get, path.to_string())
}

pub fn path_of(url: &str) -> String {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    match without_scheme.find('/') {
        Some(idx) => without_scheme[idx..].to_string(),
        None => "/".to_string(),
    }
}

/// Interactive login stand-in.
pub struct FakeAuthorizer {
    code: Option<String>,
    calls: AtomicUsize,
    store: Option<Arc<MemoryCredentialStore>>,
    verifier_seen: Mutex<Option<String>>,
    last_request: Mutex<Option<AuthorizationRequest>>,
}

impl FakeAuthorizer {
    pub fn approving(code: &str) -> Arc<Self> {
        Arc::new(Self {
            code: Some(code.to_string()),
            calls: AtomicUsize::new(0),
            store: None,
            verifier_seen: Mutex::new(None),
            last_request: Mutex::new(None),
        })
    }

    pub fn declining() -> Arc<Self> {
        Arc::new(Self {
            code: None,
            calls: AtomicUsize::new(0),
            store: None,
            verifier_seen: Mutex::new(None),
            last_request: Mutex::new(None),
        })
    }

    /// Approves and remembers which verifier was persisted while the login ran.
    pub fn approving_with_store(code: &str, store: Arc<MemoryCredentialStore>) -> Arc<Self> {
        Arc::new(Self {
            code: Some(code.to_string()),
            calls: AtomicUsize::new(0),
            store: Some(store),
            verifier_seen: Mutex::new(None),
            last_request: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn verifier_seen(&self) -> Option<String> {
        self.verifier_seen.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<AuthorizationRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl InteractiveAuthorizer for FakeAuthorizer {
    async fn authorize(&self, request: &AuthorizationRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        if let Some(store) = &self.store {
            let verifier = store.get(KEY_CODE_VERIFIER).await?;
            *self.verifier_seen.lock().unwrap() = verifier;
        }

        tokio::time::sleep(Duration::from_millis(5)).await;
        self.code
            .clone()
            .ok_or_else(|| TriviaError::AuthUnavailable("user declined".to_string()))
    }
}

pub fn auth_settings() -> AuthSettings {
    AuthSettings {
        client_id: "test-client".to_string(),
        redirect_uri: "http://127.0.0.1:8888/callback".to_string(),
        scope: "user-read-private".to_string(),
        auth_url: "https://accounts.test/authorize".to_string(),
        token_url: TOKEN_URL.to_string(),
    }
}

pub fn settings() -> Settings {
    Settings {
        auth: auth_settings(),
        api_url: API_URL.to_string(),
        server_address: "127.0.0.1:0".to_string(),
        auth_timeout: Duration::from_secs(1),
        genre_cache_capacity: 64,
    }
}

pub fn token_manager(
    http: Arc<FakeHttp>,
    store: Arc<MemoryCredentialStore>,
    authorizer: Arc<FakeAuthorizer>,
) -> TokenManager {
    TokenManager::new(http, store, authorizer, auth_settings())
}

pub fn services(
    http: Arc<FakeHttp>,
    store: Arc<MemoryCredentialStore>,
    authorizer: Arc<FakeAuthorizer>,
) -> Services {
    Services::with_collaborators(settings(), http, store, authorizer)
}

/// Persists a credential expiring `expires_in_secs` from now (negative: already expired).
pub async fn store_credential(
    store: &MemoryCredentialStore,
    access_token: &str,
    refresh_token: Option<&str>,
    expires_in_secs: i64,
) {
    store.set(KEY_ACCESS_TOKEN, access_token).await.unwrap();
    if let Some(refresh) = refresh_token {
        store.set(KEY_REFRESH_TOKEN, refresh).await.unwrap();
    }
    let expires_at = Utc::now().timestamp() + expires_in_secs;
    store
        .set(KEY_EXPIRES_AT, &expires_at.to_string())
        .await
        .unwrap();
}

pub fn token_json(access_token: &str, refresh_token: Option<&str>, expires_in: i64) -> Value {
    match refresh_token {
        Some(refresh) => json!({
            "access_token": access_token,
            "token_type": "Bearer",
            "scope": "user-read-private",
            "expires_in": expires_in,
            "refresh_token": refresh,
        }),
        None => json!({
            "access_token": access_token,
            "token_type": "Bearer",
            "scope": "user-read-private",
            "expires_in": expires_in,
        }),
    }
}

pub fn track_json(
    id: &str,
    artist_id: &str,
    album_id: &str,
    release_date: &str,
    popularity: u32,
    preview_url: Option<&str>,
) -> Value {
    json!({
        "id": id,
        "name": format!("Track {}", id),
        "artists": [{ "id": artist_id, "name": format!("Artist {}", artist_id) }],
        "album": {
            "id": album_id,
            "name": format!("Album {}", album_id),
            "images": [{ "url": "https://img.test/cover.jpg", "height": 640, "width": 640 }],
            "release_date": release_date,
        },
        "preview_url": preview_url,
        "external_urls": { "spotify": format!("https://open.spotify.com/track/{}", id) },
        "popularity": popularity,
    })
}

pub fn artist_json(id: &str, genres: &[&str]) -> Value {
    json!({ "id": id, "name": format!("Artist {}", id), "genres": genres })
}

pub fn album_json(id: &str, genres: &[&str]) -> Value {
    json!({ "id": id, "name": format!("Album {}", id), "genres": genres })
}
