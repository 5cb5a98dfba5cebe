use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, sync::Mutex, task::JoinHandle};

use crate::{
    api,
    error::{Result, TriviaError},
    types::CallbackOutcome,
    warning,
};

/// Binds the OAuth callback server and serves it on a background task.
///
/// Binding happens before this returns so an occupied port surfaces as an error
/// instead of a silent timeout. Abort the returned handle once the callback has
/// been received.
pub async fn start_api_server(
    address: &str,
    state: Arc<Mutex<Option<CallbackOutcome>>>,
) -> Result<JoinHandle<()>> {
    let app = Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback).layer(Extension(state)));

    let addr = SocketAddr::from_str(address).map_err(|e| {
        TriviaError::Config(format!("invalid server address '{}': {}", address, e))
    })?;

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        TriviaError::AuthUnavailable(format!("cannot listen on {}: {}", addr, e))
    })?;

    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            warning!("Callback server stopped: {}", e);
        }
    }))
}
