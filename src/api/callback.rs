use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::Mutex;

use crate::types::CallbackOutcome;

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<Arc<Mutex<Option<CallbackOutcome>>>>,
) -> Html<&'static str> {
    let mut state = shared_state.lock().await;

    if let Some(code) = params.get("code").filter(|c| !c.is_empty()) {
        *state = Some(CallbackOutcome::Code(code.clone()));
        return Html("<h2>Authentication successful.</h2><p>Close this browser window.</p>");
    }

    let reason = params
        .get("error")
        .cloned()
        .unwrap_or_else(|| "missing authorization code".to_string());
    *state = Some(CallbackOutcome::Denied(reason));
    Html("<h4>Login failed.</h4>")
}
