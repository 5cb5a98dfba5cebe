use crate::{cli::Services, error, success};

pub async fn auth(services: &Services) {
    match services.tokens.authenticate().await {
        Ok(_) => success!("Authentication successful!"),
        Err(e) => error!("Authentication failed: {}", e),
    }
}

pub async fn logout(services: &Services) {
    match services.tokens.logout().await {
        Ok(()) => success!("Stored credentials removed."),
        Err(e) => error!("Failed to remove stored credentials: {}", e),
    }
}
