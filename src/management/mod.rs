mod auth;
mod genres;
mod store;

pub use auth::TokenManager;
pub use genres::GenreCache;
pub use store::CredentialStore;
pub use store::FileCredentialStore;
pub use store::KEY_ACCESS_TOKEN;
pub use store::KEY_CODE_VERIFIER;
pub use store::KEY_EXPIRES_AT;
pub use store::KEY_REFRESH_TOKEN;
pub use store::MemoryCredentialStore;
