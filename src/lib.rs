//! Random track discovery for a music trivia game.
//!
//! This library picks a random, filter-matched track from the Spotify catalog
//! for one trivia round. It manages the OAuth 2.0 PKCE credential (login,
//! persistence, refresh before expiry) and runs an adaptive cascade of catalog
//! queries that filters candidates by genre, decade, difficulty and playback
//! eligibility.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints of the local OAuth callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `discovery` - The filter cascade and the difficulty classifier
//! - `error` - Error taxonomy shared by all components
//! - `http` - HTTP capability trait and its reqwest implementation
//! - `management` - Credential lifecycle, credential storage and genre caches
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Spotify token and catalog endpoints
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use tunetrivia::{cli::Services, config, types::Filters};
//!
//! #[tokio::main]
//! async fn main() -> tunetrivia::error::Result<()> {
//!     config::load_env().await?;
//!     let services = Services::from_settings(config::Settings::from_env()?);
//!     let round = services.engine.get_random_track(&Filters::default()).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod http;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// Prints an informational message with a blue bullet point.
///
/// Creates a formatted output line with a distinctive blue "o" indicator
/// followed by the provided message. Used for general information and
/// status updates throughout the application.
///
/// # Arguments
///
/// The macro accepts the same arguments as `println!`, supporting format
/// strings and interpolation.
///
/// # Example
///
/// ```
/// info!("Starting authentication process...");
/// info!("Found {} candidate tracks", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// Creates a formatted output line with a green "✓" indicator to signify
/// successful completion of operations. Used to provide positive feedback
/// when operations complete successfully.
///
/// # Arguments
///
/// The macro accepts the same arguments as `println!`, supporting format
/// strings and interpolation.
///
/// # Example
///
/// ```
/// success!("Authentication completed successfully");
/// success!("Logged out");
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Writes a line with a red "!" indicator to stderr and immediately terminates
/// the program with exit code 1. Only the command-line layer uses it; library
/// components return errors instead.
///
/// # Arguments
///
/// The macro accepts the same arguments as `println!`, supporting format
/// strings and interpolation.
///
/// # Behavior
///
/// This macro will cause the program to exit immediately after printing
/// the error message. It should only be used for fatal errors where
/// recovery is not possible.
///
/// # Example
///
/// ```
/// error!("Failed to load configuration");
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Writes a line with a yellow "!" indicator to stderr. Library components use
/// it for failures they absorb: transient catalog errors inside one discovery
/// step, refresh failures before falling back to a new login, and genre
/// lookups that defaulted to keeping a track.
///
/// # Arguments
///
/// The macro accepts the same arguments as `println!`, supporting format
/// strings and interpolation.
///
/// # Example
///
/// ```
/// warning!("Token refresh failed, starting a new login");
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
