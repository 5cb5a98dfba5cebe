use clap::{
    ArgAction, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use tunetrivia::{
    cli::{self, Services},
    config, error,
    types::{Decade, Difficulty, Filters},
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth,

    /// Remove stored credentials
    Logout,

    /// Pick a random track for a trivia round
    Track(TrackOptions),

    /// List the genres usable as filters
    Genres(GenresOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct TrackOptions {
    /// Genre to draw from; can be repeated
    #[clap(long = "genre", action = ArgAction::Append)]
    pub genres: Vec<String>,

    /// Decade such as 1990s; can be repeated
    #[clap(long = "decade", action = ArgAction::Append)]
    pub decades: Vec<Decade>,

    /// easy, medium, hard or expert; can be repeated
    #[clap(long = "difficulty", action = ArgAction::Append)]
    pub difficulty: Vec<Difficulty>,

    /// Loosen the filters step by step when nothing matches
    #[clap(long)]
    pub relax: bool,
}

impl From<TrackOptions> for Filters {
    fn from(opt: TrackOptions) -> Self {
        Filters {
            genres: opt.genres.into_iter().collect(),
            decades: opt.decades.into_iter().collect(),
            difficulty: opt.difficulty.into_iter().collect(),
            relax_filters: opt.relax,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct GenresOptions {
    /// Only show genres containing this text
    #[clap(long)]
    pub search: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command_for_update();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    let settings = match config::Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("Invalid configuration. Err: {}", e),
    };
    let services = Services::from_settings(settings);

    match cli.command {
        Command::Auth => cli::auth(&services).await,
        Command::Logout => cli::logout(&services).await,
        Command::Track(opt) => cli::track(&services, opt.into()).await,
        Command::Genres(opt) => cli::genres(&services, opt.search).await,
        Command::Completions(_) => {}
    }
}
