use tabled::Table;

use crate::{
    cli::{Services, spinner},
    error,
    types::GenreTableRow,
    utils, warning,
};

pub async fn genres(services: &Services, search: Option<String>) {
    let pb = spinner("Fetching available genres...");
    let result = services.genres.available_genres().await;
    pb.finish_and_clear();

    let genres = match result {
        Ok(genres) => genres,
        Err(e) if e.is_auth_failure() => {
            error!("Not logged in. Please run tunetrivia auth\n Error: {}", e)
        }
        Err(e) => error!("Failed to fetch genres. Err: {}", e),
    };

    let search_term = search.map(|s| utils::normalize_genre(&s));
    let rows: Vec<GenreTableRow> = genres
        .iter()
        .filter(|g| {
            search_term
                .as_deref()
                .is_none_or(|term| g.contains(term))
        })
        .map(|g| GenreTableRow { genre: g.clone() })
        .collect();

    if rows.is_empty() {
        warning!("No genre matches your search.");
        return;
    }

    println!("{}", Table::new(rows));
}
