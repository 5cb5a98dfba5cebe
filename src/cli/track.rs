use tabled::Table;

use crate::{
    cli::{Services, spinner},
    discovery::Discovery,
    error, info,
    types::{Filters, TrackTableRow},
    warning,
};

pub async fn track(services: &Services, filters: Filters) {
    let pb = spinner("Looking for a track...");
    let result = services.engine.get_random_track(&filters).await;
    pb.finish_and_clear();

    match result {
        Ok(Discovery::Track(track)) => {
            println!("{}", Table::new(vec![TrackTableRow::from(&track)]));
            if !track.external_url().is_empty() {
                info!("Full track: {}", track.external_url());
            }
        }
        Ok(Discovery::NoTracksFound { attempted_filters }) => {
            warning!(
                "No playable track matches genres {:?}, decades {:?}, difficulty {:?}.",
                attempted_filters.genres,
                attempted_filters
                    .decades
                    .iter()
                    .map(|d| d.to_string())
                    .collect::<Vec<_>>(),
                attempted_filters
                    .difficulty
                    .iter()
                    .map(|d| d.to_string())
                    .collect::<Vec<_>>()
            );
            if !attempted_filters.relax_filters {
                info!("Try fewer filters or pass --relax to loosen them automatically.");
            }
        }
        Err(e) if e.is_auth_failure() => {
            error!("Not logged in. Please run tunetrivia auth\n Error: {}", e)
        }
        Err(e) => error!("Track lookup failed. Err: {}", e),
    }
}
