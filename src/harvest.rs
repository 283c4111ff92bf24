use std::{sync::Arc, time::Duration};

use futures::{StreamExt, stream};
use tracing::{info, warn};

use crate::{
    config::Config,
    error::IngestResult,
    pipeline::MovieIngestor,
    store::CatalogStore,
    tmdb::{DISCOVER_PAGE_SIZE, TmdbSource},
};

/// Walks the discovery space year by year (newest first), page by page,
/// feeding every discovered movie id through the ingestion pipeline until
/// the year floor or the target movie count is reached.
pub struct Harvester<S> {
    source: Arc<S>,
    ingestor: MovieIngestor<S>,
    max_concurrent: usize,
    max_movies: u64,
    year_floor: i16,
    page_delay: Duration,
}

impl<S: TmdbSource> Harvester<S> {
    pub fn new(source: Arc<S>, store: CatalogStore, config: &Config) -> Self {
        Self {
            ingestor: MovieIngestor::new(source.clone(), store, config),
            source,
            max_concurrent: config.max_concurrent_requests.max(1),
            max_movies: config.max_movies,
            year_floor: config.year_floor,
            page_delay: config.page_delay,
        }
    }

    /// Runs a full harvest starting two years into the future, to pick up
    /// announced releases.
    pub async fn run(&self) -> IngestResult<u64> {
        let start_year = jiff::Zoned::now().date().year() + 2;
        self.run_from_year(start_year).await
    }

    pub async fn run_from_year(&self, start_year: i16) -> IngestResult<u64> {
        let mut total: u64 = 0;

        for year in (self.year_floor..=start_year).rev() {
            if total >= self.max_movies {
                break;
            }

            let mut page: u32 = 1;
            while total < self.max_movies {
                let discovered = match self.source.discover_page(year, page).await {
                    Ok(discovered) => discovered,
                    Err(err) => {
                        warn!(year = year, page = page, error = %err, "discovery fetch failed, moving to next year");
                        break;
                    },
                };

                if discovered.results.is_empty() {
                    info!(year = year, "no more results for year");
                    break;
                }

                let remaining = (self.max_movies - total) as usize;
                let ids: Vec<i32> =
                    discovered.results.iter().map(|m| m.id).take(remaining).collect();
                let submitted = ids.len() as u64;

                // The whole page is awaited before the next one is requested;
                // that bound plus the fetch client's ceiling is the only
                // backpressure this loop needs.
                stream::iter(ids)
                    .map(|movie_id| async move {
                        if let Err(err) = self.ingestor.ingest_movie(movie_id).await {
                            warn!(movie_id = movie_id, error = %err, "failed to ingest movie");
                        }
                    })
                    .buffer_unordered(self.max_concurrent)
                    .collect::<Vec<_>>()
                    .await;

                total += submitted;
                info!(year = year, page = page, total = total, "page processed");

                // A short page means the year is exhausted.
                if discovered.results.len() < DISCOVER_PAGE_SIZE {
                    break;
                }

                page += 1;
                tokio::time::sleep(self.page_delay).await;
            }

            info!(year = year, total = total, "finished year");
        }

        info!(total = total, "harvest complete");
        Ok(total)
    }
}
