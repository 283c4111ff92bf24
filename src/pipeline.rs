use std::{sync::Arc, time::Duration};

use futures::{StreamExt, stream};
use tracing::{debug, warn};

use crate::{
    config::Config,
    entities::movie,
    error::IngestResult,
    models::{MovieBundle, VideoLinks, clean_date},
    store::CatalogStore,
    tmdb::{CastFragment, Credits, CrewFragment, TmdbSource},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    Ingested,
    /// The primary detail fetch failed; nothing was persisted for this id.
    Skipped,
}

/// Fetches one movie's detail, credits and keywords, merges them, persists
/// the movie row, then fans out into the sub-entity upserts. Sub-entity
/// failures are logged and skipped; only a failed movie upsert surfaces to
/// the caller.
pub struct MovieIngestor<S> {
    source: Arc<S>,
    store: CatalogStore,
    person_batch_size: usize,
    person_batch_delay: Duration,
}

impl<S: TmdbSource> MovieIngestor<S> {
    pub fn new(source: Arc<S>, store: CatalogStore, config: &Config) -> Self {
        Self {
            source,
            store,
            person_batch_size: config.person_batch_size.max(1),
            person_batch_delay: config.person_batch_delay,
        }
    }

    pub async fn ingest_movie(&self, movie_id: i32) -> IngestResult<Outcome> {
        // Detail and credits fetch in parallel; the rest depends on the
        // detail payload.
        let (details, credits) = tokio::join!(
            self.source.movie_details(movie_id),
            self.source.movie_credits(movie_id),
        );

        let details = match details {
            Ok(details) => details,
            Err(err) => {
                warn!(movie_id = movie_id, error = %err, "skipping movie, detail fetch failed");
                return Ok(Outcome::Skipped);
            },
        };

        let credits = match credits {
            Ok(credits) => credits,
            Err(err) => {
                warn!(movie_id = movie_id, error = %err, "credits fetch failed, continuing without cast and crew");
                Credits::default()
            },
        };

        // Keywords usually arrive appended to the detail payload; fall back
        // to the dedicated endpoint when the block is missing.
        let keywords = match &details.keywords {
            Some(block) => block.keywords.clone(),
            None => match self.source.movie_keywords(movie_id).await {
                Ok(keywords) => keywords,
                Err(err) => {
                    warn!(movie_id = movie_id, error = %err, "keywords fetch failed, continuing without keywords");
                    Vec::new()
                },
            },
        };

        let links = VideoLinks::from_videos(
            details.videos.as_ref().map(|v| v.results.as_slice()).unwrap_or_default(),
        );

        let bundle =
            MovieBundle { details, cast: credits.cast, crew: credits.crew, keywords, links };

        // The movie row must exist before any child row can attach to it.
        let movie = self.store.upsert_movie(&bundle.details, &bundle.links).await?;
        debug!(movie_id = movie_id, title = %movie.title, "movie persisted, fanning out");

        tokio::join!(
            self.persist_genres(&movie, &bundle),
            self.persist_keywords(&movie, &bundle),
            self.persist_companies(&movie, &bundle),
            self.persist_release_dates(&movie, &bundle),
            self.persist_cast(&movie, &bundle.cast),
            self.persist_crew(&movie, &bundle.crew),
        );

        Ok(Outcome::Ingested)
    }

    async fn persist_genres(&self, movie: &movie::Model, bundle: &MovieBundle) {
        for fragment in &bundle.details.genres {
            let result = async {
                let genre = self.store.upsert_genre(fragment).await?;
                self.store.link_genre(movie, &genre).await
            }
            .await;
            if let Err(err) = result {
                warn!(movie_id = movie.tmdb_id, genre = %fragment.name, error = %err, "failed to save genre");
            }
        }
    }

    async fn persist_keywords(&self, movie: &movie::Model, bundle: &MovieBundle) {
        for fragment in &bundle.keywords {
            let result = async {
                let keyword = self.store.upsert_keyword(fragment).await?;
                self.store.link_keyword(movie, &keyword).await
            }
            .await;
            if let Err(err) = result {
                warn!(movie_id = movie.tmdb_id, keyword = %fragment.name, error = %err, "failed to save keyword");
            }
        }
    }

    async fn persist_companies(&self, movie: &movie::Model, bundle: &MovieBundle) {
        for fragment in &bundle.details.production_companies {
            let result = async {
                let company = self.store.upsert_company(fragment).await?;
                self.store.link_company(movie, &company).await
            }
            .await;
            if let Err(err) = result {
                warn!(movie_id = movie.tmdb_id, company = %fragment.name, error = %err, "failed to save production company");
            }
        }
    }

    async fn persist_release_dates(&self, movie: &movie::Model, bundle: &MovieBundle) {
        let Some(block) = &bundle.details.release_dates else {
            return;
        };
        for country in &block.results {
            for entry in &country.release_dates {
                // Unparseable dates are dropped, not saved.
                let Some(date) = entry.release_date.as_deref().and_then(clean_date) else {
                    continue;
                };
                if let Err(err) =
                    self.store.upsert_release_date(movie, &country.iso_3166_1, date).await
                {
                    warn!(movie_id = movie.tmdb_id, country = %country.iso_3166_1, error = %err, "failed to save release date");
                }
            }
        }
    }

    /// Cast members are processed in fixed-size batches with a pacing pause
    /// between batches; each member needs its own person detail fetch before
    /// the credit row can be written.
    async fn persist_cast(&self, movie: &movie::Model, cast: &[CastFragment]) {
        for (batch_idx, batch) in cast.chunks(self.person_batch_size).enumerate() {
            let base = batch_idx * self.person_batch_size;
            stream::iter(batch.iter().enumerate())
                .for_each_concurrent(None, |(offset, fragment)| async move {
                    self.ingest_cast_member(movie, fragment, (base + offset) as i32).await;
                })
                .await;
            tokio::time::sleep(self.person_batch_delay).await;
        }
    }

    async fn persist_crew(&self, movie: &movie::Model, crew: &[CrewFragment]) {
        for batch in crew.chunks(self.person_batch_size) {
            stream::iter(batch.iter())
                .for_each_concurrent(None, |fragment| async move {
                    self.ingest_crew_member(movie, fragment).await;
                })
                .await;
            tokio::time::sleep(self.person_batch_delay).await;
        }
    }

    async fn ingest_cast_member(
        &self,
        movie: &movie::Model,
        fragment: &CastFragment,
        fallback_order: i32,
    ) {
        let details = match self.source.person_details(fragment.id).await {
            Ok(details) => details,
            Err(err) => {
                warn!(movie_id = movie.tmdb_id, person_id = fragment.id, error = %err, "skipping cast member, person fetch failed");
                return;
            },
        };

        let person = match self.store.upsert_person(&details).await {
            Ok(person) => person,
            Err(err) => {
                warn!(movie_id = movie.tmdb_id, person_id = fragment.id, error = %err, "failed to save person");
                return;
            },
        };

        // Upstream order wins; otherwise the position across batches keeps
        // the sequence deterministic.
        let order = fragment.order.unwrap_or(fallback_order);
        let credit_id =
            fragment.credit_id.clone().unwrap_or_else(|| format!("cast-{}", fragment.id));
        let character = fragment.character.as_deref().unwrap_or("");

        if let Err(err) =
            self.store.upsert_cast_credit(&person, movie, character, order, &credit_id).await
        {
            warn!(movie_id = movie.tmdb_id, person = %person.name, error = %err, "failed to save cast credit");
        }
    }

    async fn ingest_crew_member(&self, movie: &movie::Model, fragment: &CrewFragment) {
        let details = match self.source.person_details(fragment.id).await {
            Ok(details) => details,
            Err(err) => {
                warn!(movie_id = movie.tmdb_id, person_id = fragment.id, error = %err, "skipping crew member, person fetch failed");
                return;
            },
        };

        let person = match self.store.upsert_person(&details).await {
            Ok(person) => person,
            Err(err) => {
                warn!(movie_id = movie.tmdb_id, person_id = fragment.id, error = %err, "failed to save person");
                return;
            },
        };

        let department = fragment.department.as_deref().unwrap_or("");
        let job = fragment.job.as_deref().unwrap_or("");
        let credit_id =
            fragment.credit_id.clone().unwrap_or_else(|| format!("crew-{}", fragment.id));

        if let Err(err) = self
            .store
            .upsert_crew_credit(&person, movie, department, job, Some(&credit_id))
            .await
        {
            warn!(movie_id = movie.tmdb_id, person = %person.name, error = %err, "failed to save crew credit");
        }
    }
}
