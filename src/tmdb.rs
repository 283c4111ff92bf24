use std::{num::NonZeroU32, sync::Arc, time::Duration};

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde::{Deserialize, de::DeserializeOwned};
use tokio::sync::Semaphore;
use tracing::warn;

use crate::{config::Config, error::FetchError};

/// Result count of a full discovery page; a shorter page means the year is
/// exhausted.
pub const DISCOVER_PAGE_SIZE: usize = 20;

/// The slice of the TMDB API the ingestion core consumes. The pipeline and
/// the discovery driver are generic over this trait so tests can run against
/// in-memory fakes.
#[async_trait]
pub trait TmdbSource: Send + Sync {
    async fn discover_page(&self, year: i16, page: u32) -> Result<DiscoverPage, FetchError>;
    async fn movie_details(&self, movie_id: i32) -> Result<MovieDetails, FetchError>;
    async fn movie_credits(&self, movie_id: i32) -> Result<Credits, FetchError>;
    async fn movie_keywords(&self, movie_id: i32) -> Result<Vec<KeywordFragment>, FetchError>;
    async fn person_details(&self, person_id: i32) -> Result<PersonDetails, FetchError>;
}

pub struct TmdbClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    in_flight: Arc<Semaphore>,
    retries: u32,
    retry_base_delay: Duration,
    request_timeout: Duration,
}

impl TmdbClient {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        if config.tmdb_api_key.trim().is_empty() {
            warn!("no TMDB_API_KEY provided, requests will be rejected upstream");
        }

        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(
            NonZeroU32::new(config.tmdb_rps.max(1)).unwrap(),
        )));

        Self {
            client,
            api_key: config.tmdb_api_key.clone(),
            base_url: config.tmdb_base_url.clone(),
            limiter,
            in_flight: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
            retries: config.fetch_retries.max(1),
            retry_base_delay: config.retry_base_delay,
            request_timeout: config.request_timeout,
        }
    }

    /// One governed attempt: waits for an in-flight permit and the rate
    /// limiter, then issues the request with the per-attempt timeout.
    async fn attempt<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let _permit = self.in_flight.acquire().await.expect("semaphore never closed");
        self.limiter.until_ready().await;

        let resp = self
            .client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), url: url.to_string() });
        }

        resp.json::<T>()
            .await
            .map_err(|source| FetchError::Decode { url: url.to_string(), source })
    }

    /// Fetches and decodes one endpoint, retrying transient failures with
    /// exponential backoff (base delay doubling per attempt).
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let mut attempt: u32 = 0;
        loop {
            match self.attempt(url, query).await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.retries {
                        warn!(url = %url, attempts = attempt, error = %err, "fetch failed, retries exhausted");
                        return Err(FetchError::RetriesExhausted {
                            url: url.to_string(),
                            attempts: attempt,
                        });
                    }
                    let backoff = self.retry_base_delay * 2u32.pow(attempt - 1);
                    warn!(url = %url, attempt = attempt, backoff_ms = backoff.as_millis() as u64, error = %err, "transient fetch failure, backing off");
                    tokio::time::sleep(backoff).await;
                },
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl TmdbSource for TmdbClient {
    async fn discover_page(&self, year: i16, page: u32) -> Result<DiscoverPage, FetchError> {
        let url = self.url("/discover/movie");
        let query = [
            ("primary_release_year", year.to_string()),
            ("sort_by", "popularity.desc".to_string()),
            ("page", page.to_string()),
            ("include_adult", "false".to_string()),
            ("include_video", "false".to_string()),
            ("vote_count.gte", "1".to_string()),
        ];
        self.get_json(&url, &query).await
    }

    async fn movie_details(&self, movie_id: i32) -> Result<MovieDetails, FetchError> {
        let url = self.url(&format!("/movie/{movie_id}"));
        let query = [(
            "append_to_response",
            "keywords,release_dates,production_companies,videos".to_string(),
        )];
        self.get_json(&url, &query).await
    }

    async fn movie_credits(&self, movie_id: i32) -> Result<Credits, FetchError> {
        let url = self.url(&format!("/movie/{movie_id}/credits"));
        self.get_json(&url, &[]).await
    }

    async fn movie_keywords(&self, movie_id: i32) -> Result<Vec<KeywordFragment>, FetchError> {
        let url = self.url(&format!("/movie/{movie_id}/keywords"));
        let resp: KeywordsBlock = self.get_json(&url, &[]).await?;
        Ok(resp.keywords)
    }

    async fn person_details(&self, person_id: i32) -> Result<PersonDetails, FetchError> {
        let url = self.url(&format!("/person/{person_id}"));
        self.get_json(&url, &[]).await
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DiscoverPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<DiscoverMovie>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct DiscoverMovie {
    pub id: i32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MovieDetails {
    pub id: i32,
    pub title: String,
    pub original_title: Option<String>,
    pub tagline: Option<String>,
    pub overview: Option<String>,
    pub runtime: Option<i32>,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    pub release_date: Option<String>,
    pub status: Option<String>,
    pub popularity: Option<f64>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i32>,
    pub original_language: Option<String>,
    pub imdb_id: Option<String>,
    pub homepage: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genres: Vec<GenreFragment>,
    #[serde(default)]
    pub production_companies: Vec<CompanyFragment>,
    pub keywords: Option<KeywordsBlock>,
    pub release_dates: Option<ReleaseDatesBlock>,
    pub videos: Option<VideosBlock>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GenreFragment {
    pub id: i32,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct KeywordFragment {
    pub id: i32,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CompanyFragment {
    pub id: i32,
    pub name: String,
    pub logo_path: Option<String>,
    pub origin_country: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct KeywordsBlock {
    #[serde(default)]
    pub keywords: Vec<KeywordFragment>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReleaseDatesBlock {
    #[serde(default)]
    pub results: Vec<CountryReleases>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CountryReleases {
    pub iso_3166_1: String,
    #[serde(default)]
    pub release_dates: Vec<ReleaseEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReleaseEntry {
    pub release_date: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct VideosBlock {
    #[serde(default)]
    pub results: Vec<Video>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Video {
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub key: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastFragment>,
    #[serde(default)]
    pub crew: Vec<CrewFragment>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CastFragment {
    pub id: i32,
    pub character: Option<String>,
    pub order: Option<i32>,
    pub credit_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CrewFragment {
    pub id: i32,
    pub department: Option<String>,
    pub job: Option<String>,
    pub credit_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PersonDetails {
    pub id: i32,
    pub name: String,
    pub gender: Option<i32>,
    pub popularity: Option<f64>,
    pub profile_path: Option<String>,
    pub known_for_department: Option<String>,
    #[serde(default)]
    pub also_known_as: Vec<String>,
    pub biography: Option<String>,
    pub birthday: Option<String>,
    pub deathday: Option<String>,
    pub place_of_birth: Option<String>,
    pub imdb_id: Option<String>,
    pub homepage: Option<String>,
}
