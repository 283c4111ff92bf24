use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub database_url: String,
    /// Ceiling on in-flight TMDB requests across the whole process.
    pub max_concurrent_requests: usize,
    pub tmdb_rps: u32,
    pub fetch_retries: u32,
    pub retry_base_delay: Duration,
    pub request_timeout: Duration,
    /// Stop discovery once this many movie ids have been submitted.
    pub max_movies: u64,
    pub year_floor: i16,
    pub page_delay: Duration,
    pub person_batch_size: usize,
    pub person_batch_delay: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let tmdb_api_key = std::env::var("TMDB_API_KEY").unwrap_or_else(|_| "".to_string());
        let tmdb_base_url = std::env::var("TMDB_BASE_URL")
            .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string());

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://cinedex.db?mode=rwc".to_string());

        let max_concurrent_requests: usize = std::env::var("MAX_CONCURRENT_REQUESTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(20);

        let tmdb_rps: u32 =
            std::env::var("TMDB_RPS").ok().and_then(|s| s.parse().ok()).unwrap_or(40);

        let fetch_retries: u32 =
            std::env::var("FETCH_RETRIES").ok().and_then(|s| s.parse().ok()).unwrap_or(3);

        let retry_base_delay_ms: u64 =
            std::env::var("RETRY_BASE_DELAY_MS").ok().and_then(|s| s.parse().ok()).unwrap_or(5_000);

        let request_timeout_secs: u64 =
            std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok()).unwrap_or(180);

        let max_movies: u64 =
            std::env::var("MAX_MOVIES").ok().and_then(|s| s.parse().ok()).unwrap_or(100_000);

        let year_floor: i16 =
            std::env::var("YEAR_FLOOR").ok().and_then(|s| s.parse().ok()).unwrap_or(1900);

        let page_delay_ms: u64 =
            std::env::var("PAGE_DELAY_MS").ok().and_then(|s| s.parse().ok()).unwrap_or(250);

        let person_batch_size: usize =
            std::env::var("PERSON_BATCH_SIZE").ok().and_then(|s| s.parse().ok()).unwrap_or(50);

        let person_batch_delay_ms: u64 =
            std::env::var("PERSON_BATCH_DELAY_MS").ok().and_then(|s| s.parse().ok()).unwrap_or(100);

        Ok(Self {
            tmdb_api_key,
            tmdb_base_url,
            database_url,
            max_concurrent_requests,
            tmdb_rps,
            fetch_retries,
            retry_base_delay: Duration::from_millis(retry_base_delay_ms),
            request_timeout: Duration::from_secs(request_timeout_secs),
            max_movies,
            year_floor,
            page_delay: Duration::from_millis(page_delay_ms),
            person_batch_size,
            person_batch_delay: Duration::from_millis(person_batch_delay_ms),
        })
    }
}
