use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use cinedex::{
    config::Config,
    db,
    entities::{
        cast_credit, crew_credit, genre, keyword, movie, movie_genre, person, release_date,
    },
    error::FetchError,
    harvest::Harvester,
    pipeline::{MovieIngestor, Outcome},
    store::CatalogStore,
    tmdb::{
        CastFragment, CompanyFragment, CountryReleases, Credits, CrewFragment, DiscoverMovie,
        DiscoverPage, GenreFragment, KeywordFragment, KeywordsBlock, MovieDetails, PersonDetails,
        ReleaseDatesBlock, ReleaseEntry, TmdbSource, Video, VideosBlock,
    },
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

fn test_config() -> Config {
    Config {
        tmdb_api_key: "test-key".to_string(),
        tmdb_base_url: "http://localhost".to_string(),
        database_url: "sqlite::memory:".to_string(),
        max_concurrent_requests: 4,
        tmdb_rps: 10_000,
        fetch_retries: 3,
        retry_base_delay: Duration::from_millis(1),
        request_timeout: Duration::from_secs(5),
        max_movies: 1_000,
        year_floor: 1900,
        page_delay: Duration::ZERO,
        person_batch_size: 50,
        person_batch_delay: Duration::ZERO,
    }
}

fn details(id: i32, title: &str) -> MovieDetails {
    MovieDetails {
        id,
        title: title.to_string(),
        original_title: None,
        tagline: None,
        overview: Some("overview".to_string()),
        runtime: Some(120),
        budget: None,
        revenue: None,
        release_date: Some("2024-05-01".to_string()),
        status: Some("Released".to_string()),
        popularity: Some(42.0),
        vote_average: Some(7.5),
        vote_count: Some(100),
        original_language: Some("en".to_string()),
        imdb_id: None,
        homepage: None,
        poster_path: Some("/poster.jpg".to_string()),
        backdrop_path: None,
        genres: Vec::new(),
        production_companies: Vec::new(),
        keywords: Some(KeywordsBlock::default()),
        release_dates: None,
        videos: None,
    }
}

fn person(id: i32, name: &str) -> PersonDetails {
    PersonDetails {
        id,
        name: name.to_string(),
        gender: Some(2),
        popularity: Some(3.5),
        profile_path: None,
        known_for_department: Some("Acting".to_string()),
        also_known_as: Vec::new(),
        biography: None,
        birthday: None,
        deathday: None,
        place_of_birth: None,
        imdb_id: None,
        homepage: None,
    }
}

fn not_found(what: &str) -> FetchError {
    FetchError::Status { status: 404, url: what.to_string() }
}

/// In-memory TMDB double with per-endpoint call counters and an in-flight
/// gauge on the person endpoint.
#[derive(Default)]
struct FakeTmdb {
    pages: HashMap<(i16, u32), DiscoverPage>,
    movies: HashMap<i32, MovieDetails>,
    credits: HashMap<i32, Credits>,
    people: HashMap<i32, PersonDetails>,
    // When set, person fetches check that the movie row already exists.
    db: Option<DatabaseConnection>,
    discover_calls: Mutex<Vec<(i16, u32)>>,
    keyword_calls: AtomicUsize,
    person_calls: AtomicUsize,
    person_in_flight: AtomicUsize,
    person_max_in_flight: AtomicUsize,
    movie_missing_during_person_fetch: AtomicBool,
}

#[async_trait]
impl TmdbSource for FakeTmdb {
    async fn discover_page(&self, year: i16, page: u32) -> Result<DiscoverPage, FetchError> {
        self.discover_calls.lock().unwrap().push((year, page));
        Ok(self.pages.get(&(year, page)).cloned().unwrap_or_default())
    }

    async fn movie_details(&self, movie_id: i32) -> Result<MovieDetails, FetchError> {
        self.movies.get(&movie_id).cloned().ok_or_else(|| not_found("movie details"))
    }

    async fn movie_credits(&self, movie_id: i32) -> Result<Credits, FetchError> {
        Ok(self.credits.get(&movie_id).cloned().unwrap_or_default())
    }

    async fn movie_keywords(&self, _movie_id: i32) -> Result<Vec<KeywordFragment>, FetchError> {
        self.keyword_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn person_details(&self, person_id: i32) -> Result<PersonDetails, FetchError> {
        self.person_calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.person_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.person_max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        if let Some(db) = &self.db {
            let movies = movie::Entity::find().count(db).await.unwrap_or(0);
            if movies == 0 {
                self.movie_missing_during_person_fetch.store(true, Ordering::SeqCst);
            }
        }

        // Let batch siblings overlap so the gauge is meaningful.
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.person_in_flight.fetch_sub(1, Ordering::SeqCst);

        self.people.get(&person_id).cloned().ok_or_else(|| not_found("person details"))
    }
}

fn sample_movie() -> MovieDetails {
    let mut d = details(101, "The Big Test");
    d.genres = vec![
        GenreFragment { id: 18, name: "Drama".to_string() },
        GenreFragment { id: 53, name: "Thriller".to_string() },
    ];
    d.production_companies = vec![CompanyFragment {
        id: 7,
        name: "Big Pictures".to_string(),
        logo_path: None,
        origin_country: Some("US".to_string()),
    }];
    d.keywords = Some(KeywordsBlock {
        keywords: vec![
            KeywordFragment { id: 1, name: "heist".to_string() },
            KeywordFragment { id: 2, name: "betrayal".to_string() },
        ],
    });
    d.release_dates = Some(ReleaseDatesBlock {
        results: vec![
            CountryReleases {
                iso_3166_1: "US".to_string(),
                release_dates: vec![ReleaseEntry {
                    release_date: Some("2025-01-23T00:00:00.000Z".to_string()),
                }],
            },
            CountryReleases {
                iso_3166_1: "FR".to_string(),
                release_dates: vec![ReleaseEntry { release_date: Some("not-a-date".to_string()) }],
            },
        ],
    });
    d.videos = Some(VideosBlock {
        results: vec![
            Video { site: "Vimeo".to_string(), kind: "Trailer".to_string(), key: "v".to_string() },
            Video {
                site: "YouTube".to_string(),
                kind: "Trailer".to_string(),
                key: "tr1".to_string(),
            },
            Video {
                site: "YouTube".to_string(),
                kind: "Teaser".to_string(),
                key: "te1".to_string(),
            },
        ],
    });
    d
}

fn sample_credits() -> Credits {
    Credits {
        cast: vec![
            CastFragment {
                id: 201,
                character: Some("Lead".to_string()),
                order: Some(0),
                credit_id: Some("c-201".to_string()),
            },
            CastFragment {
                id: 202,
                character: Some("Friend".to_string()),
                order: Some(1),
                credit_id: Some("c-202".to_string()),
            },
            // No upstream order or credit id: falls back to position and a
            // synthetic credit id.
            CastFragment { id: 203, character: None, order: None, credit_id: None },
        ],
        crew: vec![
            CrewFragment {
                id: 301,
                department: Some("Directing".to_string()),
                job: Some("Director".to_string()),
                credit_id: Some("c-301".to_string()),
            },
            CrewFragment {
                id: 301,
                department: Some("Writing".to_string()),
                job: Some("Writer".to_string()),
                credit_id: Some("c-302".to_string()),
            },
            // No upstream credit id: gets a synthetic one.
            CrewFragment {
                id: 302,
                department: Some("Editing".to_string()),
                job: Some("Editor".to_string()),
                credit_id: None,
            },
        ],
    }
}

fn sample_people() -> HashMap<i32, PersonDetails> {
    let mut alice = person(201, "Alice Actor");
    alice.also_known_as = vec!["A. Actor".to_string()];
    [
        (201, alice),
        (202, person(202, "Bob Actor")),
        (203, person(203, "Carol Actor")),
        (301, person(301, "Dana Director")),
        (302, person(302, "Evan Editor")),
    ]
    .into_iter()
    .collect()
}

async fn counts(db: &DatabaseConnection) -> (u64, u64, u64, u64, u64, u64, u64) {
    (
        movie::Entity::find().count(db).await.unwrap(),
        person::Entity::find().count(db).await.unwrap(),
        cast_credit::Entity::find().count(db).await.unwrap(),
        crew_credit::Entity::find().count(db).await.unwrap(),
        genre::Entity::find().count(db).await.unwrap(),
        keyword::Entity::find().count(db).await.unwrap(),
        release_date::Entity::find().count(db).await.unwrap(),
    )
}

#[tokio::test]
async fn ingest_persists_full_bundle_and_is_idempotent() {
    let db = db::connect_and_migrate("sqlite::memory:").await.unwrap();

    let fake = Arc::new(FakeTmdb {
        movies: [(101, sample_movie())].into_iter().collect(),
        credits: [(101, sample_credits())].into_iter().collect(),
        people: sample_people(),
        ..FakeTmdb::default()
    });

    let ingestor = MovieIngestor::new(fake.clone(), CatalogStore::new(db.clone()), &test_config());

    let outcome = ingestor.ingest_movie(101).await.unwrap();
    assert_eq!(outcome, Outcome::Ingested);

    let first = counts(&db).await;
    assert_eq!(first, (1, 5, 3, 3, 2, 2, 1));

    let saved = movie::Entity::find()
        .filter(movie::Column::TmdbId.eq(101))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.title, "The Big Test");
    assert!(saved.is_active);
    assert_eq!(saved.trailer_link.as_deref(), Some("https://www.youtube.com/watch?v=tr1"));
    assert_eq!(saved.teaser_link.as_deref(), Some("https://www.youtube.com/watch?v=te1"));
    assert_eq!(saved.release_date.as_deref(), Some("2024-05-01"));

    // Only the parseable US date makes it into the store.
    let releases = release_date::Entity::find().all(&db).await.unwrap();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].country, "US");
    assert_eq!(releases[0].release_date, "2025-01-23");

    // Cast member without an upstream order gets its batch position, and a
    // synthetic credit id.
    let carol = person::Entity::find()
        .filter(person::Column::TmdbId.eq(203))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let credit = cast_credit::Entity::find()
        .filter(cast_credit::Column::PersonId.eq(carol.id))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(credit.cast_order, 2);
    assert_eq!(credit.credit_id, "cast-203");

    // Same fallback on the crew side.
    let evan = person::Entity::find()
        .filter(person::Column::TmdbId.eq(302))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let crew = crew_credit::Entity::find()
        .filter(crew_credit::Column::PersonId.eq(evan.id))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(crew.credit_id.as_deref(), Some("crew-302"));

    // Alternate names round-trip as a JSON list.
    let alice = person::Entity::find()
        .filter(person::Column::TmdbId.eq(201))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(alice.also_known_as.as_deref(), Some(r#"["A. Actor"]"#));

    // Keywords came appended to the detail payload, so the dedicated
    // endpoint was never hit.
    assert_eq!(fake.keyword_calls.load(Ordering::SeqCst), 0);

    // Re-ingesting the same payloads must not create any new rows.
    let outcome = ingestor.ingest_movie(101).await.unwrap();
    assert_eq!(outcome, Outcome::Ingested);
    assert_eq!(counts(&db).await, first);

    let genres = movie_genre::Entity::find().count(&db).await.unwrap();
    assert_eq!(genres, 2);
}

#[tokio::test]
async fn primary_detail_failure_skips_movie_entirely() {
    let db = db::connect_and_migrate("sqlite::memory:").await.unwrap();

    // No movie details registered: the primary fetch fails.
    let fake = Arc::new(FakeTmdb {
        credits: [(101, sample_credits())].into_iter().collect(),
        people: sample_people(),
        ..FakeTmdb::default()
    });

    let ingestor = MovieIngestor::new(fake.clone(), CatalogStore::new(db.clone()), &test_config());

    let outcome = ingestor.ingest_movie(101).await.unwrap();
    assert_eq!(outcome, Outcome::Skipped);

    assert_eq!(movie::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(fake.person_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fake.keyword_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn movie_row_exists_before_any_person_is_processed() {
    let db = db::connect_and_migrate("sqlite::memory:").await.unwrap();

    let fake = Arc::new(FakeTmdb {
        movies: [(101, sample_movie())].into_iter().collect(),
        credits: [(101, sample_credits())].into_iter().collect(),
        people: sample_people(),
        db: Some(db.clone()),
        ..FakeTmdb::default()
    });

    let ingestor = MovieIngestor::new(fake.clone(), CatalogStore::new(db.clone()), &test_config());
    ingestor.ingest_movie(101).await.unwrap();

    assert!(fake.person_calls.load(Ordering::SeqCst) > 0);
    assert!(!fake.movie_missing_during_person_fetch.load(Ordering::SeqCst));
}

#[tokio::test]
async fn cast_fan_out_respects_batch_size() {
    let db = db::connect_and_migrate("sqlite::memory:").await.unwrap();

    let cast: Vec<CastFragment> = (0..5)
        .map(|i| CastFragment {
            id: 200 + i,
            character: Some(format!("Role {i}")),
            order: Some(i),
            credit_id: Some(format!("c-{i}")),
        })
        .collect();
    let people: HashMap<i32, PersonDetails> =
        (0..5).map(|i| (200 + i, person(200 + i, &format!("Person {i}")))).collect();

    let fake = Arc::new(FakeTmdb {
        movies: [(101, details(101, "Crowded"))].into_iter().collect(),
        credits: [(101, Credits { cast, crew: Vec::new() })].into_iter().collect(),
        people,
        ..FakeTmdb::default()
    });

    let mut config = test_config();
    config.person_batch_size = 2;

    let ingestor = MovieIngestor::new(fake.clone(), CatalogStore::new(db.clone()), &config);
    ingestor.ingest_movie(101).await.unwrap();

    assert_eq!(fake.person_calls.load(Ordering::SeqCst), 5);
    assert!(fake.person_max_in_flight.load(Ordering::SeqCst) <= 2);
    assert_eq!(cast_credit::Entity::find().count(&db).await.unwrap(), 5);
}

#[tokio::test]
async fn short_discovery_page_advances_to_next_year() {
    let db = db::connect_and_migrate("sqlite::memory:").await.unwrap();

    let full_page = DiscoverPage {
        page: 1,
        results: (1..=20).map(|id| DiscoverMovie { id }).collect(),
        total_pages: 2,
        total_results: 25,
    };
    let short_page = DiscoverPage {
        page: 2,
        results: (21..=25).map(|id| DiscoverMovie { id }).collect(),
        total_pages: 2,
        total_results: 25,
    };

    let fake = Arc::new(FakeTmdb {
        pages: [((2001, 1), full_page), ((2001, 2), short_page)].into_iter().collect(),
        ..FakeTmdb::default()
    });

    let mut config = test_config();
    config.year_floor = 2000;

    let harvester = Harvester::new(fake.clone(), CatalogStore::new(db.clone()), &config);
    let total = harvester.run_from_year(2001).await.unwrap();

    // 25 ids submitted; all skipped (no detail payloads), but they count.
    assert_eq!(total, 25);

    // Page 2 was short, so the driver moved on to 2000 instead of page 3;
    // 2000's empty page ended the run.
    let calls = fake.discover_calls.lock().unwrap().clone();
    assert_eq!(calls, vec![(2001, 1), (2001, 2), (2000, 1)]);
}

#[tokio::test]
async fn harvest_stops_at_max_movies() {
    let db = db::connect_and_migrate("sqlite::memory:").await.unwrap();

    let full_page = DiscoverPage {
        page: 1,
        results: (1..=20).map(|id| DiscoverMovie { id }).collect(),
        total_pages: 10,
        total_results: 200,
    };

    let fake = Arc::new(FakeTmdb {
        pages: [((2001, 1), full_page)].into_iter().collect(),
        ..FakeTmdb::default()
    });

    let mut config = test_config();
    config.year_floor = 1999;
    config.max_movies = 7;

    let harvester = Harvester::new(fake.clone(), CatalogStore::new(db.clone()), &config);
    let total = harvester.run_from_year(2001).await.unwrap();

    assert_eq!(total, 7);
    let calls = fake.discover_calls.lock().unwrap().clone();
    assert_eq!(calls, vec![(2001, 1)]);
}

#[tokio::test]
async fn upserts_refresh_fields_without_duplicating_rows() {
    let db = db::connect_and_migrate("sqlite::memory:").await.unwrap();
    let store = CatalogStore::new(db.clone());

    let links = Default::default();
    let first = store.upsert_movie(&details(55, "Working Title"), &links).await.unwrap();

    let updated = store.upsert_movie(&details(55, "Final Title"), &links).await.unwrap();
    assert_eq!(first.id, updated.id);
    assert_eq!(updated.title, "Final Title");
    assert_eq!(movie::Entity::find().count(&db).await.unwrap(), 1);

    let actor = store.upsert_person(&person(9, "Same Person")).await.unwrap();
    store.upsert_cast_credit(&actor, &updated, "Ghost", 0, "credit-1").await.unwrap();
    store.upsert_cast_credit(&actor, &updated, "Ghost (voice)", 0, "credit-1").await.unwrap();

    let credits = cast_credit::Entity::find().all(&db).await.unwrap();
    assert_eq!(credits.len(), 1);
    assert_eq!(credits[0].character, "Ghost (voice)");
}
