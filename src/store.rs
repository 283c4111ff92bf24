use jiff::civil::Date;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set, sea_query::OnConflict,
};

use crate::{
    entities::{
        cast_credit, crew_credit, genre, keyword, movie, movie_company, movie_genre, movie_keyword,
        person, production_company, release_date,
    },
    error::IngestResult,
    models::{VideoLinks, clean_date},
    tmdb::{CompanyFragment, GenreFragment, KeywordFragment, MovieDetails, PersonDetails},
};

/// All catalog writes go through here. Every upsert is an atomic
/// `INSERT ... ON CONFLICT` keyed on the entity's external id (or link-table
/// natural key), so re-ingesting a payload refreshes fields without ever
/// duplicating rows, even from concurrent tasks.
#[derive(Clone)]
pub struct CatalogStore {
    db: DatabaseConnection,
}

impl CatalogStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn upsert_movie(
        &self,
        details: &MovieDetails,
        links: &VideoLinks,
    ) -> IngestResult<movie::Model> {
        let release_date =
            details.release_date.as_deref().and_then(clean_date).map(|d| d.to_string());

        let model = movie::ActiveModel {
            id: Default::default(),
            tmdb_id: Set(details.id),
            title: Set(details.title.clone()),
            original_title: Set(details.original_title.clone()),
            tagline: Set(details.tagline.clone()),
            overview: Set(details.overview.clone()),
            runtime: Set(details.runtime),
            budget: Set(details.budget),
            revenue: Set(details.revenue),
            release_date: Set(release_date),
            status: Set(details.status.clone()),
            popularity: Set(details.popularity),
            vote_average: Set(details.vote_average),
            vote_count: Set(details.vote_count),
            original_language: Set(details.original_language.clone()),
            imdb_id: Set(details.imdb_id.clone()),
            homepage: Set(details.homepage.clone()),
            poster_path: Set(details.poster_path.clone()),
            backdrop_path: Set(details.backdrop_path.clone()),
            trailer_link: Set(links.trailer.clone()),
            teaser_link: Set(links.teaser.clone()),
            is_active: Set(true),
            updated_at: Set(now_sec()),
        };

        movie::Entity::insert(model)
            .on_conflict(
                OnConflict::column(movie::Column::TmdbId)
                    .update_columns([
                        movie::Column::Title,
                        movie::Column::OriginalTitle,
                        movie::Column::Tagline,
                        movie::Column::Overview,
                        movie::Column::Runtime,
                        movie::Column::Budget,
                        movie::Column::Revenue,
                        movie::Column::ReleaseDate,
                        movie::Column::Status,
                        movie::Column::Popularity,
                        movie::Column::VoteAverage,
                        movie::Column::VoteCount,
                        movie::Column::OriginalLanguage,
                        movie::Column::ImdbId,
                        movie::Column::Homepage,
                        movie::Column::PosterPath,
                        movie::Column::BackdropPath,
                        movie::Column::TrailerLink,
                        movie::Column::TeaserLink,
                        movie::Column::IsActive,
                        movie::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        self.movie_by_tmdb_id(details.id).await
    }

    pub async fn movie_by_tmdb_id(&self, tmdb_id: i32) -> IngestResult<movie::Model> {
        movie::Entity::find()
            .filter(movie::Column::TmdbId.eq(tmdb_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("movie tmdb_id={tmdb_id}")).into())
    }

    pub async fn upsert_person(&self, details: &PersonDetails) -> IngestResult<person::Model> {
        let model = person::ActiveModel {
            id: Default::default(),
            tmdb_id: Set(details.id),
            name: Set(details.name.clone()),
            gender: Set(details.gender),
            popularity: Set(details.popularity),
            profile_path: Set(details.profile_path.clone()),
            known_for_department: Set(details.known_for_department.clone()),
            also_known_as: Set(serde_json::to_string(&details.also_known_as).ok()),
            biography: Set(details.biography.clone()),
            birthday: Set(details.birthday.as_deref().and_then(clean_date).map(|d| d.to_string())),
            deathday: Set(details.deathday.as_deref().and_then(clean_date).map(|d| d.to_string())),
            place_of_birth: Set(details.place_of_birth.clone()),
            imdb_id: Set(details.imdb_id.clone()),
            homepage: Set(details.homepage.clone()),
            updated_at: Set(now_sec()),
        };

        person::Entity::insert(model)
            .on_conflict(
                OnConflict::column(person::Column::TmdbId)
                    .update_columns([
                        person::Column::Name,
                        person::Column::Gender,
                        person::Column::Popularity,
                        person::Column::ProfilePath,
                        person::Column::KnownForDepartment,
                        person::Column::AlsoKnownAs,
                        person::Column::Biography,
                        person::Column::Birthday,
                        person::Column::Deathday,
                        person::Column::PlaceOfBirth,
                        person::Column::ImdbId,
                        person::Column::Homepage,
                        person::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        person::Entity::find()
            .filter(person::Column::TmdbId.eq(details.id))
            .one(&self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("person tmdb_id={}", details.id)).into())
    }

    pub async fn upsert_cast_credit(
        &self,
        person: &person::Model,
        movie: &movie::Model,
        character: &str,
        order: i32,
        credit_id: &str,
    ) -> IngestResult<()> {
        let model = cast_credit::ActiveModel {
            id: Default::default(),
            movie_id: Set(movie.id),
            person_id: Set(person.id),
            character: Set(character.to_string()),
            cast_order: Set(order),
            credit_id: Set(credit_id.to_string()),
        };

        cast_credit::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    cast_credit::Column::MovieId,
                    cast_credit::Column::PersonId,
                    cast_credit::Column::CreditId,
                ])
                .update_columns([cast_credit::Column::Character, cast_credit::Column::CastOrder])
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    pub async fn upsert_crew_credit(
        &self,
        person: &person::Model,
        movie: &movie::Model,
        department: &str,
        job: &str,
        credit_id: Option<&str>,
    ) -> IngestResult<()> {
        let model = crew_credit::ActiveModel {
            id: Default::default(),
            movie_id: Set(movie.id),
            person_id: Set(person.id),
            department: Set(department.to_string()),
            job: Set(job.to_string()),
            credit_id: Set(credit_id.map(|s| s.to_string())),
        };

        crew_credit::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    crew_credit::Column::MovieId,
                    crew_credit::Column::PersonId,
                    crew_credit::Column::Department,
                    crew_credit::Column::Job,
                ])
                .update_columns([crew_credit::Column::CreditId])
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    pub async fn upsert_genre(&self, fragment: &GenreFragment) -> IngestResult<genre::Model> {
        let model = genre::ActiveModel {
            id: Default::default(),
            tmdb_id: Set(fragment.id),
            name: Set(fragment.name.clone()),
        };

        genre::Entity::insert(model)
            .on_conflict(
                OnConflict::column(genre::Column::TmdbId)
                    .update_columns([genre::Column::Name])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        genre::Entity::find()
            .filter(genre::Column::TmdbId.eq(fragment.id))
            .one(&self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("genre tmdb_id={}", fragment.id)).into())
    }

    pub async fn upsert_keyword(&self, fragment: &KeywordFragment) -> IngestResult<keyword::Model> {
        let model = keyword::ActiveModel {
            id: Default::default(),
            tmdb_id: Set(fragment.id),
            name: Set(fragment.name.clone()),
        };

        keyword::Entity::insert(model)
            .on_conflict(
                OnConflict::column(keyword::Column::TmdbId)
                    .update_columns([keyword::Column::Name])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        keyword::Entity::find()
            .filter(keyword::Column::TmdbId.eq(fragment.id))
            .one(&self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("keyword tmdb_id={}", fragment.id)).into())
    }

    pub async fn upsert_company(
        &self,
        fragment: &CompanyFragment,
    ) -> IngestResult<production_company::Model> {
        let model = production_company::ActiveModel {
            id: Default::default(),
            tmdb_id: Set(fragment.id),
            name: Set(fragment.name.clone()),
            logo_path: Set(fragment.logo_path.clone()),
            origin_country: Set(fragment.origin_country.clone()),
        };

        production_company::Entity::insert(model)
            .on_conflict(
                OnConflict::column(production_company::Column::TmdbId)
                    .update_columns([
                        production_company::Column::Name,
                        production_company::Column::LogoPath,
                        production_company::Column::OriginCountry,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        production_company::Entity::find()
            .filter(production_company::Column::TmdbId.eq(fragment.id))
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                DbErr::RecordNotFound(format!("production company tmdb_id={}", fragment.id)).into()
            })
    }

    pub async fn link_genre(&self, movie: &movie::Model, genre: &genre::Model) -> IngestResult<()> {
        let model = movie_genre::ActiveModel {
            id: Default::default(),
            movie_id: Set(movie.id),
            genre_id: Set(genre.id),
        };
        movie_genre::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([movie_genre::Column::MovieId, movie_genre::Column::GenreId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    pub async fn link_keyword(
        &self,
        movie: &movie::Model,
        keyword: &keyword::Model,
    ) -> IngestResult<()> {
        let model = movie_keyword::ActiveModel {
            id: Default::default(),
            movie_id: Set(movie.id),
            keyword_id: Set(keyword.id),
        };
        movie_keyword::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    movie_keyword::Column::MovieId,
                    movie_keyword::Column::KeywordId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    pub async fn link_company(
        &self,
        movie: &movie::Model,
        company: &production_company::Model,
    ) -> IngestResult<()> {
        let model = movie_company::ActiveModel {
            id: Default::default(),
            movie_id: Set(movie.id),
            company_id: Set(company.id),
        };
        movie_company::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    movie_company::Column::MovieId,
                    movie_company::Column::CompanyId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    pub async fn upsert_release_date(
        &self,
        movie: &movie::Model,
        country: &str,
        date: Date,
    ) -> IngestResult<()> {
        let model = release_date::ActiveModel {
            id: Default::default(),
            movie_id: Set(movie.id),
            country: Set(country.to_string()),
            release_date: Set(date.to_string()),
        };

        release_date::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    release_date::Column::MovieId,
                    release_date::Column::Country,
                ])
                .update_columns([release_date::Column::ReleaseDate])
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }
}

fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}
