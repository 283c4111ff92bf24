use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movie::Table)
                    .if_not_exists()
                    .col(pk_auto(Movie::Id))
                    .col(integer(Movie::TmdbId))
                    .col(string(Movie::Title))
                    .col(string_null(Movie::OriginalTitle))
                    .col(string_null(Movie::Tagline))
                    .col(text_null(Movie::Overview))
                    .col(integer_null(Movie::Runtime))
                    .col(big_integer_null(Movie::Budget))
                    .col(big_integer_null(Movie::Revenue))
                    .col(string_null(Movie::ReleaseDate))
                    .col(string_null(Movie::Status))
                    .col(double_null(Movie::Popularity))
                    .col(double_null(Movie::VoteAverage))
                    .col(integer_null(Movie::VoteCount))
                    .col(string_null(Movie::OriginalLanguage))
                    .col(string_null(Movie::ImdbId))
                    .col(string_null(Movie::Homepage))
                    .col(string_null(Movie::PosterPath))
                    .col(string_null(Movie::BackdropPath))
                    .col(string_null(Movie::TrailerLink))
                    .col(string_null(Movie::TeaserLink))
                    .col(boolean(Movie::IsActive))
                    .col(big_integer(Movie::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_tmdb_id")
                    .table(Movie::Table)
                    .col(Movie::TmdbId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_release_date")
                    .table(Movie::Table)
                    .col(Movie::ReleaseDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_popularity")
                    .table(Movie::Table)
                    .col(Movie::Popularity)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Person::Table)
                    .if_not_exists()
                    .col(pk_auto(Person::Id))
                    .col(integer(Person::TmdbId))
                    .col(string(Person::Name))
                    .col(integer_null(Person::Gender))
                    .col(double_null(Person::Popularity))
                    .col(string_null(Person::ProfilePath))
                    .col(string_null(Person::KnownForDepartment))
                    .col(text_null(Person::AlsoKnownAs))
                    .col(text_null(Person::Biography))
                    .col(string_null(Person::Birthday))
                    .col(string_null(Person::Deathday))
                    .col(string_null(Person::PlaceOfBirth))
                    .col(string_null(Person::ImdbId))
                    .col(string_null(Person::Homepage))
                    .col(big_integer(Person::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_person_tmdb_id")
                    .table(Person::Table)
                    .col(Person::TmdbId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Genre::Table)
                    .if_not_exists()
                    .col(pk_auto(Genre::Id))
                    .col(integer(Genre::TmdbId))
                    .col(string(Genre::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_genre_tmdb_id")
                    .table(Genre::Table)
                    .col(Genre::TmdbId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Keyword::Table)
                    .if_not_exists()
                    .col(pk_auto(Keyword::Id))
                    .col(integer(Keyword::TmdbId))
                    .col(string(Keyword::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_keyword_tmdb_id")
                    .table(Keyword::Table)
                    .col(Keyword::TmdbId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductionCompany::Table)
                    .if_not_exists()
                    .col(pk_auto(ProductionCompany::Id))
                    .col(integer(ProductionCompany::TmdbId))
                    .col(string(ProductionCompany::Name))
                    .col(string_null(ProductionCompany::LogoPath))
                    .col(string_null(ProductionCompany::OriginCountry))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_production_company_tmdb_id")
                    .table(ProductionCompany::Table)
                    .col(ProductionCompany::TmdbId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CastCredit::Table)
                    .if_not_exists()
                    .col(pk_auto(CastCredit::Id))
                    .col(integer(CastCredit::MovieId))
                    .col(integer(CastCredit::PersonId))
                    .col(string(CastCredit::Character))
                    .col(integer(CastCredit::CastOrder))
                    .col(string(CastCredit::CreditId))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cast_credit_unique")
                    .table(CastCredit::Table)
                    .col(CastCredit::MovieId)
                    .col(CastCredit::PersonId)
                    .col(CastCredit::CreditId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cast_credit_movie")
                    .table(CastCredit::Table)
                    .col(CastCredit::MovieId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CrewCredit::Table)
                    .if_not_exists()
                    .col(pk_auto(CrewCredit::Id))
                    .col(integer(CrewCredit::MovieId))
                    .col(integer(CrewCredit::PersonId))
                    .col(string(CrewCredit::Department))
                    .col(string(CrewCredit::Job))
                    .col(string_null(CrewCredit::CreditId))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_crew_credit_unique")
                    .table(CrewCredit::Table)
                    .col(CrewCredit::MovieId)
                    .col(CrewCredit::PersonId)
                    .col(CrewCredit::Department)
                    .col(CrewCredit::Job)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_crew_credit_movie")
                    .table(CrewCredit::Table)
                    .col(CrewCredit::MovieId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReleaseDate::Table)
                    .if_not_exists()
                    .col(pk_auto(ReleaseDate::Id))
                    .col(integer(ReleaseDate::MovieId))
                    .col(string(ReleaseDate::Country))
                    .col(string(ReleaseDate::ReleaseDate))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_release_date_unique")
                    .table(ReleaseDate::Table)
                    .col(ReleaseDate::MovieId)
                    .col(ReleaseDate::Country)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieGenre::Table)
                    .if_not_exists()
                    .col(pk_auto(MovieGenre::Id))
                    .col(integer(MovieGenre::MovieId))
                    .col(integer(MovieGenre::GenreId))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_genre_unique")
                    .table(MovieGenre::Table)
                    .col(MovieGenre::MovieId)
                    .col(MovieGenre::GenreId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieKeyword::Table)
                    .if_not_exists()
                    .col(pk_auto(MovieKeyword::Id))
                    .col(integer(MovieKeyword::MovieId))
                    .col(integer(MovieKeyword::KeywordId))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_keyword_unique")
                    .table(MovieKeyword::Table)
                    .col(MovieKeyword::MovieId)
                    .col(MovieKeyword::KeywordId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieCompany::Table)
                    .if_not_exists()
                    .col(pk_auto(MovieCompany::Id))
                    .col(integer(MovieCompany::MovieId))
                    .col(integer(MovieCompany::CompanyId))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_company_unique")
                    .table(MovieCompany::Table)
                    .col(MovieCompany::MovieId)
                    .col(MovieCompany::CompanyId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MovieCompany::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieKeyword::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieGenre::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(ReleaseDate::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(CrewCredit::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(CastCredit::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(ProductionCompany::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Keyword::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Genre::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Person::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movie::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movie {
    Table,
    Id,
    TmdbId,
    Title,
    OriginalTitle,
    Tagline,
    Overview,
    Runtime,
    Budget,
    Revenue,
    ReleaseDate,
    Status,
    Popularity,
    VoteAverage,
    VoteCount,
    OriginalLanguage,
    ImdbId,
    Homepage,
    PosterPath,
    BackdropPath,
    TrailerLink,
    TeaserLink,
    IsActive,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Person {
    Table,
    Id,
    TmdbId,
    Name,
    Gender,
    Popularity,
    ProfilePath,
    KnownForDepartment,
    AlsoKnownAs,
    Biography,
    Birthday,
    Deathday,
    PlaceOfBirth,
    ImdbId,
    Homepage,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Genre {
    Table,
    Id,
    TmdbId,
    Name,
}

#[derive(DeriveIden)]
enum Keyword {
    Table,
    Id,
    TmdbId,
    Name,
}

#[derive(DeriveIden)]
enum ProductionCompany {
    Table,
    Id,
    TmdbId,
    Name,
    LogoPath,
    OriginCountry,
}

#[derive(DeriveIden)]
enum CastCredit {
    Table,
    Id,
    MovieId,
    PersonId,
    Character,
    CastOrder,
    CreditId,
}

#[derive(DeriveIden)]
enum CrewCredit {
    Table,
    Id,
    MovieId,
    PersonId,
    Department,
    Job,
    CreditId,
}

#[derive(DeriveIden)]
enum ReleaseDate {
    Table,
    Id,
    MovieId,
    Country,
    #[sea_orm(iden = "release_date")]
    ReleaseDate,
}

#[derive(DeriveIden)]
enum MovieGenre {
    Table,
    Id,
    MovieId,
    GenreId,
}

#[derive(DeriveIden)]
enum MovieKeyword {
    Table,
    Id,
    MovieId,
    KeywordId,
}

#[derive(DeriveIden)]
enum MovieCompany {
    Table,
    Id,
    MovieId,
    CompanyId,
}
