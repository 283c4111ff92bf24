pub mod cast_credit;
pub mod crew_credit;
pub mod genre;
pub mod keyword;
pub mod movie;
pub mod movie_company;
pub mod movie_genre;
pub mod movie_keyword;
pub mod person;
pub mod production_company;
pub mod release_date;
