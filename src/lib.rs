pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod harvest;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod tmdb;
