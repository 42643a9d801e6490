pub mod cache;
pub mod credentials;
pub mod source;
pub mod tmdb;
