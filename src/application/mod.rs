//! Application services layer.

pub mod admin;
pub mod auth;
pub mod error;
pub mod images;
pub mod passwords;
pub mod posts;
pub mod repos;
pub mod user_posts;
