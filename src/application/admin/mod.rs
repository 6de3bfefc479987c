//! Application services for the administrative surface.

pub mod posts;
pub mod users;
