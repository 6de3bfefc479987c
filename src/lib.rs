//! Approval desk for social media posts.
//!
//! Admins draft posts for users, users attach images and review them, and
//! admins mark approved posts as published.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
