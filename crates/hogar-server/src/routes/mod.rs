//! Route handlers for the HTTP API.

pub mod audios;
pub mod auth;
pub mod health;
pub mod movies;
pub mod photos;
pub mod subtitles;
pub mod users;
