//! Database query modules.

pub mod audios;
pub mod auth;
pub mod movies;
pub mod photos;
pub mod subtitles;
pub mod users;
