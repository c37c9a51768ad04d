//! Shared data contract between the playback engine and the now-playing integration

pub mod models;

pub use models::*;
