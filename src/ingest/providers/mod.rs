// src/ingest/providers/mod.rs
pub mod fixture;
pub mod youtube;

pub use fixture::FixtureSource;
pub use youtube::YouTubeSource;
