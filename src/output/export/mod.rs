//! Export of episode logs for external analysis
//!
//! | Format  | Module    |
//! |---------|-----------|
//! | CSV     | [`csv`]   |
//!
//! The whole log can also be serialized with `serde_json`, since
//! [`EpisodeLog`](crate::environment::EpisodeLog) derives `Serialize`.

pub mod csv;

pub use csv::{export_episode_csv, CsvConfig, CsvMetadata, EPISODE_COLUMNS};
