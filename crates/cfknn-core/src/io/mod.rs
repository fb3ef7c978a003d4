//! IO utilities for loading rating files.

pub mod ratings_csv;

pub use ratings_csv::{read_ratings, read_ratings_with_config, RatingsReaderConfig};
