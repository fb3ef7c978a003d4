//! cfknn-core: neighborhood-based collaborative filtering.
//!
//! A single subject/target model covers both user-user and item-item CF. Fitting
//! runs three phases in order: per-subject mean centering, a dense
//! subject × subject similarity matrix built from the sparse centered ratings,
//! and then any number of read-only k-nearest-neighbor prediction and top-K
//! recommendation queries.
//!
//! The role (which column is the subject) is configuration, see
//! [`config::Role`] and [`recommender::Recommender`].
pub mod config;
pub mod error;
pub mod evaluation;
pub mod index;
pub mod io;
pub mod math;
pub mod model;
pub mod normalize;
pub mod ratings;
pub mod recommender;
pub mod similarity;

pub use config::{ModelConfig, Role, SimilarityKind};
pub use error::{CfError, Result};
pub use model::NeighborhoodModel;
pub use ratings::{Rating, RatingSet};
pub use recommender::Recommender;
