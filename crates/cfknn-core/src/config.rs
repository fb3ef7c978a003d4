use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CfError, Result};

/// Central configuration for a neighborhood model.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Maximum number of neighbors used per prediction.
    pub k: usize,
    pub similarity: SimilarityKind,
    pub role: Role,
}

impl ModelConfig {
    pub const DEFAULT_K: usize = 40;

    pub fn new(k: usize, similarity: SimilarityKind, role: Role) -> Self {
        Self {
            k,
            similarity,
            role,
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_similarity(mut self, similarity: SimilarityKind) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(CfError::InvalidConfig(
                "k must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            k: Self::DEFAULT_K,
            similarity: SimilarityKind::default(),
            role: Role::default(),
        }
    }
}

/// Built-in similarity strategies.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityKind {
    #[default]
    Cosine,
    Pearson,
    Jaccard,
}

impl FromStr for SimilarityKind {
    type Err = CfError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(SimilarityKind::Cosine),
            "pearson" => Ok(SimilarityKind::Pearson),
            "jaccard" => Ok(SimilarityKind::Jaccard),
            _ => Err(CfError::InvalidConfig(format!(
                "Unknown similarity: {}. Expected one of cosine, pearson, jaccard",
                s
            ))),
        }
    }
}

impl fmt::Display for SimilarityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimilarityKind::Cosine => "cosine",
            SimilarityKind::Pearson => "pearson",
            SimilarityKind::Jaccard => "jaccard",
        };
        f.write_str(name)
    }
}

/// Which side of a `(user, item)` observation plays the subject.
///
/// `UserUser` keeps users as subjects and items as targets. `ItemItem` swaps
/// them, so neighborhoods are computed between items and predictions are made
/// for users.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    UserUser,
    ItemItem,
}

impl Role {
    /// Map a `(user, item)` pair to `(subject, target)`.
    pub fn orient(self, user: u32, item: u32) -> (u32, u32) {
        match self {
            Role::UserUser => (user, item),
            Role::ItemItem => (item, user),
        }
    }
}

impl FromStr for Role {
    type Err = CfError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "user_user" | "user" => Ok(Role::UserUser),
            "item_item" | "item" => Ok(Role::ItemItem),
            _ => Err(CfError::InvalidConfig(format!(
                "Unknown role: {}. Expected user_user or item_item",
                s
            ))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::UserUser => f.write_str("user_user"),
            Role::ItemItem => f.write_str("item_item"),
        }
    }
}
