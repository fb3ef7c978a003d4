//! Role-aware facade over [`NeighborhoodModel`].
//!
//! Callers speak in users and items. Under `Role::UserUser` a user is the
//! subject; under `Role::ItemItem` the ratings are transposed before fitting so
//! items are subjects and the same model code computes item neighborhoods.
use std::cmp::Ordering;

use rayon::prelude::*;

use crate::config::{ModelConfig, Role};
use crate::error::{CfError, Result};
use crate::model::NeighborhoodModel;
use crate::ratings::RatingSet;
use crate::similarity::Similarity;

#[derive(Debug)]
pub struct Recommender {
    role: Role,
    model: NeighborhoodModel,
}

impl Recommender {
    /// Orient `ratings` (subject = user, target = item) by `config.role` and fit.
    pub fn fit(ratings: &RatingSet, config: ModelConfig) -> Result<Self> {
        let role = config.role;
        let mut model = NeighborhoodModel::new(Self::orient(ratings, role), config)?;
        model.fit()?;
        Ok(Self { role, model })
    }

    /// Same as [`Recommender::fit`] with a custom similarity strategy.
    pub fn fit_with_similarity(
        ratings: &RatingSet,
        config: ModelConfig,
        similarity: Box<dyn Similarity>,
    ) -> Result<Self> {
        let role = config.role;
        let mut model =
            NeighborhoodModel::with_similarity(Self::orient(ratings, role), config, similarity)?;
        model.fit()?;
        Ok(Self { role, model })
    }

    fn orient(ratings: &RatingSet, role: Role) -> RatingSet {
        match role {
            Role::UserUser => ratings.clone(),
            Role::ItemItem => ratings.transpose(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn model(&self) -> &NeighborhoodModel {
        &self.model
    }

    pub fn user_count(&self) -> usize {
        match self.role {
            Role::UserUser => self.model.subject_count(),
            Role::ItemItem => self.model.target_count(),
        }
    }

    pub fn item_count(&self) -> usize {
        match self.role {
            Role::UserUser => self.model.target_count(),
            Role::ItemItem => self.model.subject_count(),
        }
    }

    /// Predicted rating of `item` by `user`.
    pub fn predict(&self, user: u32, item: u32) -> Result<f64> {
        let (subject, target) = self.role.orient(user, item);
        self.model.predict(subject, target)
    }

    /// Items `user` has rated, ascending.
    pub fn rated_items(&self, user: u32) -> Result<Vec<u32>> {
        match self.role {
            Role::UserUser => self.model.rated_targets(user),
            Role::ItemItem => {
                if user as usize >= self.user_count() {
                    return Err(CfError::UnknownSubject {
                        subject: user,
                        subject_count: self.user_count(),
                    });
                }
                self.model.raters(user)
            }
        }
    }

    /// Top `top_k` items the user has not rated, best first.
    pub fn recommend_items(&self, user: u32, top_k: usize) -> Result<Vec<u32>> {
        Ok(self
            .recommend_items_scored(user, top_k)?
            .into_iter()
            .map(|(item, _)| item)
            .collect())
    }

    /// Top `top_k` unrated items with their predicted ratings.
    ///
    /// Under `ItemItem` every unrated item is a separate subject, so each
    /// candidate is one `predict(item, user)` call; a user with no ratings gets
    /// an empty list.
    pub fn recommend_items_scored(&self, user: u32, top_k: usize) -> Result<Vec<(u32, f64)>> {
        match self.role {
            Role::UserUser => self.model.recommend_scored(user, top_k),
            Role::ItemItem => {
                if top_k == 0 {
                    return Ok(Vec::new());
                }
                let rated = self.rated_items(user)?;
                let mut scored: Vec<(u32, f64)> = self
                    .model
                    .fitted_subjects()?
                    .par_iter()
                    .filter(|&&item| rated.binary_search(&item).is_err())
                    .filter_map(|&item| match self.model.predict(item, user) {
                        Ok(score) => Some(Ok((item, score))),
                        Err(CfError::EmptyRaterSet { .. }) => None,
                        Err(e) => Some(Err(e)),
                    })
                    .collect::<Result<Vec<_>>>()?;

                scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
                scored.truncate(top_k);
                Ok(scored)
            }
        }
    }
}
