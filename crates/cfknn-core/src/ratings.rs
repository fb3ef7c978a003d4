//! Rating observations and the validated sequence a model is fitted from.
//!
//! `RatingSet` is the ingestion boundary: negative or out-of-range ids,
//! non-finite values and repeated `(subject, target)` pairs are rejected here so
//! that nothing deeper in the pipeline has to re-check them.
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::Role;
use crate::error::{CfError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub subject: u32,
    pub target: u32,
    pub value: f64,
}

impl Rating {
    pub fn new(subject: u32, target: u32, value: f64) -> Self {
        Rating {
            subject,
            target,
            value,
        }
    }

    /// Swap the subject and target roles.
    pub fn transposed(&self) -> Rating {
        Rating {
            subject: self.target,
            target: self.subject,
            value: self.value,
        }
    }
}

impl From<(u32, u32, f64)> for Rating {
    fn from(value: (u32, u32, f64)) -> Self {
        Rating::new(value.0, value.1, value.2)
    }
}

/// An immutable, validated, index-stable sequence of ratings.
#[derive(Debug, Clone, Default)]
pub struct RatingSet {
    ratings: Vec<Rating>,
    subject_count: usize,
    target_count: usize,
}

impl RatingSet {
    /// Validate and wrap a rating sequence.
    ///
    /// # Errors
    ///
    /// `MalformedInput` when a value is not finite or a `(subject, target)` pair
    /// occurs more than once.
    pub fn new(ratings: Vec<Rating>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(ratings.len());
        let mut subject_count = 0usize;
        let mut target_count = 0usize;

        for (index, rating) in ratings.iter().enumerate() {
            if !rating.value.is_finite() {
                return Err(CfError::MalformedInput {
                    index,
                    reason: format!("rating value {} is not finite", rating.value),
                });
            }
            if !seen.insert((rating.subject, rating.target)) {
                return Err(CfError::MalformedInput {
                    index,
                    reason: format!(
                        "duplicate rating for subject {} and target {}",
                        rating.subject, rating.target
                    ),
                });
            }
            subject_count = subject_count.max(rating.subject as usize + 1);
            target_count = target_count.max(rating.target as usize + 1);
        }

        Ok(RatingSet {
            ratings,
            subject_count,
            target_count,
        })
    }

    /// Build from signed triples as handed over by a loader.
    ///
    /// Ids must fit in `u32` and be non-negative.
    pub fn from_raw(triples: &[(i64, i64, f64)]) -> Result<Self> {
        let mut ratings = Vec::with_capacity(triples.len());
        for (index, &(subject, target, value)) in triples.iter().enumerate() {
            let subject = checked_id(index, "subject", subject)?;
            let target = checked_id(index, "target", target)?;
            ratings.push(Rating::new(subject, target, value));
        }
        RatingSet::new(ratings)
    }

    /// Interpret `(user, item, value)` triples under `role`.
    pub fn from_user_item(triples: &[(u32, u32, f64)], role: Role) -> Result<Self> {
        let ratings = triples
            .iter()
            .map(|&(user, item, value)| {
                let (subject, target) = role.orient(user, item);
                Rating::new(subject, target, value)
            })
            .collect();
        RatingSet::new(ratings)
    }

    /// The same observations with subject and target swapped.
    pub fn transpose(&self) -> RatingSet {
        RatingSet {
            ratings: self.ratings.iter().map(Rating::transposed).collect(),
            subject_count: self.target_count,
            target_count: self.subject_count,
        }
    }

    /// Keep the ratings at `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> RatingSet {
        let ratings = indices.iter().map(|&i| self.ratings[i]).collect::<Vec<_>>();
        let subject_count = ratings
            .iter()
            .map(|r| r.subject as usize + 1)
            .max()
            .unwrap_or(0);
        let target_count = ratings
            .iter()
            .map(|r| r.target as usize + 1)
            .max()
            .unwrap_or(0);
        RatingSet {
            ratings,
            subject_count,
            target_count,
        }
    }

    /// `max(subject id) + 1`, or 0 when empty.
    pub fn subject_count(&self) -> usize {
        self.subject_count
    }

    /// `max(target id) + 1`, or 0 when empty.
    pub fn target_count(&self) -> usize {
        self.target_count
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    pub fn as_slice(&self) -> &[Rating] {
        &self.ratings
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rating> {
        self.ratings.iter()
    }

    pub fn to_vec(&self) -> Vec<Rating> {
        self.ratings.clone()
    }
}

impl<'a> IntoIterator for &'a RatingSet {
    type Item = &'a Rating;
    type IntoIter = std::slice::Iter<'a, Rating>;

    fn into_iter(self) -> Self::IntoIter {
        self.ratings.iter()
    }
}

fn checked_id(index: usize, field: &str, raw: i64) -> Result<u32> {
    u32::try_from(raw).map_err(|_| CfError::MalformedInput {
        index,
        reason: format!("{} id {} is not a non-negative 32-bit integer", field, raw),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_max_id_plus_one() {
        let set = RatingSet::new(vec![
            Rating::new(0, 4, 1.0),
            Rating::new(9, 1, 2.0),
        ])
        .unwrap();
        assert_eq!(set.subject_count(), 10);
        assert_eq!(set.target_count(), 5);
    }

    #[test]
    fn empty_set_has_zero_counts() {
        let set = RatingSet::new(vec![]).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.subject_count(), 0);
        assert_eq!(set.target_count(), 0);
    }

    #[test]
    fn negative_ids_are_malformed() {
        let err = RatingSet::from_raw(&[(0, 1, 3.0), (-1, 2, 4.0)]).unwrap_err();
        assert!(matches!(err, CfError::MalformedInput { index: 1, .. }));
    }

    #[test]
    fn oversized_ids_are_malformed() {
        let err = RatingSet::from_raw(&[(0, i64::from(u32::MAX) + 1, 3.0)]).unwrap_err();
        assert!(matches!(err, CfError::MalformedInput { index: 0, .. }));
    }

    #[test]
    fn non_finite_values_are_malformed() {
        let err = RatingSet::new(vec![Rating::new(0, 0, f64::NAN)]).unwrap_err();
        assert!(matches!(err, CfError::MalformedInput { index: 0, .. }));
    }

    #[test]
    fn duplicate_pairs_are_malformed() {
        let err = RatingSet::new(vec![
            Rating::new(1, 2, 3.0),
            Rating::new(0, 2, 3.0),
            Rating::new(1, 2, 5.0),
        ])
        .unwrap_err();
        assert!(matches!(err, CfError::MalformedInput { index: 2, .. }));
    }

    #[test]
    fn transpose_swaps_roles_and_counts() {
        let set = RatingSet::new(vec![Rating::new(3, 0, 2.5)]).unwrap();
        let t = set.transpose();
        assert_eq!(t.as_slice()[0], Rating::new(0, 3, 2.5));
        assert_eq!(t.subject_count(), 1);
        assert_eq!(t.target_count(), 4);
    }

    #[test]
    fn item_item_role_swaps_columns() {
        let set = RatingSet::from_user_item(&[(1, 7, 4.0)], Role::ItemItem).unwrap();
        assert_eq!(set.as_slice()[0], Rating::new(7, 1, 4.0));
    }
}
