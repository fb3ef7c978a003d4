//! Compact position lookup for raw entity ids.
//!
//! Raw ids are only assumed to be "dense enough". Dense per-entity storage
//! (means, similarity rows) is sized by the number of ids actually observed, and
//! an `IdIndex` translates between raw ids and those compact positions.
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct IdIndex {
    positions: HashMap<u32, usize>,
    ids: Vec<u32>,
}

impl IdIndex {
    /// Build an index from ids in ascending order, so compact positions follow
    /// raw id order.
    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        let mut sorted: Vec<u32> = ids.into_iter().collect();
        sorted.sort_unstable();
        sorted.dedup();

        let positions = sorted
            .iter()
            .enumerate()
            .map(|(pos, &id)| (id, pos))
            .collect();

        Self {
            positions,
            ids: sorted,
        }
    }

    #[inline]
    pub fn position(&self, id: u32) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    #[inline]
    pub fn id(&self, position: usize) -> u32 {
        self.ids[position]
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }
}
