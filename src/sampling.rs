//! Reservoir sampling (Algorithm R).

use rand::Rng;

/// Cache key of one drawn sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleKey {
    pub seed: u64,
    pub n_samples: usize,
}

/// One step of Algorithm R.
///
/// `index` is the 0-based position of `item` in the stream. The first
/// `capacity` items fill the reservoir; item `k` after that is kept with
/// probability `capacity / (k + 1)` and replaces a uniformly chosen slot.
pub fn reservoir_step<T, R: Rng + ?Sized>(
    mut reservoir: Vec<T>,
    item: T,
    index: usize,
    capacity: usize,
    rng: &mut R,
) -> Vec<T> {
    if capacity == 0 {
        return reservoir;
    }
    if index < capacity {
        reservoir.push(item);
        return reservoir;
    }
    let slot = rng.random_range(0..=index);
    if slot < capacity {
        reservoir[slot] = item;
    }
    reservoir
}

/// Reads drawn by reservoir sampling, with their stream indices. Slot order
/// is the reservoir's, not stream order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample<T> {
    key: SampleKey,
    slots: Vec<(usize, T)>,
}

impl<T> Sample<T> {
    pub(crate) fn new(key: SampleKey, slots: Vec<(usize, T)>) -> Self {
        Self { key, slots }
    }

    pub fn key(&self) -> SampleKey {
        self.key
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Stream index held by each reservoir slot.
    pub fn indices(&self) -> Vec<usize> {
        self.slots.iter().map(|(i, _)| *i).collect()
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().map(|(_, item)| item)
    }

    pub fn slots(&self) -> &[(usize, T)] {
        &self.slots
    }
}
