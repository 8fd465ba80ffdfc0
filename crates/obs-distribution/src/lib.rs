//! Static partitioning of observation locations across a process group.
//!
//! Each process independently computes the set of global location indices it
//! owns; ownership is a pure function of `(index, rank, size)`, so all
//! processes agree without exchanging messages. The same purity requirement
//! applies to any later [`RoundRobin::erase`] calls: as long as the erase
//! predicate depends only on per-location data visible to every process
//! (e.g. a timestamp read from the shared file), the partitions stay
//! consistent with no runtime coordination.

use obs_common::CommGroup;
use tracing::trace;

/// Round-robin distribution of `[0, total)` over a process group.
///
/// Global index `i` belongs to the process whose rank equals `i % size`.
/// This load-balances variable-length downstream work evenly when the work
/// is unrelated to spatial locality, which is the dominant case for
/// scattered point observations; block partitioning would concentrate work
/// in clustered regions.
#[derive(Debug, Clone)]
pub struct RoundRobin {
    total: usize,
    indices: Vec<usize>,
}

impl RoundRobin {
    /// Partition `total` locations across the process group.
    pub fn new(comm: &CommGroup, total: usize) -> Self {
        let indices: Vec<usize> = (0..total)
            .filter(|i| i % comm.size() == comm.rank())
            .collect();
        trace!(
            rank = comm.rank(),
            group_size = comm.size(),
            total = total,
            owned = indices.len(),
            "constructed round-robin distribution"
        );
        Self { total, indices }
    }

    /// Partition `total` locations, keeping atomic records intact.
    ///
    /// `record_numbers[i]` is the record a location belongs to (e.g. one
    /// vertical sounding); every location of a record goes to the process
    /// whose rank equals `record_number % size`, so records are never split.
    ///
    /// # Panics
    ///
    /// Panics if `record_numbers.len() != total`.
    pub fn with_record_groups(comm: &CommGroup, total: usize, record_numbers: &[usize]) -> Self {
        assert_eq!(
            record_numbers.len(),
            total,
            "record group list must cover every location"
        );
        let indices: Vec<usize> = (0..total)
            .filter(|&i| record_numbers[i] % comm.size() == comm.rank())
            .collect();
        trace!(
            rank = comm.rank(),
            group_size = comm.size(),
            total = total,
            owned = indices.len(),
            "constructed record-grouped round-robin distribution"
        );
        Self { total, indices }
    }

    /// Number of locations owned by this process.
    pub fn size(&self) -> usize {
        self.indices.len()
    }

    /// Owned global indices, strictly increasing.
    pub fn index(&self) -> &[usize] {
        &self.indices
    }

    /// The pre-distribution global location count.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Remove one global index from the owned set.
    ///
    /// A no-op when the index is not currently owned; erasing twice is the
    /// same as erasing once. The owned set only ever shrinks.
    pub fn erase(&mut self, global_index: usize) {
        if let Ok(pos) = self.indices.binary_search(&global_index) {
            self.indices.remove(pos);
        }
    }
}
