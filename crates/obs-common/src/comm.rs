//! Process-group handle for distributed runs.

/// Identifies this process within a cooperating process group.
///
/// The core never constructs one of these from a real communicator; the
/// caller owns the MPI (or equivalent) session and hands the core the only
/// two facts it needs: the local rank and the group size. Ownership of
/// observation locations is a pure function of `(global index, rank, size)`,
/// so no further communication state is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommGroup {
    rank: usize,
    size: usize,
}

impl CommGroup {
    /// Create a handle for `rank` within a group of `size` processes.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero or `rank >= size`; both indicate a caller
    /// bug, not a recoverable condition.
    pub fn new(rank: usize, size: usize) -> Self {
        assert!(size > 0, "process group must have at least one member");
        assert!(rank < size, "rank {} out of range for group size {}", rank, size);
        Self { rank, size }
    }

    /// A single-process group (rank 0 of 1). Used by serial runs and tests.
    pub fn single() -> Self {
        Self { rank: 0, size: 1 }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl Default for CommGroup {
    fn default() -> Self {
        Self::single()
    }
}
