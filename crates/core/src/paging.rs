use crate::TreeError;
use serde::Serialize;

/// Half-open window `[offset, offset + limit)` into a node's remote children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct PagingParams {
    offset: usize,
    limit: usize,
}

impl PagingParams {
    pub fn new(offset: usize, limit: usize) -> Result<Self, TreeError> {
        if limit == 0 {
            return Err(TreeError::InvalidPaging { offset });
        }
        Ok(Self { offset, limit })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// One past the last requested index.
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.limit)
    }

    /// A page shorter than the limit means the remote collection is exhausted.
    pub fn is_exhausted_by(&self, fetched: usize) -> bool {
        fetched < self.limit
    }
}
