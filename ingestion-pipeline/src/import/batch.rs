use std::ops::Range;

use common::error::AppError;

/// A contiguous slice of items destined for one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub index: usize,
    pub range: Range<usize>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Partitions `total` items into `ceil(total / capacity)` contiguous batches.
pub fn plan_batches(total: usize, capacity: usize) -> Result<Vec<Batch>, AppError> {
    if capacity == 0 {
        return Err(AppError::Validation(
            "records_per_collection must be positive".into(),
        ));
    }

    Ok((0..total.div_ceil(capacity))
        .map(|index| Batch {
            index,
            range: index * capacity..((index + 1) * capacity).min(total),
        })
        .collect())
}
