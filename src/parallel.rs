//! Parallel chunk processing
//!
//! Fans the sub-blocks of one chunk out to a fixed-size rayon pool, waits for
//! all of them and returns the results in sub-block order, whatever order the
//! workers finished in. A failed or panicking worker fails the whole chunk.

use crate::error::{FilterError, Result};
use crate::splitter::SubBlock;
use crate::transform::{BlockTransform, Transformed};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

pub struct ParallelChunkProcessor {
    /// Absent for a single worker; everything then runs on the caller's thread
    pool: Option<ThreadPool>,
    worker_count: usize,
}

impl ParallelChunkProcessor {
    pub fn new(worker_count: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(FilterError::invalid("worker count must be at least 1"));
        }

        let pool = if worker_count > 1 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(worker_count)
                .thread_name(|i| format!("text-filter-worker-{}", i))
                .build()?;
            Some(pool)
        } else {
            None
        };

        Ok(Self { pool, worker_count })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Transform every sub-block and return the results in ordinal order
    pub fn process_chunk<T: BlockTransform>(
        &self,
        sub_blocks: &[SubBlock<'_>],
        transform: &T,
    ) -> Result<Vec<Transformed>> {
        match (&self.pool, sub_blocks) {
            (Some(pool), blocks) if blocks.len() > 1 => pool.install(|| {
                blocks
                    .par_iter()
                    .map(|block| run_worker(block, transform))
                    .collect::<Result<Vec<_>>>()
            }),
            (_, blocks) => blocks
                .iter()
                .map(|block| run_worker(block, transform))
                .collect(),
        }
    }
}

fn run_worker<T: BlockTransform>(block: &SubBlock<'_>, transform: &T) -> Result<Transformed> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| transform.apply(block.text)));

    match outcome {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(FilterError::Worker {
            ordinal: block.ordinal,
            message: e.to_string(),
        }),
        Err(payload) => Err(FilterError::Worker {
            ordinal: block.ordinal,
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
