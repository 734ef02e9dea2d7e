// Explicit fan-out with a join barrier.
//
// The pipeline issues one generation call per candidate tweet. Rather
// than an implicit thread-pool map, the fan-out is an explicit task
// group: bounded concurrency, a join barrier, and one result slot per
// input recording whether the task succeeded or fell back to the
// per-item placeholder. Nothing streams and nothing is cancelled — the
// group returns only when every slot is filled.

use anyhow::Result;
use futures::stream::{self, StreamExt};
use std::future::Future;
use tracing::warn;

/// One completed slot of a task-group run.
#[derive(Debug, Clone)]
pub struct TaskSlot<T> {
    /// Position of the originating item in the input order.
    pub index: usize,
    pub value: T,
    /// True when the task failed and the per-item fallback filled the slot.
    pub fell_back: bool,
}

/// Run `task` over every item with bounded concurrency and join all
/// results.
///
/// Slots come back in input order regardless of completion order. A task
/// that fails gets its slot filled by `fallback` instead of surfacing an
/// error — partial failure degrades individual slots, never the batch.
pub async fn run<I, T, F, Fut, FB>(
    items: Vec<I>,
    concurrency: usize,
    task: F,
    fallback: FB,
) -> Vec<TaskSlot<T>>
where
    I: Clone,
    F: Fn(usize, I) -> Fut,
    Fut: Future<Output = Result<T>>,
    FB: Fn(usize, &I) -> T,
{
    let concurrency = concurrency.max(1);
    let task = &task;
    let fallback = &fallback;

    let mut slots: Vec<TaskSlot<T>> = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| async move {
            match task(index, item.clone()).await {
                Ok(value) => TaskSlot {
                    index,
                    value,
                    fell_back: false,
                },
                Err(err) => {
                    warn!(index = index, error = %err, "Task failed, filling slot with fallback");
                    TaskSlot {
                        index,
                        value: fallback(index, &item),
                        fell_back: true,
                    }
                }
            }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    slots.sort_by_key(|slot| slot.index);
    slots
}
