//! Concurrent fan-out across independent business records.
//!
//! Loops for different records share no mutable state; the only shared
//! resource is the generation capability, so the caller supplies an
//! admission ceiling and this helper keeps at most that many loops in
//! flight.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream;

use crate::domain::{BusinessRecord, LoopResult, related_records};
use crate::engine::RepairEngine;
use crate::llm::TextGenerator;
use crate::trace::TraceRecorder;

/// One unit of batch work: a record plus its internal-link candidates.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub record: BusinessRecord,
    pub link_candidates: Vec<String>,
}

impl BatchJob {
    pub fn new(record: BusinessRecord, link_candidates: Vec<String>) -> Self {
        Self {
            record,
            link_candidates,
        }
    }
}

/// Build jobs for a pool of records, deriving each record's link candidates
/// from the related records in the same pool.
pub fn jobs_from_pool(pool: &[BusinessRecord]) -> Vec<BatchJob> {
    pool.iter()
        .map(|record| {
            let candidates = related_records(record, pool)
                .iter()
                .map(|r| r.slug())
                .collect();
            BatchJob::new(record.clone(), candidates)
        })
        .collect()
}

/// Run the repair loop for every job, at most `max_concurrent` in flight.
///
/// Returns `(business_id, LoopResult)` pairs in completion order.
pub async fn run_batch<G, R>(
    engine: Arc<RepairEngine<G, R>>,
    jobs: Vec<BatchJob>,
    max_concurrent: usize,
) -> Vec<(String, LoopResult)>
where
    G: TextGenerator,
    R: TraceRecorder,
{
    let max_concurrent = max_concurrent.max(1);

    stream::iter(jobs)
        .map(|job| {
            let engine = engine.clone();
            async move {
                let business_id = job.record.business_id.clone();
                let result = engine.run(&job.record, job.link_candidates).await;
                (business_id, result)
            }
        })
        .buffer_unordered(max_concurrent)
        .collect()
        .await
}
