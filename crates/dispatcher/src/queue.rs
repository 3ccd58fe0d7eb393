//! JobQueue - pre-filled, closed job buffer shared by all workers

use async_channel::{bounded, Receiver};
use contracts::Job;

/// Fixed-capacity job buffer
///
/// Filled with every job and closed on construction; workers only take.
/// Each job is delivered to exactly one caller of [`JobQueue::take`].
/// Delivery order across workers is not guaranteed.
#[derive(Debug, Clone)]
pub struct JobQueue {
    rx: Receiver<Job>,
}

impl JobQueue {
    /// Build the queue from the full job collection
    pub fn new(jobs: Vec<Job>) -> Self {
        // bounded(0) is a rendezvous channel, which would block population
        let (tx, rx) = bounded(jobs.len().max(1));
        for job in jobs {
            if let Err(err) = tx.try_send(job) {
                // capacity equals the job count and `rx` is alive
                unreachable!("job queue rejected job {}", err.into_inner().index);
            }
        }
        tx.close();
        Self { rx }
    }

    /// Take the next job, or `None` once the queue is exhausted
    pub async fn take(&self) -> Option<Job> {
        self.rx.recv().await.ok()
    }

    /// Jobs not yet taken
    pub fn remaining(&self) -> usize {
        self.rx.len()
    }

    /// Whether every job has been taken
    pub fn is_exhausted(&self) -> bool {
        self.rx.is_empty()
    }
}
