//! Bounded worker pool for deferred key release
//!
//! Key-down ordering is exact because the scheduler issues it inline;
//! key-up only has to happen roughly one hold-duration later, so it is
//! pushed onto this pool and forgotten. Submission is `try_send` on a
//! bounded channel and can never stall the delivery of the next
//! scheduled key-down, whatever the pool is doing.

use crate::backend::KeySink;
use crate::InputError;
use clavier_core::PhysicalKey;
use flume::{Receiver, Sender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Most deferred releases allowed in flight at once
pub const RELEASE_QUEUE_CAPACITY: usize = 64;

/// Worker threads draining the queue
///
/// Each worker spends a hold-duration asleep per job, so throughput is
/// `workers / hold`. At the 40 ms hold this is 200 releases/s, several
/// times what a 15-key chord storm needs.
pub const RELEASE_WORKERS: usize = 8;

struct ReleaseJob {
    key: PhysicalKey,
    hold: Duration,
}

/// Deferred key-release worker pool
///
/// Dropping the pool closes the queue and joins the workers; jobs
/// already queued still run to completion first.
pub struct ReleasePool {
    job_tx: Option<Sender<ReleaseJob>>,
    workers: Vec<JoinHandle<()>>,
}

impl ReleasePool {
    /// Spawn the pool over the sink that will receive the key-ups.
    pub fn new(sink: Arc<dyn KeySink>) -> Self {
        let (job_tx, job_rx) = flume::bounded::<ReleaseJob>(RELEASE_QUEUE_CAPACITY);

        let workers = (0..RELEASE_WORKERS)
            .map(|i| {
                let rx = job_rx.clone();
                let sink = Arc::clone(&sink);
                std::thread::Builder::new()
                    .name(format!("key-release-{i}"))
                    .spawn(move || Self::run(rx, sink))
                    .expect("Failed to spawn key-release worker thread")
            })
            .collect();

        Self { job_tx: Some(job_tx), workers }
    }

    fn run(rx: Receiver<ReleaseJob>, sink: Arc<dyn KeySink>) {
        while let Ok(job) = rx.recv() {
            std::thread::sleep(job.hold);
            // fire-and-forget: a failed release is logged, never propagated
            if let Err(e) = sink.key_up(&job.key) {
                log::warn!("deferred key-up for '{}' failed: {}", job.key, e);
            }
        }
    }

    /// Queue a key-up to run `hold` from now. Never blocks.
    pub fn submit(&self, key: PhysicalKey, hold: Duration) -> Result<(), InputError> {
        let Some(tx) = &self.job_tx else {
            return Err(InputError::ReleasePoolClosed);
        };
        tx.try_send(ReleaseJob { key, hold }).map_err(|e| match e {
            TrySendError::Full(_) => InputError::ReleaseQueueFull,
            TrySendError::Disconnected(_) => InputError::ReleasePoolClosed,
        })
    }
}

impl Drop for ReleasePool {
    fn drop(&mut self) {
        // closing the channel lets workers drain and exit
        drop(self.job_tx.take());
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::warn!("key-release worker panicked");
            }
        }
    }
}
