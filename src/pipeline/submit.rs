//! Hand-off of composed batches to a command-queue engine.

use bytes::Bytes;
use flume::Receiver;
use tracing::{debug, error, info, instrument};

use super::driver::JobBatch;
use super::reserve::Reservation;
use crate::cmdq::{self, EventTable, RawCommand};
use crate::error::Result;

/// A batch together with the engines it holds until it completes.
pub struct Submission {
    pub batch: JobBatch,
    pub reservation: Reservation,
}

/// Executes resolved batches. Returning means the batch completed.
pub trait CommandQueue: Send {
    fn execute(&mut self, frame_no: u32, raw: &[RawCommand], encoded: Bytes) -> Result<()>;
}

/// Logs every command instead of touching hardware.
#[derive(Debug, Default)]
pub struct DryRunEngine {
    pub batches: usize,
    pub commands: usize,
}

impl CommandQueue for DryRunEngine {
    fn execute(&mut self, frame_no: u32, raw: &[RawCommand], encoded: Bytes) -> Result<()> {
        for (i, cmd) in raw.iter().enumerate() {
            debug!(frame = frame_no, "[{i:03}] {cmd:x?}");
        }
        info!(
            "Frame {} executed: {} commands, {} bytes",
            frame_no,
            raw.len(),
            encoded.len()
        );
        self.batches += 1;
        self.commands += raw.len();
        Ok(())
    }
}

/// Drain `rx` into `queue` until every sender is gone.
///
/// A batch that fails to resolve or execute is dropped with its reservation;
/// the engine keeps serving.
#[instrument(skip_all)]
pub async fn serve<Q: CommandQueue>(
    mut queue: Q,
    events: EventTable,
    rx: Receiver<Submission>,
) -> Q {
    while let Ok(Submission { batch, reservation }) = rx.recv_async().await {
        let frame_no = batch.frame_no;
        let result = batch.resolve(&events).and_then(|raw| {
            let encoded = cmdq::encode(&raw);
            queue.execute(frame_no, &raw, encoded)
        });
        if let Err(e) = result {
            metrics::counter!("mdp_jobs_aborted").increment(1);
            error!("Frame {} failed: {}", frame_no, e);
        }
        drop(reservation);
    }
    debug!("Submission channel closed");
    queue
}
