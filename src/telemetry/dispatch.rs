use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use super::{deliver, RetryPolicy, Transport};
use crate::TelemetrySample;

// ---

/// Non-blocking producer side of the telemetry queue.
#[derive(Debug, Clone)]
pub struct TelemetryQueue {
    tx: mpsc::Sender<TelemetrySample>,
}

impl TelemetryQueue {
    // ---
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<TelemetrySample>) {
        // ---
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (TelemetryQueue { tx }, rx)
    }

    /// Queue and start the sender in one go.
    pub fn spawn<T>(transport: T, policy: RetryPolicy, capacity: usize) -> (Self, JoinHandle<()>)
    where
        T: Transport + 'static,
    {
        // ---
        let (queue, rx) = Self::channel(capacity);
        (queue, spawn_sender(transport, policy, rx))
    }

    /// Hand a sample to the sender. Returns `false` if it was dropped
    /// because the queue is full or the sender is gone.
    pub fn submit(&self, sample: TelemetrySample) -> bool {
        // ---
        match self.tx.try_send(sample) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Telemetry queue full, sample dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::error!("Telemetry sender stopped, sample dropped");
                false
            }
        }
    }
}

/// Deliver queued samples one at a time until every producer is dropped.
pub fn spawn_sender<T>(
    transport: T,
    policy: RetryPolicy,
    mut rx: mpsc::Receiver<TelemetrySample>,
) -> JoinHandle<()>
where
    T: Transport + 'static,
{
    // ---
    tokio::spawn(async move {
        while let Some(sample) = rx.recv().await {
            deliver(&transport, &policy, sample).await;
        }
        tracing::debug!("Telemetry sender exiting");
    })
}
