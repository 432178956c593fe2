//! Background transport loop feeding a [`Consumer`] from a subscriber.

use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::consumer::Consumer;
use crate::bus::Subscriber;

/// Statistics from a transport thread.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransportStats {
    /// Frames handled and acknowledged.
    pub handled: usize,
    /// Frames nacked because routing or the handler failed.
    pub failed: usize,
    /// Subset of `failed` that should land in a dead-letter queue.
    pub dead_lettered: usize,
    /// Acknowledged frames where at least one group handler failed.
    pub partial: usize,
    /// Number of poll cycles completed.
    pub polls: usize,
}

/// Handle to a background transport thread. Drop or call `stop()` to shut down.
pub struct TransportHandle {
    stop_tx: mpsc::Sender<()>,
    handle: Option<JoinHandle<TransportStats>>,
}

impl TransportHandle {
    /// Stop the transport and wait for it to finish. Returns stats.
    pub fn stop(mut self) -> TransportStats {
        let _ = self.stop_tx.send(());
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_default(),
            None => TransportStats::default(),
        }
    }

    /// Signal stop without waiting.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}

/// Poll `subscriber` on a background thread and consume every delivery.
///
/// Consumed frames are acked. Frames that fail routing or handling are
/// nacked with the error message; nothing is retried here.
///
/// ```ignore
/// let queue = InMemoryQueue::new();
/// let handle = consumer::subscribe(
///     Arc::new(consumer),
///     queue.new_subscriber(),
///     Duration::from_millis(10),
/// );
/// producer.queue("do.mail.send", json!({ "to": "a@b.com" }))?;
/// let stats = handle.stop();
/// ```
pub fn subscribe<S>(
    consumer: Arc<Consumer>,
    subscriber: S,
    poll_interval: Duration,
) -> TransportHandle
where
    S: Subscriber + 'static,
{
    let (stop_tx, stop_rx) = mpsc::channel();
    let timeout_ms = poll_interval.as_millis() as u64;

    let handle = thread::spawn(move || {
        let mut stats = TransportStats::default();
        info!(handlers = consumer.handlers().len(), "transport started");

        loop {
            match stop_rx.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }

            stats.polls += 1;

            let delivery = match subscriber.poll(timeout_ms) {
                Ok(Some(delivery)) => delivery,
                Ok(None) => continue,
                Err(err) => {
                    error!(error = %err, "poll failed");
                    continue;
                }
            };

            match consumer.consume(&delivery.frame) {
                Ok(outcome) => {
                    let failed = outcome.failed_group_handlers();
                    if !failed.is_empty() {
                        warn!(
                            tag = %delivery.tag,
                            routing_key = %outcome.target.routing_key,
                            failed = ?failed,
                            "group handlers failed"
                        );
                        stats.partial += 1;
                    }
                    if let Err(err) = subscriber.ack(&delivery.tag) {
                        error!(tag = %delivery.tag, error = %err, "ack failed");
                    }
                    stats.handled += 1;
                }
                Err(err) => {
                    warn!(
                        tag = %delivery.tag,
                        routing_key = %delivery.frame.routing_key,
                        error = %err,
                        fan_out = err.fan_out().len(),
                        "frame rejected"
                    );
                    if let Err(nack_err) = subscriber.nack(&delivery.tag, &err.to_string()) {
                        error!(tag = %delivery.tag, error = %nack_err, "nack failed");
                    }
                    stats.failed += 1;
                    if err.should_dead_letter() {
                        stats.dead_lettered += 1;
                    }
                }
            }
        }

        debug!(?stats, "transport stopped");
        stats
    });

    TransportHandle {
        stop_tx,
        handle: Some(handle),
    }
}
