//! In-memory transport for tests and single-process use.

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use super::{Delivery, PublishError, Publisher, Subscribable, Subscriber};
use crate::frame::Frame;

/// In-memory transport implementing both [`Publisher`] and [`Subscriber`].
///
/// - Thread-safe (clones share state)
/// - Frames are stored in an append-only log
/// - Each subscriber from [`new_subscriber`](Subscribable::new_subscriber)
///   tracks its own read position
/// - Nacked deliveries are kept as dead letters with their reason
///
/// ## Example
///
/// ```
/// use queue_routing::bus::{InMemoryQueue, Publisher, Subscriber};
/// use queue_routing::Frame;
/// use serde_json::json;
///
/// let queue = InMemoryQueue::new();
/// queue.publish(Frame::worker("do.sms.send", json!({ "to": "+61" }))).unwrap();
///
/// let delivery = queue.poll(100).unwrap().unwrap();
/// assert_eq!(delivery.frame.routing_key, "worker");
/// queue.ack(&delivery.tag).unwrap();
/// ```
#[derive(Clone)]
pub struct InMemoryQueue {
    /// Shared frame log
    log: Arc<RwLock<Vec<Delivery>>>,
    /// Per-subscriber read position
    position: Arc<Mutex<usize>>,
    acked: Arc<Mutex<Vec<String>>>,
    /// Nacked tags with their reasons
    dead_letters: Arc<Mutex<Vec<(String, String)>>>,
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> PublishError {
    PublishError::ConnectionFailed("in-memory queue lock poisoned".into())
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self {
            log: Arc::new(RwLock::new(Vec::new())),
            position: Arc::new(Mutex::new(0)),
            acked: Arc::new(Mutex::new(Vec::new())),
            dead_letters: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// All frames published so far.
    pub fn frames(&self) -> Vec<Frame> {
        self.log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|d| d.frame.clone())
            .collect()
    }

    /// Wire routing keys in publish order.
    pub fn routing_keys(&self) -> Vec<String> {
        self.log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|d| d.frame.routing_key.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.log.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn current_position(&self) -> usize {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn acknowledged(&self) -> Vec<String> {
        self.acked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Nacked `(tag, reason)` pairs.
    pub fn dead_letters(&self) -> Vec<(String, String)> {
        self.dead_letters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clear all state (useful for test cleanup).
    pub fn clear(&self) {
        self.log
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        *self.position.lock().unwrap_or_else(PoisonError::into_inner) = 0;
        self.acked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.dead_letters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Publisher for InMemoryQueue {
    fn publish(&self, frame: Frame) -> Result<(), PublishError> {
        let mut log = self.log.write().map_err(poisoned)?;
        let tag = format!("d-{}", log.len() + 1);
        log.push(Delivery::new(tag, frame));
        Ok(())
    }
}

impl Subscriber for InMemoryQueue {
    fn poll(&self, timeout_ms: u64) -> Result<Option<Delivery>, PublishError> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);

        loop {
            {
                let log = self.log.read().map_err(poisoned)?;
                let mut pos = self.position.lock().map_err(poisoned)?;
                if *pos < log.len() {
                    let delivery = log[*pos].clone();
                    *pos += 1;
                    return Ok(Some(delivery));
                }
            }

            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn ack(&self, tag: &str) -> Result<(), PublishError> {
        self.acked.lock().map_err(poisoned)?.push(tag.to_string());
        Ok(())
    }

    fn nack(&self, tag: &str, reason: &str) -> Result<(), PublishError> {
        self.dead_letters
            .lock()
            .map_err(poisoned)?
            .push((tag.to_string(), reason.to_string()));
        Ok(())
    }
}

impl Subscribable for InMemoryQueue {
    fn new_subscriber(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
            position: Arc::new(Mutex::new(0)),
            acked: Arc::new(Mutex::new(Vec::new())),
            dead_letters: Arc::new(Mutex::new(Vec::new())),
        }
    }
}
