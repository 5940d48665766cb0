//! Per-subscriber queue
//!
//! Each subscriber owns one [`SubQueue`]: an SPSC ring of envelopes plus
//! push/drop counters, an optional wake-up notifier and a publisher-side
//! mutex. The ring is single-producer, so a topic with more than one
//! publisher serializes pushes through that mutex; the subscriber side is
//! always lock-free.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::envelope::Envelope;
use crate::error::Result;
use crate::notifier::Notifier;
use crate::ring::SpscRing;
use crate::strcache;

/// Subscriber queue: envelope FIFO with stats and notifier.
///
/// Created by `Topic::subscribe`, removed by `Topic::unsubscribe`. While the
/// queue is present in a published membership snapshot it is live and pinned
/// there by the snapshot's `Arc`.
pub struct SubQueue {
    fifo: SpscRing<Envelope>,
    drop_count: AtomicU32,
    push_count: AtomicU32,
    notifier: Option<Arc<dyn Notifier>>,

    name: String,
    topic_name: String,
    data_type: String,
    capacity: usize,

    /// Serializes producers when the topic has more than one publisher
    producer: Mutex<()>,

    /// Stable trace label handed to the logger
    trace_label: &'static str,
}

impl SubQueue {
    /// Create a subscriber queue.
    ///
    /// `capacity` is rounded up to at least one element. The notifier is
    /// externally owned; several queues may share one.
    pub fn new(
        name: &str,
        topic_name: &str,
        data_type: &str,
        capacity: usize,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Result<Self> {
        let capacity = capacity.max(1);
        let fifo = SpscRing::new(capacity)?;
        let trace_label = strcache::intern(&format!("vernet-pop {} {}", topic_name, name));

        Ok(Self {
            fifo,
            drop_count: AtomicU32::new(0),
            push_count: AtomicU32::new(0),
            notifier,
            name: name.to_string(),
            topic_name: topic_name.to_string(),
            data_type: data_type.to_string(),
            capacity,
            producer: Mutex::new(()),
            trace_label,
        })
    }

    /// Subscriber (queue) name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the topic this queue is subscribed to
    pub fn topic_name(&self) -> &str {
        &self.topic_name
    }

    /// Data type name of the topic
    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    /// Trace label for pop records
    pub fn trace_label(&self) -> &'static str {
        self.trace_label
    }

    /// Name of the bound notifier, or "none"
    pub fn notifier_name(&self) -> &str {
        self.notifier.as_ref().map(|n| n.name()).unwrap_or("none")
    }

    /// Queue capacity in envelopes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of queued envelopes. Approximate while traffic is in flight.
    pub fn len(&self) -> usize {
        self.capacity - self.fifo.write_available()
    }

    /// Whether the queue is empty. Approximate while traffic is in flight.
    pub fn is_empty(&self) -> bool {
        self.fifo.is_empty()
    }

    /// Number of push operations (including dropped ones)
    pub fn push_count(&self) -> u32 {
        self.push_count.load(Ordering::Relaxed)
    }

    /// Number of pushes discarded because the ring was full
    pub fn drop_count(&self) -> u32 {
        self.drop_count.load(Ordering::Relaxed)
    }

    /// Push a copy of `envelope` into the ring.
    ///
    /// Overflow silently discards the copy and bumps `drop_count`; the
    /// publisher is never failed. `need_lock` must be true when the owning
    /// topic currently has more than one publisher.
    pub fn push(&self, envelope: &Envelope, need_lock: bool) {
        let guard = if need_lock {
            Some(self.producer.lock().unwrap())
        } else {
            None
        };

        self.push_count.fetch_add(1, Ordering::Relaxed);
        if !self.fifo.push(envelope.clone()) {
            self.drop_count.fetch_add(1, Ordering::Relaxed);
        }

        drop(guard);
        self.kick();
    }

    /// Pop an envelope into `out`. Lock-free; false if the queue is empty.
    pub fn pop(&self, out: &mut Envelope) -> bool {
        match self.fifo.pop() {
            Some(envelope) => {
                *out = envelope;
                true
            }
            None => false,
        }
    }

    /// Wake the subscriber without pushing
    pub fn kick(&self) {
        if let Some(notifier) = &self.notifier {
            notifier.notify();
        }
    }

    /// Forward a shutdown (forced timeout) to the notifier
    pub fn shutdown(&self, timeout: Duration) {
        if let Some(notifier) = &self.notifier {
            notifier.shutdown(timeout);
        }
    }
}
