//! Topic: the fan-out core
//!
//! A topic owns its subscriber queues and publisher handles through an
//! RCU-style membership snapshot (the *cache*). The push hot path pins the
//! current snapshot with an atomic refcount, fans the envelope out to every
//! subscriber queue, and releases the pin; membership changes copy the
//! snapshot, mutate the copy, swap it in atomically and busy-wait for the
//! readers of the old snapshot to depart before freeing it. Readers hold a
//! snapshot only across a single fan-out iteration, so the drain is bounded.

use std::sync::atomic::{AtomicPtr, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use log::{debug, info, trace};

use crate::envelope::Envelope;
use crate::error::Result;
use crate::notifier::Notifier;
use crate::query::TopicInfo;
use crate::queue::SubQueue;
use crate::strcache;

/// Publisher registration token.
///
/// Carries no queue state; identity (by `Arc` pointer) is what the caller
/// surrenders at unpublish.
#[derive(Debug)]
pub struct PubHandle {
    name: String,
    topic_name: String,
    trace_label: &'static str,
}

impl PubHandle {
    fn new(name: &str, topic_name: &str) -> Self {
        let trace_label = strcache::intern(&format!("vernet-push {} {}", topic_name, name));
        Self {
            name: name.to_string(),
            topic_name: topic_name.to_string(),
            trace_label,
        }
    }

    /// Publisher name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the topic this handle publishes
    pub fn topic_name(&self) -> &str {
        &self.topic_name
    }

    /// Trace label for push records
    pub fn trace_label(&self) -> &'static str {
        self.trace_label
    }
}

/// Immutable membership snapshot: ordered subscriber queues and publisher
/// handles. Exactly one cache is live at any moment.
#[derive(Default)]
struct Cache {
    subs: Vec<Arc<SubQueue>>,
    pubs: Vec<Arc<PubHandle>>,
}

impl Cache {
    fn copy(&self) -> Box<Cache> {
        Box::new(Cache {
            subs: self.subs.clone(),
            pubs: self.pubs.clone(),
        })
    }
}

/// Named channel with a fixed data type, an ordered publisher set and an
/// ordered subscriber set.
///
/// Topics are created by `Domain::create_topic` and live as long as the
/// domain.
#[derive(Debug)]
pub struct Topic {
    domain_name: String,
    name: String,
    data_type: String,

    /// Sequence number for the next push
    next_seqno: AtomicU64,

    /// Current membership snapshot
    cache_ptr: AtomicPtr<Cache>,
    /// Readers currently holding the snapshot
    cache_refcnt: AtomicU32,
    /// Excludes concurrent membership writers; read side covers dump/query
    membership: RwLock<()>,
}

impl Topic {
    /// Create a topic. Normally called through `Domain::create_topic`.
    pub fn new(domain_name: &str, name: &str, data_type: &str) -> Self {
        Self {
            domain_name: domain_name.to_string(),
            name: name.to_string(),
            data_type: data_type.to_string(),
            next_seqno: AtomicU64::new(0),
            cache_ptr: AtomicPtr::new(Box::into_raw(Box::new(Cache::default()))),
            cache_refcnt: AtomicU32::new(0),
            membership: RwLock::new(()),
        }
    }

    /// Domain name this topic belongs to
    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    /// Topic name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Data type name, fixed for the topic lifetime
    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    /// Total number of pushes so far (the next seqno to be assigned)
    pub fn push_count(&self) -> u64 {
        self.next_seqno.load(Ordering::Relaxed)
    }

    /// Pin the current snapshot for a fan-out iteration.
    ///
    /// Invariant: every `cache_get` is paired with exactly one `cache_put`
    /// on the same thread, with no blocking in between.
    fn cache_get(&self) -> &Cache {
        self.cache_refcnt.fetch_add(1, Ordering::Acquire);
        unsafe { &*self.cache_ptr.load(Ordering::Acquire) }
    }

    /// Release a pinned snapshot
    fn cache_put(&self) {
        self.cache_refcnt.fetch_sub(1, Ordering::Release);
    }

    /// Copy the current snapshot. Caller must hold the membership write lock.
    fn cache_copy(&self) -> Box<Cache> {
        unsafe { &*self.cache_ptr.load(Ordering::Acquire) }.copy()
    }

    /// Swap in a new snapshot and retire the old one.
    ///
    /// Caller must hold the membership write lock. New pushes use the new
    /// snapshot as soon as the exchange lands; the old one is freed once its
    /// reader count drains to zero.
    fn cache_swap(&self, new: Box<Cache>) {
        let new_ptr = Box::into_raw(new);
        let old_ptr = self.cache_ptr.swap(new_ptr, Ordering::AcqRel);

        debug!("{} swapped cache: {:p} to {:p}", self.name, old_ptr, new_ptr);

        while self.cache_refcnt.load(Ordering::Acquire) != 0 {
            std::hint::spin_loop();
        }

        debug!("{} deleting old cache: {:p}", self.name, old_ptr);
        drop(unsafe { Box::from_raw(old_ptr) });
    }

    /// Subscribe to this topic.
    ///
    /// Creates a subscriber queue of `qsize` envelopes, optionally bound to
    /// a shared notifier, and publishes the new membership. Fails only on
    /// queue allocation failure.
    pub fn subscribe(
        &self,
        name: &str,
        qsize: usize,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Result<Arc<SubQueue>> {
        let queue = Arc::new(SubQueue::new(
            name,
            &self.name,
            &self.data_type,
            qsize,
            notifier,
        )?);

        let _guard = self.membership.write().unwrap();
        let mut cache = self.cache_copy();
        cache.subs.push(queue.clone());
        debug!(
            "{} add-sub: {} qcap {} notifier {}",
            self.name,
            queue.name(),
            queue.capacity(),
            queue.notifier_name()
        );
        self.cache_swap(cache);

        Ok(queue)
    }

    /// Unsubscribe a queue from this topic.
    ///
    /// After this returns, no push can reach the queue: the membership swap
    /// has drained every fan-out that was in flight through the old
    /// snapshot.
    pub fn unsubscribe(&self, queue: &Arc<SubQueue>) {
        let _guard = self.membership.write().unwrap();
        let mut cache = self.cache_copy();
        cache.subs.retain(|q| !Arc::ptr_eq(q, queue));
        debug!("{} del-sub: {}", self.name, queue.name());
        self.cache_swap(cache);
    }

    /// Register a publisher on this topic
    pub fn publish(&self, name: &str) -> Arc<PubHandle> {
        let handle = Arc::new(PubHandle::new(name, &self.name));

        let _guard = self.membership.write().unwrap();
        let mut cache = self.cache_copy();
        cache.pubs.push(handle.clone());
        debug!("{} add-pub: {}", self.name, handle.name());
        self.cache_swap(cache);

        handle
    }

    /// Remove a publisher registration
    pub fn unpublish(&self, handle: &Arc<PubHandle>) {
        let _guard = self.membership.write().unwrap();
        let mut cache = self.cache_copy();
        cache.pubs.retain(|p| !Arc::ptr_eq(p, handle));
        debug!("{} del-pub: {}", self.name, handle.name());
        self.cache_swap(cache);
    }

    /// Push an envelope to all subscribers.
    ///
    /// Stamps the sequence number, pins the membership snapshot and pushes a
    /// copy of the envelope into every subscriber queue (cloning the shared
    /// handle once per subscriber). Never fails: overflow is dropped and
    /// counted per queue.
    ///
    /// Pushes are serialized per queue only when the pinned snapshot shows
    /// more than one publisher; a publisher whose push is in flight through
    /// an already-retired snapshot keeps paying the lock cost until that
    /// snapshot drains, which is benign.
    pub fn push(&self, handle: &PubHandle, envelope: &mut Envelope) {
        envelope.seqno = self.next_seqno.fetch_add(1, Ordering::Relaxed);

        let cache = self.cache_get();

        trace!(
            "{} seqno {} timestamp {} nsubs {} npubs {}",
            handle.trace_label(),
            envelope.seqno,
            envelope.timestamp,
            cache.subs.len(),
            cache.pubs.len()
        );

        let need_lock = cache.pubs.len() > 1;
        for queue in &cache.subs {
            queue.push(envelope, need_lock);
        }

        self.cache_put();
    }

    /// Pop an envelope for a subscriber queue; false if the queue is empty
    pub fn pop(&self, queue: &SubQueue, envelope: &mut Envelope) -> bool {
        if !queue.pop(envelope) {
            return false;
        }
        trace!(
            "{} seqno {} timestamp {}",
            queue.trace_label(),
            envelope.seqno,
            envelope.timestamp
        );
        true
    }

    /// Wake every subscriber without pushing
    pub fn kick(&self) {
        let _guard = self.membership.read().unwrap();
        let cache = unsafe { &*self.cache_ptr.load(Ordering::Acquire) };
        for queue in &cache.subs {
            queue.kick();
        }
    }

    /// Wake every subscriber and force `timeout` onto subsequent waits
    pub fn shutdown(&self, timeout: Duration) {
        let _guard = self.membership.read().unwrap();
        let cache = unsafe { &*self.cache_ptr.load(Ordering::Acquire) };
        for queue in &cache.subs {
            queue.shutdown(timeout);
        }
    }

    /// Dump topic state (subs, pubs, counters) to the log
    pub fn dump(&self) {
        let _guard = self.membership.read().unwrap();
        let cache = unsafe { &*self.cache_ptr.load(Ordering::Acquire) };

        info!(
            "{} nsubs {} npubs {} seqno {}",
            self.name,
            cache.subs.len(),
            cache.pubs.len(),
            self.next_seqno.load(Ordering::Relaxed)
        );
        for queue in &cache.subs {
            info!(
                "{} sub {} qcap {} qsize {} notifier {} pushes {} drops {}",
                self.name,
                queue.name(),
                queue.capacity(),
                queue.len(),
                queue.notifier_name(),
                queue.push_count(),
                queue.drop_count()
            );
        }
        for handle in &cache.pubs {
            info!("{} pub {}", self.name, handle.name());
        }
    }

    /// Fill a caller-owned topic record.
    ///
    /// Queue sizes are snapshots; see `SubQueue::len`.
    pub fn query(&self, info: &mut TopicInfo) {
        let _guard = self.membership.read().unwrap();
        let cache = unsafe { &*self.cache_ptr.load(Ordering::Acquire) };

        info.name.clear();
        info.name.push_str(&self.name);
        info.data_type.clear();
        info.data_type.push_str(&self.data_type);
        info.push_count = self.next_seqno.load(Ordering::Relaxed);

        info.subs.clear();
        for queue in &cache.subs {
            info.subs.push(crate::query::SubInfo {
                name: queue.name().to_string(),
                push_count: queue.push_count(),
                drop_count: queue.drop_count(),
                qcapacity: queue.capacity() as u32,
                qsize: queue.len() as u32,
            });
        }

        info.pubs.clear();
        for handle in &cache.pubs {
            info.pubs.push(crate::query::PubInfo {
                name: handle.name().to_string(),
            });
        }
    }
}

impl Drop for Topic {
    fn drop(&mut self) {
        // No readers can exist here: dropping the topic means no handles
        // remain that could be mid-push.
        let ptr = self.cache_ptr.load(Ordering::Acquire);
        drop(unsafe { Box::from_raw(ptr) });
    }
}
