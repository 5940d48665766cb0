//! Typed publisher and subscriber facades
//!
//! The main user-facing interface. A typed message embeds an [`Envelope`]
//! and declares its data type name; the facades create (or join) the topic
//! with that type name, register with it, and pass envelopes through. A
//! data-type collision on the topic name surfaces as a construction error.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::domain::Domain;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::notifier::Notifier;
use crate::queue::SubQueue;
use crate::topic::{PubHandle, Topic};

/// A fixed-size message that travels through the fabric.
///
/// Implementors embed an [`Envelope`] and overlay its `plain` area with
/// their own POD payload (see `Envelope::plain_as`). `DATA_TYPE` must be
/// unique per message type; it is checked against the topic registration.
pub trait TypedMessage: Send + 'static {
    /// Unique data type name, validated at topic creation
    const DATA_TYPE: &'static str;

    /// The backing envelope
    fn envelope(&self) -> &Envelope;

    /// Mutable access to the backing envelope
    fn envelope_mut(&mut self) -> &mut Envelope;
}

/// Typed publisher.
///
/// Creates the topic (or joins the existing one) and registers as a
/// publisher at construction; unregisters on drop.
pub struct Publisher<M: TypedMessage> {
    topic: Arc<Topic>,
    handle: Arc<PubHandle>,
    _marker: PhantomData<M>,
}

impl<M: TypedMessage> Publisher<M> {
    /// Create a publisher on `topic_name` in `domain`.
    ///
    /// Fails if the topic exists with a different data type.
    pub fn new(domain: &Domain, name: &str, topic_name: &str) -> Result<Self> {
        let topic = domain.create_topic(topic_name, M::DATA_TYPE)?;
        let handle = topic.publish(name);
        Ok(Self {
            topic,
            handle,
            _marker: PhantomData,
        })
    }

    /// Publisher name
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// Data type name of the topic
    pub fn data_type(&self) -> &str {
        self.topic.data_type()
    }

    /// The underlying topic
    pub fn topic(&self) -> &Arc<Topic> {
        &self.topic
    }

    /// Push a message to all subscribers of the topic.
    ///
    /// The message's seqno is stamped by the topic; set the timestamp
    /// before pushing.
    pub fn push(&self, message: &mut M) {
        self.topic.push(&self.handle, message.envelope_mut());
    }
}

impl<M: TypedMessage> Drop for Publisher<M> {
    fn drop(&mut self) {
        self.topic.unpublish(&self.handle);
    }
}

/// Typed subscriber.
///
/// Creates the topic (or joins the existing one) and subscribes at
/// construction; unsubscribes on drop.
pub struct Subscriber<M: TypedMessage> {
    topic: Arc<Topic>,
    queue: Arc<SubQueue>,
    _marker: PhantomData<M>,
}

impl<M: TypedMessage> Subscriber<M> {
    /// Create a subscriber on `topic_name` in `domain` with a queue of
    /// `qsize` envelopes, optionally bound to a shared notifier.
    ///
    /// Fails if the topic exists with a different data type.
    pub fn new(
        domain: &Domain,
        name: &str,
        topic_name: &str,
        qsize: usize,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Result<Self> {
        let topic = domain.create_topic(topic_name, M::DATA_TYPE)?;
        let queue = topic.subscribe(name, qsize, notifier)?;
        Ok(Self {
            topic,
            queue,
            _marker: PhantomData,
        })
    }

    /// Subscriber name
    pub fn name(&self) -> &str {
        self.queue.name()
    }

    /// Data type name of the topic
    pub fn data_type(&self) -> &str {
        self.queue.data_type()
    }

    /// The underlying subscriber queue
    pub fn queue(&self) -> &Arc<SubQueue> {
        &self.queue
    }

    /// The underlying topic
    pub fn topic(&self) -> &Arc<Topic> {
        &self.topic
    }

    /// Pop the next message into `message`; false if the queue is empty
    pub fn pop(&self, message: &mut M) -> bool {
        self.topic.pop(&self.queue, message.envelope_mut())
    }

    /// Drain all queued messages
    pub fn flush(&self) {
        let mut envelope = Envelope::new();
        while self.topic.pop(&self.queue, &mut envelope) {}
    }
}

impl<M: TypedMessage> Drop for Subscriber<M> {
    fn drop(&mut self) {
        self.topic.unsubscribe(&self.queue);
    }
}
