//! # Vernet - In-Process Publish/Subscribe Fabric
//!
//! Vernet is a low-latency publish/subscribe fabric for fixed-size message
//! passing between threads in a single address space. Publishers push typed
//! 256-byte envelopes onto named topics; subscribers pop them from
//! per-subscriber FIFOs. It targets data-plane use (sensor fan-out, detector
//! pipelines, timesync distribution, request/response control loops) where
//! predictable latency matters more than delivery guarantees: the fan-out is
//! best-effort bounded-queue with overflow-drop.
//!
//! ## Features
//!
//! - **Wait-free hot path**: per-subscriber SPSC rings, no locks on push or
//!   pop in the single-publisher case
//! - **RCU membership snapshots**: subscribe/unsubscribe never block a
//!   publisher mid-fan-out
//! - **Wake-one notifiers**: polling or condition-variable, shareable across
//!   queues, with forced-timeout shutdown
//! - **Typed facades**: data-type agreement checked at registration
//! - **Observability**: reusable query records, log dumps, Graphviz export
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │                   Domain                       │
//! ├────────────────────────────────────────────────┤
//! │  Topic "/a"            │  Topic "/b"           │
//! │  - membership snapshot │  - membership snapshot│
//! │  - seqno counter       │  - seqno counter      │
//! └──────────┬─────────────┴──────────┬────────────┘
//!            ▼                        ▼
//! ┌─────────────────┐     ┌───────────────────────┐
//! │ SubQueue (SPSC) │ ... │   SubQueue (SPSC)     │
//! │ ring + notifier │     │   ring + notifier     │
//! └─────────────────┘     └───────────────────────┘
//! ```

// Core modules
pub mod domain;
pub mod envelope;
pub mod error;
pub mod notifier;
pub mod pubsub;
pub mod query;
pub mod queue;
pub mod ring;
pub mod strcache;
pub mod topic;

// Observability helpers
pub mod graph;

// Main API re-exports
pub use domain::Domain;
pub use envelope::{Envelope, SharedHandle, ENVELOPE_SIZE, PLAIN_SIZE};
pub use error::{Result, VernetError};
pub use graph::to_dot;
pub use notifier::{CondvarNotifier, Notifier, PollingNotifier};
pub use pubsub::{Publisher, Subscriber, TypedMessage};
pub use query::{DomainInfo, Filter, PubInfo, SubInfo, TopicInfo};
pub use queue::SubQueue;
pub use ring::SpscRing;
pub use topic::{PubHandle, Topic};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration constants
pub mod config {
    use std::time::Duration;

    /// Default subscriber queue capacity (envelopes)
    pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

    /// Default subscriber wait timeout
    pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(1);
}
