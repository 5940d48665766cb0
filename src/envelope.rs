//! Fixed-size message envelope
//!
//! Every message that moves through the fabric is a 256-byte envelope
//! (4 cache lines on most CPUs): sequence number, timestamp, an optional
//! reference-counted shared payload handle, and a plain byte area that user
//! types overlay with their own POD layouts.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bytemuck::Pod;

/// Total envelope size in bytes
pub const ENVELOPE_SIZE: usize = 256;

/// Reference-counted handle to an out-of-line payload.
///
/// Copying an envelope clones the handle (refcount up); dropping the copy
/// releases it. The fabric never looks inside the payload.
pub type SharedHandle = Arc<dyn Any + Send + Sync>;

/// Size of the plain byte area: whatever completes 256 bytes after the
/// seqno, timestamp and shared-handle fields.
pub const PLAIN_SIZE: usize =
    ENVELOPE_SIZE - 2 * std::mem::size_of::<u64>() - std::mem::size_of::<Option<SharedHandle>>();

/// Message envelope, value-copied through subscriber queues.
///
/// Field order is fixed so user types can overlay `plain` with their own
/// payload structs.
#[repr(C)]
#[derive(Clone)]
pub struct Envelope {
    /// Sequence number, assigned by the publishing topic
    pub seqno: u64,
    /// Timestamp in nanoseconds (caller-defined timebase)
    pub timestamp: u64,
    /// Optional shared payload; the only indirection in the envelope
    pub shared: Option<SharedHandle>,
    /// Plain payload area for user POD overlays
    pub plain: [u8; PLAIN_SIZE],
}

const _: () = assert!(std::mem::size_of::<Envelope>() == ENVELOPE_SIZE);

impl Envelope {
    /// Create an empty envelope (zero seqno/timestamp, no payload)
    pub fn new() -> Self {
        Self {
            seqno: 0,
            timestamp: 0,
            shared: None,
            plain: [0u8; PLAIN_SIZE],
        }
    }

    /// View the head of the plain area as a POD payload
    pub fn plain_as<P: Pod>(&self) -> &P {
        bytemuck::from_bytes(&self.plain[..std::mem::size_of::<P>()])
    }

    /// Mutable view of the head of the plain area as a POD payload
    pub fn plain_as_mut<P: Pod>(&mut self) -> &mut P {
        bytemuck::from_bytes_mut(&mut self.plain[..std::mem::size_of::<P>()])
    }

    /// Downcast the shared payload to a concrete type
    pub fn shared_as<P: Any + Send + Sync>(&self) -> Option<&P> {
        self.shared.as_ref()?.downcast_ref::<P>()
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("seqno", &self.seqno)
            .field("timestamp", &self.timestamp)
            .field("shared", &self.shared.is_some())
            .finish_non_exhaustive()
    }
}
