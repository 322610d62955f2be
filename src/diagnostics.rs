//! Diagnostic channel
//!
//! Ordered log of non-fatal anomalies collected during a single conversion
//! run. Unsupported or unrecognized content is downgraded to a diagnostic
//! here rather than raised as an error, so conversion always produces the
//! best-effort partial output it can.
//!
//! The channel is an explicit value threaded through the call chain (not
//! process-wide state) and is cleared at every top-level converter entry
//! point so runs do not leak diagnostics into each other.

use tracing::warn;

/// Ordered collection of human-readable diagnostic messages.
#[derive(Debug, Default)]
pub struct Diagnostics {
    messages: Vec<String>,
}

impl Diagnostics {
    /// Create an empty diagnostic channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the channel.
    ///
    /// The message is mirrored to `tracing` at WARN level.
    pub fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.messages.push(message);
    }

    /// All messages logged so far, in order.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Discard all collected messages.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }
}
