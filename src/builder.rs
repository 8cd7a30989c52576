//! Fluent builder for Runtime construction.

use crate::runtime::Runtime;

/// Builder for constructing [`Runtime`] instances with a fluent API.
///
/// # Example
/// ```ignore
/// let rt = RuntimeBuilder::new().event_capacity(256).build();
/// ```
pub struct RuntimeBuilder {
    event_capacity: usize,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self { event_capacity: 64 }
    }

    /// Sets how many readiness events one reactor poll can deliver at once.
    ///
    /// More armed descriptors than this still work; excess events are
    /// simply delivered on the next poll.
    pub fn event_capacity(mut self, event_capacity: usize) -> Self {
        self.event_capacity = event_capacity;
        self
    }

    /// Builds the configured [`Runtime`].
    pub fn build(self) -> Runtime {
        Runtime::with_event_capacity(self.event_capacity)
    }
}
