//! crates/events/src/wake.rs
//!
//! Cross-thread wake signal for run loop sources.

use std::fmt;

use crossbeam_channel::Sender;

/// Identifies one registration inside a [`RunLoop`](crate::RunLoop).
///
/// The generation distinguishes a reused registry slot from the registration
/// that previously occupied it, so stale wakes are ignored.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SourceId {
    index: u32,
    generation: u32,
}

impl SourceId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub(crate) const fn index(self) -> usize {
        self.index as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source#{}.{}", self.index, self.generation)
    }
}

/// Posts readiness for one scheduled source from any thread.
///
/// A wake only enqueues the source identifier on the run loop's channel; the
/// owning thread picks it up on its next cycle. Waking a source that is no
/// longer scheduled, or whose run loop has been dropped, is a no-op.
#[derive(Clone)]
pub struct WakeHandle {
    id: SourceId,
    sender: Sender<SourceId>,
}

impl WakeHandle {
    pub(crate) const fn new(id: SourceId, sender: Sender<SourceId>) -> Self {
        Self { id, sender }
    }

    /// Requests another turn for the associated source.
    ///
    /// Returns `false` when the run loop no longer exists.
    pub fn wake(&self) -> bool {
        self.sender.send(self.id).is_ok()
    }

    /// Returns the identifier of the source this handle wakes.
    #[must_use]
    pub const fn source(&self) -> SourceId {
        self.id
    }
}

impl fmt::Debug for WakeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WakeHandle").field("source", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wake_sends_source_id() {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let handle = WakeHandle::new(SourceId::new(3, 1), sender);
        assert!(handle.wake());
        assert_eq!(receiver.try_recv().expect("wake queued"), SourceId::new(3, 1));
    }

    #[test]
    fn wake_after_receiver_dropped_reports_false() {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let handle = WakeHandle::new(SourceId::new(0, 0), sender);
        drop(receiver);
        assert!(!handle.wake());
    }

    #[test]
    fn wake_from_another_thread() {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let handle = WakeHandle::new(SourceId::new(5, 2), sender);
        let worker = std::thread::spawn(move || handle.wake());
        assert!(worker.join().expect("worker thread"));
        assert_eq!(receiver.recv().expect("wake"), SourceId::new(5, 2));
    }
}
