//! crates/events/src/notifier.rs
//!
//! Per-adapter event queue and scheduling state.

use std::collections::VecDeque;

use logging::trace_events;

use crate::event::StreamEvent;
use crate::wake::WakeHandle;

/// Scheduling state of one adapter's notifier.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NotifierState {
    /// No work in progress and no readiness awaited.
    #[default]
    Idle,
    /// Waiting for the upstream transport to offer bytes.
    WaitingForTransportReadable,
    /// Waiting for the downstream transport to accept bytes.
    WaitingForTransportWritable,
    /// Events from the last unit of work are being handed to the observer.
    Delivering,
}

/// Queue of pending readiness events for one adapter.
///
/// Readiness events (`HasBytesAvailable`, `HasSpaceAvailable`) are coalesced
/// while pending. `OpenCompleted`, `EndEncountered` and `ErrorOccurred` are
/// posted at most once over the notifier's lifetime, and nothing except an
/// error is accepted after the end has been posted.
#[derive(Debug)]
pub struct EventNotifier<E> {
    state: NotifierState,
    pending: VecDeque<StreamEvent<E>>,
    waker: Option<WakeHandle>,
    opened: bool,
    ended: bool,
    failed: bool,
}

impl<E> Default for EventNotifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventNotifier<E> {
    /// Creates an idle notifier with no attached run loop.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: NotifierState::Idle,
            pending: VecDeque::new(),
            waker: None,
            opened: false,
            ended: false,
            failed: false,
        }
    }

    /// Returns the current scheduling state.
    #[must_use]
    pub const fn state(&self) -> NotifierState {
        self.state
    }

    /// Moves the notifier to `state`.
    pub fn set_state(&mut self, state: NotifierState) {
        if self.state != state {
            trace_events!(from = ?self.state, to = ?state, "notifier state change");
            self.state = state;
        }
    }

    /// Queues `event` for delivery, returning whether it was accepted.
    pub fn post(&mut self, event: StreamEvent<E>) -> bool {
        if self.failed {
            return false;
        }
        let accepted = match &event {
            StreamEvent::OpenCompleted => !std::mem::replace(&mut self.opened, true),
            StreamEvent::EndEncountered => !std::mem::replace(&mut self.ended, true),
            StreamEvent::ErrorOccurred(_) => {
                self.failed = true;
                true
            }
            StreamEvent::HasBytesAvailable | StreamEvent::HasSpaceAvailable => {
                !self.ended && !self.pending.iter().any(|pending| pending.same_kind(&event))
            }
        };
        if accepted {
            trace_events!(event = event.name(), "event posted");
            self.pending.push_back(event);
        }
        accepted
    }

    /// Reports whether events are waiting for delivery.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Removes and returns every pending event in posting order.
    ///
    /// The notifier enters [`NotifierState::Delivering`] when anything was
    /// pending.
    pub fn take_pending(&mut self) -> Vec<StreamEvent<E>> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        self.set_state(NotifierState::Delivering);
        self.pending.drain(..).collect()
    }

    /// Discards pending events without delivering them.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.set_state(NotifierState::Idle);
    }

    /// Reports whether an end or error has already been posted.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.ended || self.failed
    }

    /// Attaches the run loop wake handle used by [`EventNotifier::wake`].
    pub fn attach_waker(&mut self, waker: WakeHandle) {
        self.waker = Some(waker);
    }

    /// Detaches the run loop, returning the previous handle.
    pub fn detach_waker(&mut self) -> Option<WakeHandle> {
        self.set_state(NotifierState::Idle);
        self.waker.take()
    }

    /// Returns the attached wake handle, if scheduled.
    #[must_use]
    pub const fn waker(&self) -> Option<&WakeHandle> {
        self.waker.as_ref()
    }

    /// Requests another turn from the owning run loop.
    ///
    /// Returns `false` when the notifier is not scheduled.
    pub fn wake(&self) -> bool {
        self.waker.as_ref().is_some_and(WakeHandle::wake)
    }
}
