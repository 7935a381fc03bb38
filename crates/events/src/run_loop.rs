//! crates/events/src/run_loop.rs
//!
//! Single-threaded cooperative scheduler for stream adapters.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::marker::PhantomData;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use logging::trace_events;

use crate::event::StreamEvent;
use crate::observer::{StreamObserver, deliver};
use crate::wake::{SourceId, WakeHandle};

/// Outcome of one unit of work performed by a [`RunLoopSource`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Turn {
    /// More work is immediately possible; schedule another turn.
    Again,
    /// Nothing more can happen until an external readiness signal arrives.
    Idle,
}

/// A stream that can be driven by a [`RunLoop`].
pub trait RunLoopSource {
    /// Error payload carried by [`StreamEvent::ErrorOccurred`].
    type Error;

    /// Performs one bounded unit of work and queues the resulting events.
    fn perform(&mut self) -> Turn;

    /// Stores the handle the source uses to request further turns.
    fn attach_waker(&mut self, waker: WakeHandle);

    /// Drops the stored handle when the source leaves its run loop.
    fn detach_waker(&mut self) {}

    /// Removes the events queued by previous turns.
    fn take_events(&mut self) -> Vec<StreamEvent<Self::Error>>;
}

trait Scheduled {
    fn turn(&mut self) -> Turn;
    fn detach(&mut self);
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

struct Registration<S, O> {
    source: S,
    observer: O,
}

impl<S, O> Scheduled for Registration<S, O>
where
    S: RunLoopSource + 'static,
    O: StreamObserver<S> + 'static,
{
    fn turn(&mut self) -> Turn {
        let turn = self.source.perform();
        for event in self.source.take_events() {
            deliver(&mut self.observer, &mut self.source, &event);
        }
        turn
    }

    fn detach(&mut self) {
        self.source.detach_waker();
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Typed handle to a registration inside a [`RunLoop`].
pub struct Token<S, O> {
    id: SourceId,
    _marker: PhantomData<fn() -> (S, O)>,
}

impl<S, O> Token<S, O> {
    /// Returns the identifier of the registration.
    #[must_use]
    pub const fn id(&self) -> SourceId {
        self.id
    }
}

impl<S, O> Clone for Token<S, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, O> Copy for Token<S, O> {}

impl<S, O> fmt::Debug for Token<S, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Token").field(&self.id).finish()
    }
}

struct Slot {
    generation: u32,
    queued: bool,
    entry: Option<Box<dyn Scheduled>>,
}

/// Cooperative scheduler owning a registry of streams and their observers.
///
/// The run loop never spawns threads. Each cycle first drains wakes posted
/// through [`WakeHandle`]s, then gives every queued source exactly one turn.
/// A source that answers [`Turn::Again`] is queued for the next cycle; one
/// that answers [`Turn::Idle`] stays parked until it is woken.
pub struct RunLoop {
    slots: Vec<Slot>,
    ready: VecDeque<SourceId>,
    sender: Sender<SourceId>,
    receiver: Receiver<SourceId>,
}

impl Default for RunLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RunLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunLoop")
            .field("sources", &self.len())
            .field("ready", &self.ready.len())
            .finish()
    }
}

impl RunLoop {
    /// Creates an empty run loop.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            slots: Vec::new(),
            ready: VecDeque::new(),
            sender,
            receiver,
        }
    }

    /// Registers `source` with `observer` and queues its first turn.
    ///
    /// The source receives a [`WakeHandle`] through
    /// [`RunLoopSource::attach_waker`] before this returns.
    pub fn schedule<S, O>(&mut self, mut source: S, observer: O) -> Token<S, O>
    where
        S: RunLoopSource + 'static,
        O: StreamObserver<S> + 'static,
    {
        let index = match self.slots.iter().position(|slot| slot.entry.is_none()) {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    queued: false,
                    entry: None,
                });
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        slot.generation = slot.generation.wrapping_add(1);
        let id = SourceId::new(index as u32, slot.generation);
        source.attach_waker(WakeHandle::new(id, self.sender.clone()));
        slot.entry = Some(Box::new(Registration { source, observer }));
        slot.queued = true;
        self.ready.push_back(id);
        trace_events!(source = %id, "source scheduled");
        Token {
            id,
            _marker: PhantomData,
        }
    }

    /// Removes a registration, returning its source and observer.
    ///
    /// Returns `None` when the token no longer refers to a live registration.
    pub fn unschedule<S, O>(&mut self, token: Token<S, O>) -> Option<(S, O)>
    where
        S: RunLoopSource + 'static,
        O: StreamObserver<S> + 'static,
    {
        let slot = self.live_slot(token.id)?;
        if !slot
            .entry
            .as_mut()
            .is_some_and(|entry| entry.as_any_mut().is::<Registration<S, O>>())
        {
            return None;
        }
        let mut entry = slot.entry.take()?;
        slot.queued = false;
        entry.detach();
        trace_events!(source = %token.id, "source unscheduled");
        entry
            .into_any()
            .downcast::<Registration<S, O>>()
            .ok()
            .map(|registration| (registration.source, registration.observer))
    }

    /// Runs `f` with mutable access to a registered source and its observer.
    ///
    /// Any work `f` causes is picked up on the next cycle when the source
    /// wakes itself.
    pub fn with_source<S, O, R>(
        &mut self,
        token: &Token<S, O>,
        f: impl FnOnce(&mut S, &mut O) -> R,
    ) -> Option<R>
    where
        S: RunLoopSource + 'static,
        O: StreamObserver<S> + 'static,
    {
        let slot = self.live_slot(token.id)?;
        let registration = slot
            .entry
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<Registration<S, O>>()?;
        Some(f(&mut registration.source, &mut registration.observer))
    }

    /// Returns a fresh wake handle for a registered source.
    #[must_use]
    pub fn wake_handle<S, O>(&self, token: &Token<S, O>) -> Option<WakeHandle> {
        let slot = self.slots.get(token.id.index())?;
        (slot.generation == token.id.generation() && slot.entry.is_some())
            .then(|| WakeHandle::new(token.id, self.sender.clone()))
    }

    /// Number of live registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.entry.is_some()).count()
    }

    /// Reports whether no source is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reports whether no source is queued and no wake is pending.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.ready.is_empty() && self.receiver.is_empty()
    }

    /// Runs one cycle, returning the number of turns performed.
    pub fn run_once(&mut self) -> usize {
        self.drain_wakes();
        let batch: Vec<SourceId> = self.ready.drain(..).collect();
        let mut turns = 0;
        for id in batch {
            let Some(slot) = self.live_slot(id) else {
                continue;
            };
            slot.queued = false;
            let Some(entry) = slot.entry.as_mut() else {
                continue;
            };
            let turn = entry.turn();
            turns += 1;
            if turn == Turn::Again {
                self.enqueue(id);
            }
        }
        turns
    }

    /// Runs cycles until no source is queued and no wake is pending.
    ///
    /// Returns the total number of turns performed.
    pub fn run_until_idle(&mut self) -> usize {
        let mut turns = 0;
        loop {
            self.drain_wakes();
            if self.ready.is_empty() {
                return turns;
            }
            turns += self.run_once();
        }
    }

    /// Runs cycles until `done` reports `true` or `timeout` elapses.
    ///
    /// When nothing is queued the calling thread blocks on the wake channel,
    /// which lets producers on other threads drive the loop. Returns whether
    /// `done` was satisfied.
    pub fn run_until(&mut self, timeout: Duration, mut done: impl FnMut(&mut Self) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.run_until_idle();
            if done(self) {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match self.receiver.recv_timeout(remaining) {
                Ok(id) => self.enqueue(id),
                Err(RecvTimeoutError::Timeout) => return done(self),
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
    }

    fn drain_wakes(&mut self) {
        while let Ok(id) = self.receiver.try_recv() {
            self.enqueue(id);
        }
    }

    fn enqueue(&mut self, id: SourceId) {
        if let Some(slot) = self.live_slot(id) {
            if !slot.queued {
                slot.queued = true;
                self.ready.push_back(id);
            }
        }
    }

    fn live_slot(&mut self, id: SourceId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation() && slot.entry.is_some())
    }
}
