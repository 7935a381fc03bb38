#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `events` delivers readiness notifications for the gzstream adapters under a
//! single-threaded cooperative scheduling model. A [`RunLoop`] owns a registry
//! of scheduled streams together with their observers, performs one unit of
//! work per ready stream on each cycle, and hands the resulting
//! [`StreamEvent`]s to the paired [`StreamObserver`].
//!
//! # Design
//!
//! - Streams implement [`RunLoopSource`]. Each call to
//!   [`RunLoopSource::perform`] does a bounded amount of work and reports
//!   whether another turn is immediately useful ([`Turn::Again`]) or whether the
//!   stream should wait for an external readiness signal ([`Turn::Idle`]).
//! - Observers are stored beside their stream inside the run loop registry and
//!   are addressed through a typed [`Token`]. Streams never own their
//!   observer; detaching happens through [`RunLoop::unschedule`].
//! - Work arriving on other threads is announced through a [`WakeHandle`],
//!   which only sends the stream's [`SourceId`] over a channel. The run loop
//!   drains that channel at the start of every cycle, so foreign threads never
//!   touch the scheduling queue.
//!
//! # Invariants
//!
//! - A source is queued at most once per cycle regardless of how many wakes
//!   were posted for it.
//! - Events produced by one turn are delivered before the next turn of the
//!   same source starts.
//! - Wakes addressed to a source that has since been unscheduled are dropped.
//!
//! # Examples
//!
//! ```
//! use events::{EventNotifier, RunLoop, RunLoopSource, StreamEvent, StreamObserver, Turn, WakeHandle};
//!
//! struct Countdown {
//!     remaining: u32,
//!     notifier: EventNotifier<()>,
//! }
//!
//! impl RunLoopSource for Countdown {
//!     type Error = ();
//!
//!     fn perform(&mut self) -> Turn {
//!         if self.remaining == 0 {
//!             self.notifier.post(StreamEvent::EndEncountered);
//!             return Turn::Idle;
//!         }
//!         self.remaining -= 1;
//!         self.notifier.post(StreamEvent::HasBytesAvailable);
//!         Turn::Again
//!     }
//!
//!     fn attach_waker(&mut self, waker: WakeHandle) {
//!         self.notifier.attach_waker(waker);
//!     }
//!
//!     fn take_events(&mut self) -> Vec<StreamEvent<()>> {
//!         self.notifier.take_pending()
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Tally {
//!     readable: u32,
//!     ended: bool,
//! }
//!
//! impl StreamObserver<Countdown> for Tally {
//!     fn on_readable(&mut self, _stream: &mut Countdown) {
//!         self.readable += 1;
//!     }
//!
//!     fn on_end(&mut self, _stream: &mut Countdown) {
//!         self.ended = true;
//!     }
//! }
//!
//! let mut run_loop = RunLoop::new();
//! let source = Countdown { remaining: 3, notifier: EventNotifier::new() };
//! let token = run_loop.schedule(source, Tally::default());
//! run_loop.run_until_idle();
//!
//! let (_source, tally) = run_loop.unschedule(token).expect("still scheduled");
//! assert_eq!(tally.readable, 3);
//! assert!(tally.ended);
//! ```

mod event;
mod notifier;
mod observer;
mod run_loop;
mod wake;

pub use event::StreamEvent;
pub use notifier::{EventNotifier, NotifierState};
pub use observer::{FnObserver, StreamObserver, deliver};
pub use run_loop::{RunLoop, RunLoopSource, Token, Turn};
pub use wake::{SourceId, WakeHandle};
