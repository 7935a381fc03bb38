//! crates/events/src/observer.rs
//!
//! Observer callbacks and event dispatch.

use crate::event::StreamEvent;
use crate::run_loop::RunLoopSource;

/// Receives readiness callbacks for a scheduled stream.
///
/// Every callback gets mutable access to the stream so the observer can read
/// or write in response. All methods default to doing nothing.
pub trait StreamObserver<S>
where
    S: RunLoopSource + ?Sized,
{
    /// The stream finished opening.
    fn on_open(&mut self, _stream: &mut S) {}

    /// Plain bytes are ready to be read.
    fn on_readable(&mut self, _stream: &mut S) {}

    /// The stream can accept more bytes.
    fn on_writable(&mut self, _stream: &mut S) {}

    /// The stream reached its logical end.
    fn on_end(&mut self, _stream: &mut S) {}

    /// The stream failed with `error`.
    fn on_error(&mut self, _stream: &mut S, _error: &S::Error) {}
}

impl<S> StreamObserver<S> for () where S: RunLoopSource + ?Sized {}

/// Adapts a closure taking every event into a [`StreamObserver`].
pub struct FnObserver<F>(pub F);

impl<S, F> StreamObserver<S> for FnObserver<F>
where
    S: RunLoopSource + ?Sized,
    F: FnMut(&mut S, StreamEvent<&S::Error>),
{
    fn on_open(&mut self, stream: &mut S) {
        (self.0)(stream, StreamEvent::OpenCompleted);
    }

    fn on_readable(&mut self, stream: &mut S) {
        (self.0)(stream, StreamEvent::HasBytesAvailable);
    }

    fn on_writable(&mut self, stream: &mut S) {
        (self.0)(stream, StreamEvent::HasSpaceAvailable);
    }

    fn on_end(&mut self, stream: &mut S) {
        (self.0)(stream, StreamEvent::EndEncountered);
    }

    fn on_error(&mut self, stream: &mut S, error: &S::Error) {
        (self.0)(stream, StreamEvent::ErrorOccurred(error));
    }
}

/// Routes `event` to the matching callback of `observer`.
pub fn deliver<S, O>(observer: &mut O, stream: &mut S, event: &StreamEvent<S::Error>)
where
    S: RunLoopSource + ?Sized,
    O: StreamObserver<S> + ?Sized,
{
    match event {
        StreamEvent::OpenCompleted => observer.on_open(stream),
        StreamEvent::HasBytesAvailable => observer.on_readable(stream),
        StreamEvent::HasSpaceAvailable => observer.on_writable(stream),
        StreamEvent::EndEncountered => observer.on_end(stream),
        StreamEvent::ErrorOccurred(error) => observer.on_error(stream, error),
    }
}
